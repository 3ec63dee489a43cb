//! Page-number pagination shared by both trackers.
//!
//! GitHub and GitLab both page their list endpoints with `page` (1-based) and
//! `per_page` query parameters. A page shorter than `per_page` is the last
//! one, so a list whose length is an exact multiple of the page size costs one
//! extra request that comes back empty.

use std::future::Future;

use tracing::debug;

/// Page size used for comment and note listings.
pub const COMMENTS_PAGE_SIZE: u32 = 100;

/// Page size used for the open-issue listing.
pub const ISSUES_PAGE_SIZE: u32 = 50;

/// Fetch every item of a paginated listing.
///
/// `fetch_page(page, per_page)` is awaited once per page, in order, and the
/// pages are concatenated. The first error aborts the whole fetch.
pub async fn fetch_all<T, E, F, Fut>(per_page: u32, mut fetch_page: F) -> Result<Vec<T>, E>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let per_page = per_page.max(1);
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let batch = fetch_page(page, per_page).await?;
        let len = batch.len();
        items.extend(batch);
        debug!(page, per_page, len, total = items.len(), "fetched page");

        if len < per_page as usize {
            break;
        }
        page += 1;
    }

    Ok(items)
}
