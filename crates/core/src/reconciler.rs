//! Comment reconciliation: bring the GitLab notes in line with the GitHub
//! comments.
//!
//! Every mirrored note ends with a cross-post marker line
//! (`github-comment-id:<id>`). Notes are indexed by that marker; for each
//! GitHub comment the reconciler then creates a note, updates the existing
//! one in place, or leaves it alone. Nothing is ever deleted, and notes
//! without a marker are never touched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::errors::SyncError;
use crate::markers::{bodies_match, canonical_comment_body, find_cross_post_marker};
use crate::models::{DestinationComment, SourceComment};
use crate::paginate::{fetch_all, COMMENTS_PAGE_SIZE};
use crate::tracker::DestinationTracker;

/// A GitLab note already mirroring a GitHub comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredNote {
    pub note_id: u64,
    pub body: String,
}

/// Index notes by the GitHub comment id in their cross-post marker.
///
/// If several notes carry the same marker, the first one is kept.
pub fn build_correspondence(notes: &[DestinationComment]) -> HashMap<u64, MirroredNote> {
    let mut mirrored: HashMap<u64, MirroredNote> = HashMap::new();
    for note in notes {
        let Some(comment_id) = find_cross_post_marker(&note.body) else {
            continue;
        };
        match mirrored.get(&comment_id) {
            Some(kept) => warn!(
                comment_id,
                kept_note = kept.note_id,
                ignored_note = note.id,
                "duplicate cross-post marker on GitLab issue"
            ),
            None => {
                mirrored.insert(
                    comment_id,
                    MirroredNote {
                        note_id: note.id,
                        body: note.body.clone(),
                    },
                );
            }
        }
    }
    mirrored
}

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Comments excluded from mirroring (the linkage announcement).
    pub skipped: usize,
}

impl ReconcileStats {
    /// Number of mutating GitLab calls issued.
    pub fn mutations(&self) -> usize {
        self.created + self.updated
    }
}

/// Mirrors GitHub comments onto one GitLab issue.
pub struct CommentReconciler<'a, D> {
    destination: &'a D,
}

impl<'a, D: DestinationTracker> CommentReconciler<'a, D> {
    pub fn new(destination: &'a D) -> Self {
        Self { destination }
    }

    /// Create or update one note per GitHub comment, in comment order.
    ///
    /// `exclude` names the comment that announced the link; it is skipped.
    /// The first failed mutation aborts the pass.
    #[instrument(skip(self, comments), fields(comments = comments.len()))]
    pub async fn reconcile(
        &self,
        destination_iid: u64,
        comments: &[SourceComment],
        exclude: Option<u64>,
    ) -> Result<ReconcileStats, SyncError> {
        let notes = fetch_all(COMMENTS_PAGE_SIZE, |page, per_page| {
            self.destination
                .list_notes_page(destination_iid, page, per_page)
        })
        .await?;
        let mirrored = build_correspondence(&notes);

        let mut known: Vec<u64> = mirrored.keys().copied().collect();
        known.sort_unstable();
        info!(
            destination_iid,
            notes = notes.len(),
            mirrored = ?known,
            "comment ids already mirrored"
        );

        let mut stats = ReconcileStats::default();
        for comment in comments {
            if Some(comment.id) == exclude {
                info!(comment_id = comment.id, "skipping linkage announcement comment");
                stats.skipped += 1;
                continue;
            }

            let body = canonical_comment_body(comment);
            match mirrored.get(&comment.id) {
                None => {
                    info!(comment_id = comment.id, "posting comment");
                    self.destination
                        .create_note(destination_iid, &body)
                        .await
                        .map_err(|source| SyncError::CommentCreateFailed {
                            comment_id: comment.id,
                            source,
                        })?;
                    stats.created += 1;
                }
                Some(note) if bodies_match(&note.body, &body) => {
                    debug!(comment_id = comment.id, note_id = note.note_id, "comment is up to date");
                    stats.unchanged += 1;
                }
                Some(note) => {
                    info!(
                        comment_id = comment.id,
                        note_id = note.note_id,
                        "GitHub comment changed, updating GitLab note"
                    );
                    self.destination
                        .update_note(destination_iid, note.note_id, &body)
                        .await
                        .map_err(|source| SyncError::CommentUpdateFailed {
                            comment_id: comment.id,
                            note_id: note.note_id,
                            source,
                        })?;
                    stats.updated += 1;
                }
            }
        }

        info!(
            destination_iid,
            created = stats.created,
            updated = stats.updated,
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            "comments reconciled"
        );
        Ok(stats)
    }
}
