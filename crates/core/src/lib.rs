//! IssueMirror core library.
//!
//! This crate mirrors GitHub issues and their comments into a GitLab project:
//! configuration, tracker clients, the marker conventions that link the two
//! trackers, the identity resolver, the comment reconciler, and the sync
//! engine that runs them.

pub mod config;
pub mod errors;
pub mod github;
pub mod gitlab;
pub mod markers;
pub mod models;
pub mod paginate;
pub mod reconciler;
pub mod resolver;
pub mod sync_engine;
pub mod tracker;

// Re-exports for convenience.
pub use config::MirrorConfig;
pub use github::GitHubClient;
pub use gitlab::GitLabClient;
pub use sync_engine::{HttpIssueMirror, IssueMirror};
pub use tracker::{DestinationTracker, SourceTracker};
