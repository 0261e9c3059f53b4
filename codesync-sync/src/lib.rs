//! # codesync-sync
//!
//! Strip and sync passes, remote fetching, atomic writes and the tree
//! pipeline.
//!
//! Call [`process_tree`] to synchronise every document under a directory,
//! [`strip_tree`] to remove generated content, or [`diff_tree`] to preview
//! what a sync would change.

pub mod diff;
pub mod digest;
pub mod error;
pub mod inventory;
pub mod pipeline;
pub mod remote;
pub mod rewriter;
pub mod writer;

pub use diff::{diff_tree, FileDiff, TreeDiff};
pub use digest::digest;
pub use error::{DirectiveFailure, FetchError, SyncError};
pub use inventory::{scan_tree, DirectiveEntry, Inventory};
pub use pipeline::{process_tree, strip_tree, FileReport, Summary, SyncOptions, TreeReport};
pub use remote::{CachingFetcher, GitHubFetcher, MemoryFetcher, SourceFetcher};
pub use rewriter::{strip, strip_report, Diagnostic, Outcome, Rewriter, SyncOutcome};
pub use writer::WriteResult;
