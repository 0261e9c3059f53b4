//! Error types for codesync-sync.

use std::path::PathBuf;

use thiserror::Error;

use codesync_core::error::DirectiveError;
use codesync_core::types::RemotePath;
use codesync_renderer::RenderError;

/// Errors that abort a file (or, for the tree root, the whole run).
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Failure to obtain a remote file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The API answered with a non-success status.
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Connection, TLS or timeout failure.
    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body was not the expected JSON / base64 / UTF-8.
    #[error("cannot decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// No such file (used by in-memory fetchers).
    #[error("remote file {0} not found")]
    NotFound(String),
}

/// Why a single directive could not be synchronised. The directive is left
/// unmodified and processing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveFailure {
    /// Malformed directive or out-of-bounds line range.
    #[error("{0}")]
    Invalid(#[from] DirectiveError),

    /// The referenced remote file could not be fetched.
    #[error("fetching {remote}: {source}")]
    Fetch {
        remote: RemotePath,
        #[source]
        source: FetchError,
    },

    /// The container template failed to render.
    #[error("render error: {0}")]
    Render(String),
}
