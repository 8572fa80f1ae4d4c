//! Error taxonomy for request handling and the sync loop.
//!
//! A path that resolves to nothing is not an error: it is the
//! [`PageResult::NotFound`](crate::models::PageResult::NotFound) outcome.

use std::io;
use thiserror::Error;

/// Errors produced while resolving, listing, rendering, or searching.
#[derive(Debug, Error)]
pub enum PageError {
    /// Reading a file or directory failed, possibly because a pull
    /// removed it mid-request.
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// Walking the content tree failed.
    #[error("walk: {0}")]
    Walk(#[from] walkdir::Error),

    /// Caller-supplied search pattern does not compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl PageError {
    /// True for failures attributable to the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PageError::Pattern(_))
    }
}

pub type Result<T> = std::result::Result<T, PageError>;

/// Errors from cloning or updating the content store.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("git clone failed: {0}")]
    Clone(String),

    #[error("git pull failed: {0}")]
    Pull(String),

    /// The git executable could not be started.
    #[error("failed to execute git: {0}")]
    Spawn(#[from] io::Error),

    #[error("sync task failed: {0}")]
    Join(String),
}
