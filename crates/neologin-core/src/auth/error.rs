use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

/// Errors raised by the on-disk credential store and session cache.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed credential file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Corrupt session cache {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Errors returned by an [`AuthProvider`](super::AuthProvider).
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    AuthFailure(#[from] ApiError),

    #[error("No project visible to user {user_id}")]
    NoProjectFound { user_id: String },
}
