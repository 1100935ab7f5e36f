//! Error types for the update engine.

use std::path::PathBuf;

use schoolhouse_core::error::SchoolhouseError;

use crate::state::UpdateState;

/// Errors raised while checking for, applying or activating an update.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Remote artifact unreachable: {0}")]
    NetworkUnavailable(String),
    #[error("Remote content rejected: {0}")]
    RemoteContentInvalid(String),
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("Failed to read local artifact {}: {source}", path.display())]
    LocalReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write local artifact {}: {reason}", path.display())]
    LocalWriteFailed { path: PathBuf, reason: String },
    #[error("Restart failed: {0}")]
    RestartFailed(String),
    #[error("Invalid update state transition: {0} -> {1}")]
    InvalidTransition(UpdateState, UpdateState),
    #[error("Updates not configured: {0}")]
    NotConfigured(String),
}

impl From<UpdateError> for SchoolhouseError {
    fn from(err: UpdateError) -> Self {
        SchoolhouseError::Update(err.to_string())
    }
}
