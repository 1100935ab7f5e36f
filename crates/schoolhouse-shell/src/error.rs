use schoolhouse_core::error::SchoolhouseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Unknown page requested: {0}")]
    UnknownPageRequested(String),

    #[error("Render surface error: {0}")]
    Surface(String),

    #[error("Window error: {0}")]
    Window(String),
}

impl From<ShellError> for SchoolhouseError {
    fn from(err: ShellError) -> Self {
        SchoolhouseError::Shell(err.to_string())
    }
}
