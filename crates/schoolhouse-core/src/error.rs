use thiserror::Error;

/// Top-level error type for Schoolhouse.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for SchoolhouseError` so that `?` works across
/// crate boundaries in the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchoolhouseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Update error: {0}")]
    Update(String),

    #[error("Shell error: {0}")]
    Shell(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for SchoolhouseError {
    fn from(err: toml::de::Error) -> Self {
        SchoolhouseError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SchoolhouseError {
    fn from(err: toml::ser::Error) -> Self {
        SchoolhouseError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Schoolhouse operations.
pub type Result<T> = std::result::Result<T, SchoolhouseError>;
