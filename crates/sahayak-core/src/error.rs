use thiserror::Error;

/// Top-level error type for the Sahayak service.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for SahayakError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SahayakError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SahayakError {
    fn from(err: toml::de::Error) -> Self {
        SahayakError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SahayakError {
    fn from(err: toml::ser::Error) -> Self {
        SahayakError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SahayakError {
    fn from(err: serde_json::Error) -> Self {
        SahayakError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sahayak operations.
pub type Result<T> = std::result::Result<T, SahayakError>;
