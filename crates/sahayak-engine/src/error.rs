//! Error types for the chat pipeline.

use sahayak_core::error::SahayakError;

/// Errors from the chat pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("user not found: {0}")]
    UserNotFound(i64),
    #[error("generation error: {0}")]
    Generation(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<SahayakError> for PipelineError {
    fn from(err: SahayakError) -> Self {
        match err {
            SahayakError::Generation(msg) => PipelineError::Generation(msg),
            other => PipelineError::Storage(other.to_string()),
        }
    }
}
