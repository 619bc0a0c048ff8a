use thiserror::Error;

/// Core error types for RecordStore utilities
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Time component out of range: {0}")]
    OutOfRange(#[from] time::error::ComponentRange),
}

impl CoreError {
    /// Create a new InvalidTimestamp error
    pub fn invalid_timestamp(message: impl Into<String>) -> Self {
        Self::InvalidTimestamp(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
