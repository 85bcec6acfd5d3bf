//! Error types for the fieldex index engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend kept reporting items as unprocessed past the retry budget.
    #[error("{remaining} batch item(s) still unprocessed after {attempts} attempt(s)")]
    UnprocessedItems { remaining: usize, attempts: u32 },

    #[error("Operation cancelled before {0}")]
    Cancelled(&'static str),

    #[error("Data corruption: {0}")]
    Corruption(String),
}

impl IndexError {
    /// True for the malformed-cursor class of errors.
    pub fn is_invalid_cursor(&self) -> bool {
        matches!(self, IndexError::InvalidCursor(_))
    }
}

impl From<bincode::Error> for IndexError {
    fn from(err: bincode::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}
