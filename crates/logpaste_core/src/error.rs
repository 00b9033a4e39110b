//! Application error types for core storage and domain logic.
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Storage error: {0}")]
    StorageMessage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rate limit exceeded. Try again in {retry_after_secs}s.")]
    RateLimited { retry_after_secs: u64 },

    #[error("Could not allocate a free paste id after {attempts} attempts")]
    IdSpaceExhausted { attempts: usize },
}

impl AppError {
    /// Size rejection phrased against the configured byte ceiling.
    pub fn paste_too_large(max_content_bytes: usize) -> Self {
        Self::PayloadTooLarge(format!(
            "Paste too large. Limit {}KB.",
            max_content_bytes / 1024
        ))
    }

    /// Whether the error originates from the backend (call failure or malformed data).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::StorageMessage(_) | Self::Serialization(_)
        )
    }
}

impl From<redb::DatabaseError> for AppError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for AppError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for AppError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for AppError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for AppError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}
