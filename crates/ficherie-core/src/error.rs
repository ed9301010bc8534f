//! Error types for the ingestion pipeline.
//!
//! All pipeline faults are unified under [`AppError`]. Record-scoped faults
//! (duplicate hash, malformed descriptor, failed commit) abort a single
//! record folder; everything else aborts the whole upload.

use std::io;

use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Whether this fault is scoped to a single record folder.
    ///
    /// Record-level faults are logged and the per-record loop moves on to
    /// sibling folders; anything else aborts the upload's processing.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::Duplicate(_)
                | AppError::Validation(_)
                | AppError::Transaction(_)
        )
    }

    /// Get the error type name for log context.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NotFound",
            AppError::Duplicate(_) => "Duplicate",
            AppError::Validation(_) => "Validation",
            AppError::Extraction(_) => "Extraction",
            AppError::Io(_) => "Io",
            AppError::Transaction(_) => "Transaction",
            AppError::Database(_) => "Database",
            AppError::Queue(_) => "Queue",
            AppError::Config(_) => "Config",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("UUID parsing error: {}", err))
    }
}
