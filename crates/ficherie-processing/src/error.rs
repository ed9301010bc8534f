use ficherie_core::AppError;
use thiserror::Error;

/// Faults raised by the filesystem/archive layer.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// A record folder is structurally incomplete (missing descriptor,
    /// primary document, or attachments). Skippable, not fatal.
    #[error("Incomplete record folder: {0}")]
    Incomplete(String),
}

/// Result type for processing operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Io(e) => AppError::Io(e),
            ProcessingError::Extraction(msg) => AppError::Extraction(msg),
            ProcessingError::Incomplete(msg) => AppError::Validation(msg),
        }
    }
}
