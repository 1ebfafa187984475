use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or answered with an error.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend refused the write (cell size limit, quota, rate limit).
    #[error("storage rejected write to `{sheet}`: {reason}")]
    Rejected { sheet: String, reason: String },
    /// The addressed sheet does not exist.
    #[error("sheet `{sheet}` not found")]
    SheetNotFound { sheet: String },
    /// A row index outside of the sheet was addressed.
    #[error("row {index} out of range for sheet `{sheet}` ({len} rows)")]
    RowOutOfRange {
        sheet: String,
        index: usize,
        len: usize,
    },
    /// Remote content does not have the expected layout.
    #[error("malformed sheet `{sheet}`: {message}")]
    MalformedSchema { sheet: String, message: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a schema error for `sheet`.
    pub fn malformed(sheet: &str, message: impl Into<String>) -> Self {
        StorageError::MalformedSchema {
            sheet: sheet.to_string(),
            message: message.into(),
        }
    }
}
