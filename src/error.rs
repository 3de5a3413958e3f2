use thiserror::Error;

/// Errors raised by the asset dashboard core and its snapshot store.
#[derive(Debug, Error)]
pub enum FinanceError {
    /// Negative or unparsable numeric input. Normally recovered by clamping.
    #[error("Validation error: {0}")]
    Validation(String),
    /// No snapshot (or no snapshot with the requested id) exists.
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FinanceError {
    /// True for failures that come from the storage layer rather than from input.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            FinanceError::Persistence(_)
                | FinanceError::Database(_)
                | FinanceError::Serialization(_)
                | FinanceError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FinanceError>;
