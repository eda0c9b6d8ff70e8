use thiserror::Error;

/// Errors that can occur during key/value operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Store fault: {0}")]
    StoreFault(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl KvError {
    /// Returns true if the error came from the underlying store.
    pub fn is_store_fault(&self) -> bool {
        matches!(self, KvError::StoreFault(_))
    }
}

/// Result type for key/value operations.
pub type Result<T> = std::result::Result<T, KvError>;
