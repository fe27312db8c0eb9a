//! Error types for the monetization ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced video or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Coin send rejected: the sender cannot cover the cost
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Gross cost of the coin gift
        required: Decimal,
        /// Sender balance at the time of the check
        available: Decimal,
    },

    /// Non-positive amount, malformed identity, etc.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Entity already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[cfg(feature = "persistent")]
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Terminal errors the caller can correct (never retried)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::InsufficientBalance { .. }
                | Error::InvalidInput(_)
                | Error::Conflict(_)
        )
    }
}

#[cfg(feature = "persistent")]
impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
