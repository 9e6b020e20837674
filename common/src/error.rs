//! Error types for currency values.

use thiserror::Error;

/// Errors raised while constructing currency values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The code is not three ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCode(String),
}

/// Result type alias for currency operations.
pub type Result<T> = std::result::Result<T, CurrencyError>;
