//! FX engine error types.

use std::fmt;

use ratekit_common::{Currency, CurrencyError};
use thiserror::Error;

/// One failed attempt against a configured endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointError {
    /// The endpoint template that was tried.
    pub endpoint: String,
    /// What went wrong.
    pub message: String,
}

impl EndpointError {
    pub fn new(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.message)
    }
}

/// Errors that can occur in the FX engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// Every configured endpoint failed.
    #[error("Could not fetch live rates from any endpoint: [{}]", join_errors(.errors))]
    Connectivity { errors: Vec<EndpointError> },

    /// The code is absent from the current rate table.
    #[error("Currency '{0}' not found")]
    CurrencyNotFound(Currency),

    /// Payload shape was not recognized.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Request could not be completed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status.
    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    /// Offline mode is on and nothing is cached for the base.
    #[error("Offline mode enabled and no cached rates for {base}")]
    Offline { base: Currency },

    /// A currency code failed validation.
    #[error(transparent)]
    InvalidCurrency(#[from] CurrencyError),

    /// An amount or rate fell outside the representable decimal range.
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FxError {
    /// Per-endpoint diagnostics, when this is a connectivity failure.
    pub fn endpoint_errors(&self) -> &[EndpointError] {
        match self {
            FxError::Connectivity { errors } => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[EndpointError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
