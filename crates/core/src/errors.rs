//! Core error types for the kover price engine.
//!
//! This module defines storage- and transport-agnostic error types. The remote
//! and storage crates convert their specific failures (reqwest, filesystem)
//! into these variants.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the price engine.
///
/// The variants mirror the recovery policy of the service layer: validation
/// errors are rejected before any I/O, network errors degrade to offline
/// mode, storage errors are logged and swallowed, and conflicts are surfaced
/// so the caller can refresh and retry.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Connectivity failure, timeout, or a malformed remote response.
    /// Recovered by falling back to the cached price table.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote price document does not exist yet. Distinct from a network
    /// failure: callers hydrate from bundled defaults instead.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid credentials. The session is left unchanged.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Authenticated but not an admin. No write is attempted.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// The remote version advanced past the base version of this write.
    /// The caller must re-fetch and retry; the write was not applied.
    #[error("Version conflict: remote version advanced past base version {base_version}")]
    Conflict { base_version: i64 },

    /// A table replacement carried a version that is not newer than the
    /// current one. The table is left unchanged.
    #[error("Stale price table version {proposed} (current version is {current})")]
    StaleVersion { current: i64, proposed: i64 },

    /// Local persistence failure. Logged by callers, never fatal to the
    /// in-memory state of the operation that triggered it.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Validation errors for user input, checked before any I/O.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Area must be greater than zero")]
    NonPositiveArea,

    #[error("Area is out of bounds: {0} (allowed range {1} to {2} m2)")]
    AreaOutOfBounds(rust_decimal::Decimal, rust_decimal::Decimal, rust_decimal::Decimal),

    #[error("Price is out of bounds: {0} (allowed range 0 to {1})")]
    PriceOutOfBounds(rust_decimal::Decimal, rust_decimal::Decimal),

    #[error("Unknown thickness '{0}' for coverage type {1}")]
    UnknownThickness(String, String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

impl Error {
    /// Whether this error should degrade the service to offline mode rather
    /// than propagate.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}
