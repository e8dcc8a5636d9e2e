//! Error types for carreg
//!
//! Provides a unified error type for all operations, grouped the way the
//! server treats them: protocol errors end a connection, domain errors become
//! `(false, message)` responses, resource errors end the process.

use thiserror::Error;

/// Result type alias using RegistryError
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Unified error type for carreg operations
#[derive(Debug, Error)]
pub enum RegistryError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Incompatible protocol version {peer} (supported up to {supported})")]
    IncompatibleVersion { peer: u8, supported: u8 },

    #[error("Truncated message: expected {expected} bytes, got {received}")]
    TruncatedMessage { expected: usize, received: usize },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("This licence is not registered")]
    NotFound,

    #[error("Cannot register duplicate licence")]
    DuplicateLicence,

    #[error("Cannot register car with invalid seats")]
    InvalidSeats(i64),

    #[error("Cannot set a negative mileage")]
    NegativeValue,

    #[error("Cannot wind the odometer back")]
    OdometerRollback,

    #[error("Cannot set an empty owner")]
    EmptyOwner,

    #[error("Cannot set an empty licence")]
    EmptyLicence,

    #[error("No have cars in base")]
    EmptyRegistry,

    // -------------------------------------------------------------------------
    // Resource Errors
    // -------------------------------------------------------------------------
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Client Errors
    // -------------------------------------------------------------------------
    /// A failed response as seen by the client
    #[error("{0}")]
    Rejected(String),
}

impl RegistryError {
    /// Errors a handler recovers from and reports as a failed response
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            RegistryError::NotFound
                | RegistryError::DuplicateLicence
                | RegistryError::InvalidSeats(_)
                | RegistryError::NegativeValue
                | RegistryError::OdometerRollback
                | RegistryError::EmptyOwner
                | RegistryError::EmptyLicence
                | RegistryError::EmptyRegistry
        )
    }

    /// Errors fatal to the current connection only
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            RegistryError::IncompatibleVersion { .. }
                | RegistryError::TruncatedMessage { .. }
                | RegistryError::MalformedPayload(_)
                | RegistryError::PayloadTooLarge { .. }
                | RegistryError::Protocol(_)
        )
    }
}
