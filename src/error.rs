//! Error types for GateKV
//!
//! Provides a unified error type for all operations.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using GateError
pub type Result<T> = std::result::Result<T, GateError>;

/// Unified error type for GateKV operations
///
/// Malformed keys and aborted deletes are not errors: the engine absorbs
/// them and reports an empty result. Only transport and remote-call faults
/// show up here.
#[derive(Debug, Error)]
pub enum GateError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Connection to {addr} failed: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Remote-call Errors
    // -------------------------------------------------------------------------
    #[error("Remote call failed: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GateError {
    /// True when the error is a read deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, GateError::Timeout(_))
    }

    /// True when the error came from establishing or keeping the connection
    pub fn is_connection(&self) -> bool {
        matches!(self, GateError::Connection { .. })
    }
}
