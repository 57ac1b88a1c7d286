//! Response definitions
//!
//! Represents responses to clients.

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// PUT accepted, or DELETE removed the key
    Ok,

    /// GET found a value
    Value(String),

    /// GET found nothing, or DELETE was aborted
    NotFound,

    /// Reply to PING
    Pong,

    /// Request could not be decoded or the remote call failed
    Error(String),
}

impl Response {
    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(message.into())
    }
}
