//! Service boundary
//!
//! The remote-call endpoint exposed by a GateKV server, and the router that
//! maps decoded commands onto it.

use crate::error::Result;
use crate::protocol::{Command, Response};

/// Remote-call endpoint for the key-value store
///
/// Arguments are optional because the transport may deliver calls with
/// missing arguments; implementations absorb those as malformed input.
/// `Err` is reserved for faults of the remote-call layer itself.
pub trait KeyValueService: Send + Sync {
    fn put(&self, key: Option<&str>, value: Option<&str>) -> Result<()>;

    fn get(&self, key: Option<&str>) -> Result<Option<String>>;

    /// Returns true when the key was removed
    fn delete(&self, key: Option<&str>) -> Result<bool>;
}

/// Route a command to the service and build the reply
///
/// PING is answered here without touching the service.
pub fn dispatch<S: KeyValueService + ?Sized>(service: &S, command: Command) -> Response {
    let outcome = match command {
        Command::Put { key, value } => service
            .put(key.as_deref(), value.as_deref())
            .map(|()| Response::Ok),
        Command::Get { key } => service.get(key.as_deref()).map(|value| match value {
            Some(value) => Response::Value(value),
            None => Response::NotFound,
        }),
        Command::Delete { key } => service.delete(key.as_deref()).map(|removed| {
            if removed {
                Response::Ok
            } else {
                Response::NotFound
            }
        }),
        Command::Ping => Ok(Response::Pong),
    };

    outcome.unwrap_or_else(|e| {
        tracing::warn!("Remote call failed: {}", e);
        Response::error(e.to_string())
    })
}
