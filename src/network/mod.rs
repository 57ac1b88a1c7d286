//! Network Module
//!
//! TCP server and connection handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One handler thread per connection, capped by `max_connections`
//! - Requests routed through a `KeyValueService`

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
