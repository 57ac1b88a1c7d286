//! # GateKV
//!
//! A minimal key-value service with:
//! - A prepare-gated engine (every key is prepared before it is read or written)
//! - A single lock owning both the store and the prepared set
//! - An injectable diagnostics sink, one event per operation
//! - A line-based TCP server and a deadline-bounded client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────┐        one line in, one line out
//! │        TcpClient          │ ─────────────────────────────────┐
//! │ (5000 ms read deadline)   │                                  │
//! └───────────────────────────┘                                  ▼
//!                                       ┌─────────────────────────────────┐
//!                                       │          TCP Server             │
//!                                       │ acceptor + thread per connection│
//!                                       └────────────────┬────────────────┘
//!                                                        │ Command
//!                                       ┌────────────────▼────────────────┐
//!                                       │   dispatch → KeyValueService    │
//!                                       └────────────────┬────────────────┘
//!                                                        │
//!                                       ┌────────────────▼────────────────┐
//!                                       │            Engine               │
//!                                       │ Mutex<{ values, prepared }>     │
//!                                       └────────────────┬────────────────┘
//!                                                        │ Event
//!                                                        ▼
//!                                              DiagnosticsSink (tracing)
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod diagnostics;
pub mod protocol;
pub mod service;
pub mod engine;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{GateError, Result};
pub use config::Config;
pub use engine::Engine;
pub use service::KeyValueService;
pub use client::{Reply, TcpClient, READ_TIMEOUT};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of GateKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
