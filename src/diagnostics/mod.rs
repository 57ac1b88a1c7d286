//! Diagnostics Module
//!
//! Every engine operation produces exactly one [`Event`], handed to an
//! injectable [`DiagnosticsSink`].
//!
//! ## Sinks
//! - [`TracingSink`]: forwards events to `tracing` (default)
//! - [`MemorySink`]: keeps events in memory, for tests and tooling

mod event;
mod sink;

pub use event::{Event, Severity};
pub use sink::{DiagnosticsSink, MemorySink, TracingSink};
