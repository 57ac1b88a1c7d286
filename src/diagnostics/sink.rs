//! Diagnostics sinks

use parking_lot::Mutex;

use super::{Event, Severity};

/// Receives engine events
///
/// Implementations must be cheap: `record` is called on the request path,
/// after the engine lock has been released.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: &Event);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, event: &Event) {
        match event.severity() {
            Severity::Info => tracing::info!(op = event.operation(), "{}", event),
            Severity::Warn => tracing::warn!(op = event.operation(), "{}", event),
        }
    }
}

/// Keeps every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded events
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Most recent event
    pub fn last(&self) -> Option<Event> {
        self.events.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}
