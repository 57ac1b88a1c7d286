//! Engine Module
//!
//! The key-value engine: an authoritative key→value map plus the set of
//! prepared keys, guarded together.
//!
//! ## Responsibilities
//! - Validate keys and values at the call boundary
//! - Run the prepare phase before every read or write
//! - Serialize mutations so the map and the prepared set never disagree
//! - Report every outcome to the diagnostics sink

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::diagnostics::{DiagnosticsSink, Event, TracingSink};
use crate::error::Result;
use crate::protocol::{Command, Response};
use crate::service::{self, KeyValueService};

/// State owned by the engine lock
#[derive(Debug, Default)]
struct KeyTable {
    /// Authoritative key → value map
    values: HashMap<String, String>,

    /// Keys that have passed the prepare phase
    prepared: HashSet<String>,
}

impl KeyTable {
    /// Prepare phase: mark `key` eligible for read/delete
    ///
    /// Never fails. Returns true the first time a key is prepared.
    fn prepare(&mut self, key: &str) -> bool {
        self.prepared.insert(key.to_string())
    }

    /// Sorted `{k=v, ...}` rendering of the map
    fn describe(&self) -> String {
        let sorted: BTreeMap<&String, &String> = self.values.iter().collect();
        let mut out = String::from("{");
        for (i, (key, value)) in sorted.into_iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}={}", key, value);
        }
        out.push('}');
        out
    }
}

/// The key-value engine
///
/// ## Concurrency Model
///
/// One `parking_lot::Mutex` owns both the value map and the prepared set,
/// so every operation sees them in a consistent state:
///
/// - **PUT**: prepare + write under the lock
/// - **DELETE**: membership check + remove from both under the lock
/// - **GET**: prepare + membership check + read under the lock
///
/// Diagnostics are recorded after the lock is released; the store snapshot
/// for PUT is rendered while it is still held.
pub struct Engine {
    table: Mutex<KeyTable>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl Engine {
    /// Create an empty engine that logs through `tracing`
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Create an empty engine reporting to the given sink
    pub fn with_sink(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            table: Mutex::new(KeyTable::default()),
            sink,
        }
    }

    /// Execute a command
    ///
    /// Routes commands to the matching operation. Missing arguments take the
    /// malformed-input path of that operation.
    pub fn execute(&self, command: Command) -> Response {
        service::dispatch(self, command)
    }

    /// Store `value` under `key`
    ///
    /// An empty key is recorded as malformed and ignored.
    pub fn put(&self, key: &str, value: &str) {
        self.put_checked(Some(key), Some(value));
    }

    /// Read the value stored under `key`
    ///
    /// Prepares the key as a side effect, even when no value was ever written.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_checked(Some(key))
    }

    /// Remove `key` from the store and the prepared set
    ///
    /// Returns false when the key is empty or was not prepared.
    pub fn delete(&self, key: &str) -> bool {
        self.delete_checked(Some(key))
    }

    pub(crate) fn put_checked(&self, key: Option<&str>, value: Option<&str>) {
        let (key, value) = match (valid_key(key), value) {
            (Some(key), Some(value)) => (key, value),
            (_, value) => {
                self.sink.record(&Event::MalformedPut {
                    key: key.map(str::to_string),
                    has_value: value.is_some(),
                });
                return;
            }
        };

        let snapshot = {
            let mut table = self.table.lock();
            table.prepare(key);
            table.values.insert(key.to_string(), value.to_string());
            table.describe()
        };

        self.sink.record(&Event::Put {
            key: key.to_string(),
            value: value.to_string(),
            snapshot,
        });
    }

    pub(crate) fn get_checked(&self, key: Option<&str>) -> Option<String> {
        let Some(key) = valid_key(key) else {
            self.sink.record(&Event::MalformedGet {
                key: key.map(str::to_string),
            });
            return None;
        };

        let outcome = {
            let mut table = self.table.lock();
            table.prepare(key);
            if table.prepared.contains(key) {
                Some(table.values.get(key).cloned())
            } else {
                None
            }
        };

        match outcome {
            Some(value) => {
                self.sink.record(&Event::Get {
                    key: key.to_string(),
                    value: value.clone(),
                });
                value
            }
            None => {
                self.sink.record(&Event::GetAborted {
                    key: key.to_string(),
                });
                None
            }
        }
    }

    pub(crate) fn delete_checked(&self, key: Option<&str>) -> bool {
        let Some(key) = valid_key(key) else {
            self.sink.record(&Event::MalformedDelete {
                key: key.map(str::to_string),
            });
            return false;
        };

        let removed = {
            let mut table = self.table.lock();
            if table.prepared.remove(key) {
                table.values.remove(key);
                true
            } else {
                false
            }
        };

        let event = if removed {
            Event::Delete {
                key: key.to_string(),
            }
        } else {
            Event::DeleteAborted {
                key: key.to_string(),
            }
        };
        self.sink.record(&event);

        removed
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        self.table.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().values.is_empty()
    }

    /// Number of prepared keys
    pub fn prepared_len(&self) -> usize {
        self.table.lock().prepared.len()
    }

    pub fn is_prepared(&self, key: &str) -> bool {
        self.table.lock().prepared.contains(key)
    }

    /// True when `key` holds a value (does not prepare it)
    pub fn contains_key(&self, key: &str) -> bool {
        self.table.lock().values.contains_key(key)
    }

    /// Sorted copy of the store
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.table
            .lock()
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Consistent view of both structures: (store, prepared keys)
    pub fn state(&self) -> (BTreeMap<String, String>, Vec<String>) {
        let table = self.table.lock();
        let values = table
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut prepared: Vec<String> = table.prepared.iter().cloned().collect();
        prepared.sort();
        (values, prepared)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueService for Engine {
    fn put(&self, key: Option<&str>, value: Option<&str>) -> Result<()> {
        self.put_checked(key, value);
        Ok(())
    }

    fn get(&self, key: Option<&str>) -> Result<Option<String>> {
        Ok(self.get_checked(key))
    }

    fn delete(&self, key: Option<&str>) -> Result<bool> {
        Ok(self.delete_checked(key))
    }
}

fn valid_key(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.is_empty())
}
