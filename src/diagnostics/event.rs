//! Diagnostic events
//!
//! One variant per engine outcome.

use std::fmt;

/// How loudly an event should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation was applied
    Info,

    /// The operation was rejected or aborted
    Warn,
}

/// An engine outcome worth recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// PUT with a missing/empty key or a missing value
    MalformedPut {
        key: Option<String>,
        has_value: bool,
    },

    /// PUT applied
    Put {
        key: String,
        value: String,
        /// Store contents right after the write
        snapshot: String,
    },

    /// GET with a missing/empty key
    MalformedGet { key: Option<String> },

    /// GET on a key that failed preparation
    GetAborted { key: String },

    /// GET served
    Get { key: String, value: Option<String> },

    /// DELETE with a missing/empty key
    MalformedDelete { key: Option<String> },

    /// DELETE applied
    Delete { key: String },

    /// DELETE on a key that is not prepared
    DeleteAborted { key: String },
}

impl Event {
    pub fn severity(&self) -> Severity {
        match self {
            Event::Put { .. } | Event::Get { .. } | Event::Delete { .. } => Severity::Info,
            _ => Severity::Warn,
        }
    }

    /// Short operation name (PUT/GET/DELETE)
    pub fn operation(&self) -> &'static str {
        match self {
            Event::MalformedPut { .. } | Event::Put { .. } => "PUT",
            Event::MalformedGet { .. } | Event::GetAborted { .. } | Event::Get { .. } => "GET",
            Event::MalformedDelete { .. } | Event::Delete { .. } | Event::DeleteAborted { .. } => {
                "DELETE"
            }
        }
    }

    /// The key the event refers to, if one was supplied
    pub fn key(&self) -> Option<&str> {
        match self {
            Event::MalformedPut { key, .. }
            | Event::MalformedGet { key }
            | Event::MalformedDelete { key } => key.as_deref(),
            Event::Put { key, .. }
            | Event::GetAborted { key }
            | Event::Get { key, .. }
            | Event::Delete { key }
            | Event::DeleteAborted { key } => Some(key.as_str()),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::MalformedPut { key, has_value } => write!(
                f,
                "malformed PUT: key must be present and non-empty, value must be present (key={:?}, value present={})",
                key, has_value
            ),
            Event::Put { key, value, snapshot } => {
                write!(f, "PUT key={} value={} store={}", key, value, snapshot)
            }
            Event::MalformedGet { key } => write!(
                f,
                "malformed GET: key must be present and non-empty (key={:?})",
                key
            ),
            Event::GetAborted { key } => write!(f, "GET aborted key={}: key not prepared", key),
            Event::Get { key, value } => match value {
                Some(value) => write!(f, "GET key={} value={}", key, value),
                None => write!(f, "GET key={} value=<none>", key),
            },
            Event::MalformedDelete { key } => write!(
                f,
                "malformed DELETE: key must be present and non-empty (key={:?})",
                key
            ),
            Event::Delete { key } => write!(f, "DELETE key={}", key),
            Event::DeleteAborted { key } => {
                write!(f, "DELETE aborted key={}: key not prepared", key)
            }
        }
    }
}
