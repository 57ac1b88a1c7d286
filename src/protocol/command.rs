//! Command definitions
//!
//! Represents requests from clients. Arguments missing on the wire are
//! carried as `None` so the engine can record them as malformed.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Get,
    Put,
    Delete,
    Ping,
}

impl CommandType {
    /// Canonical verb written on the wire
    pub fn verb(&self) -> &'static str {
        match self {
            CommandType::Get => "GET",
            CommandType::Put => "PUT",
            CommandType::Delete => "DELETE",
            CommandType::Ping => "PING",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: Option<String> },

    /// Put a key-value pair
    Put {
        key: Option<String>,
        value: Option<String>,
    },

    /// Delete a key
    Delete { key: Option<String> },

    /// Ping (health check)
    Ping,
}

impl Command {
    pub fn get(key: impl Into<String>) -> Self {
        Command::Get {
            key: Some(key.into()),
        }
    }

    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Command::Put {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Command::Delete {
            key: Some(key.into()),
        }
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Put { .. } => CommandType::Put,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
        }
    }
}
