//! Configuration for GateKV
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Main configuration for a GateKV server or client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Server Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections; extra ones are turned away
    pub max_connections: usize,

    /// Idle read timeout for a server-side connection (milliseconds, 0 = none)
    pub idle_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Client Configuration
    // -------------------------------------------------------------------------
    /// Host the client connects to
    pub remote_host: String,

    /// Port the client connects to
    pub remote_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7878".to_string(),
            max_connections: 1024,
            idle_timeout_ms: 30_000,
            write_timeout_ms: 5000,
            remote_host: "127.0.0.1".to_string(),
            remote_port: 7878,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Idle timeout as a `Duration`, `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }

    /// Write timeout as a `Duration`, `None` when disabled
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the server idle read timeout (in milliseconds)
    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.idle_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the remote host for clients
    pub fn remote_host(mut self, host: impl Into<String>) -> Self {
        self.config.remote_host = host.into();
        self
    }

    /// Set the remote port for clients
    pub fn remote_port(mut self, port: u16) -> Self {
        self.config.remote_port = port;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
