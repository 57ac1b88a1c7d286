//! TCP Client
//!
//! Sends one request line per connection and waits a bounded time for the
//! reply line.
//!
//! ## Per-request lifecycle
//! ```text
//! connect ──► set read deadline ──► write line + flush ──► read line
//!                                                            │
//!                        ┌───────────────────────────────────┼──────────────┐
//!                        ▼                                   ▼              ▼
//!                  Reply::Line                       Reply::TimedOut   Err(Connection)
//! ```
//! The stream is owned by the call and dropped on every path.

use std::fmt;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{GateError, Result};
use crate::protocol::{decode_response, encode_command, read_line, write_line, Command, Response};

/// Fixed read deadline, counted from the moment the connection is up
pub const READ_TIMEOUT: Duration = Duration::from_millis(5000);

/// Outcome of a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The server answered with this line
    Line(String),

    /// No reply line arrived before the read deadline
    TimedOut,
}

/// Client for a GateKV server
#[derive(Debug, Clone)]
pub struct TcpClient {
    host: String,
    port: u16,
}

impl TcpClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Client for the remote endpoint named in `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.remote_host.clone(), config.remote_port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Send one request line and wait for one reply line
    ///
    /// Opens a fresh connection for this request only. A missed deadline is
    /// reported as [`Reply::TimedOut`]; failing to connect, or the peer
    /// closing without a reply, is a [`GateError::Connection`].
    pub fn send_request(&self, request: &str) -> Result<Reply> {
        let stream = self.connect()?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;

        let started = Instant::now();
        let mut writer = BufWriter::new(stream.try_clone()?);
        let mut reader = BufReader::new(stream);

        write_line(&mut writer, request).map_err(|e| self.connection_error(e))?;
        tracing::trace!("Sent request to {}: {:?}", self, request);

        match read_line(&mut reader) {
            Ok(line) => {
                tracing::debug!("Reply from {} after {:?}: {:?}", self, started.elapsed(), line);
                Ok(Reply::Line(line))
            }
            Err(GateError::Io(ref e)) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                tracing::warn!(
                    "Timeout: {} did not reply within {:?}",
                    self,
                    READ_TIMEOUT
                );
                Ok(Reply::TimedOut)
            }
            Err(e) => Err(self.connection_error(e)),
        }
    }

    /// Send a command and decode the reply
    ///
    /// A timeout becomes [`GateError::Timeout`]; an `ERROR` reply is returned
    /// as [`Response::Error`] for the caller to inspect.
    pub fn execute(&self, command: &Command) -> Result<Response> {
        let request = encode_command(command)?;
        match self.send_request(&request)? {
            Reply::Line(line) => decode_response(&line),
            Reply::TimedOut => Err(GateError::Timeout(READ_TIMEOUT)),
        }
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        match self.execute(&Command::put(key, value))? {
            Response::Ok => Ok(()),
            other => Err(unexpected("PUT", other)),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match self.execute(&Command::get(key))? {
            Response::Value(value) => Ok(Some(value)),
            Response::NotFound => Ok(None),
            other => Err(unexpected("GET", other)),
        }
    }

    /// Returns true when the server removed the key
    pub fn delete(&self, key: &str) -> Result<bool> {
        match self.execute(&Command::delete(key))? {
            Response::Ok => Ok(true),
            Response::NotFound => Ok(false),
            other => Err(unexpected("DELETE", other)),
        }
    }

    pub fn ping(&self) -> Result<()> {
        match self.execute(&Command::Ping)? {
            Response::Pong => Ok(()),
            other => Err(unexpected("PING", other)),
        }
    }

    fn connect(&self) -> Result<TcpStream> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| GateError::Connection {
                addr: self.to_string(),
                source,
            })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect(addr) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(GateError::Connection {
            addr: self.to_string(),
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(ErrorKind::NotFound, "host resolved to no addresses")
            }),
        })
    }

    fn connection_error(&self, err: GateError) -> GateError {
        match err {
            GateError::Io(source) => GateError::Connection {
                addr: self.to_string(),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for TcpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn unexpected(verb: &str, response: Response) -> GateError {
    match response {
        Response::Error(message) => GateError::Remote(message),
        other => GateError::Protocol(format!("unexpected reply to {}: {:?}", verb, other)),
    }
}
