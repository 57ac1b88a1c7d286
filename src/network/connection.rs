//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ShutdownHandle;
use crate::error::{GateError, Result};
use crate::protocol::{decode_command, read_line_bytes, write_response, Response};
use crate::service::{dispatch, KeyValueService};

/// How often a blocked read wakes up to check for shutdown and idleness
const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Service the requests are delivered to
    service: Arc<dyn KeyValueService>,

    /// Set when the server is stopping
    shutdown: ShutdownHandle,

    /// Bytes of a request line that has not been terminated yet
    pending: Vec<u8>,

    /// Close the connection after this long without a request
    idle_timeout: Option<Duration>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(
        stream: TcpStream,
        service: Arc<dyn KeyValueService>,
        shutdown: ShutdownHandle,
    ) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Replies are single short lines
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(READ_POLL_INTERVAL))?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            service,
            shutdown,
            pending: Vec::new(),
            idle_timeout: None,
            peer_addr,
        })
    }

    /// Configure the idle and write timeouts (`None` disables either)
    pub fn set_timeouts(&mut self, idle: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.idle_timeout = idle;
        self.writer.get_ref().set_write_timeout(write)?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads request lines in a loop and sends one reply per line.
    /// Returns when the client disconnects, goes idle past the idle timeout,
    /// the server shuts down, or a line is too long to frame.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let mut last_request = Instant::now();

        loop {
            if self.shutdown.is_shutdown() {
                tracing::debug!("Closing connection {} for shutdown", self.peer_addr);
                return Ok(());
            }

            let line = match read_line_bytes(&mut self.reader, &mut self.pending) {
                Ok(line) => line,
                Err(GateError::Io(e)) => match e.kind() {
                    ErrorKind::UnexpectedEof => {
                        tracing::debug!("Client {} disconnected", self.peer_addr);
                        return Ok(());
                    }
                    ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
                        tracing::debug!("Connection reset by client {}", self.peer_addr);
                        return Ok(());
                    }
                    // Windows reports TimedOut where Unix reports WouldBlock
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
                        if let Some(idle) = self.idle_timeout {
                            if last_request.elapsed() >= idle {
                                tracing::debug!("Idle timeout for client {}", self.peer_addr);
                                return Ok(());
                            }
                        }
                        continue;
                    }
                    _ => {
                        tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                        return Err(GateError::Io(e));
                    }
                },
                Err(e) => {
                    // The rest of an oversized line is still in the stream
                    tracing::warn!("Unreadable line from {}: {}", self.peer_addr, e);
                    let _ = self.send_response(&Response::error(e.to_string()));
                    return Err(e);
                }
            };

            last_request = Instant::now();

            let response = match String::from_utf8(line) {
                Ok(line) => {
                    tracing::trace!("Received line from {}: {:?}", self.peer_addr, line);
                    match decode_command(&line) {
                        Ok(command) => dispatch(self.service.as_ref(), command),
                        Err(e) => {
                            tracing::debug!("Rejected request from {}: {}", self.peer_addr, e);
                            Response::error(e.to_string())
                        }
                    }
                }
                Err(_) => {
                    tracing::debug!("Non UTF-8 request from {}", self.peer_addr);
                    Response::error("line is not valid UTF-8")
                }
            };

            if let Err(e) = self.send_response(&response) {
                // Client went away before reading its reply
                if let GateError::Io(ref io_err) = e {
                    if matches!(
                        io_err.kind(),
                        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
                    ) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.writer, response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
