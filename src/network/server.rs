//! TCP Server
//!
//! Accepts connections and serves each one on its own thread.

use std::io::{BufReader, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;

use super::Connection;
use crate::config::Config;
use crate::error::{GateError, Result};
use crate::protocol::{read_line, write_response, Response};
use crate::service::KeyValueService;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read/write budget for turning away a connection over the limit
const REJECT_TIMEOUT: Duration = Duration::from_millis(250);

/// TCP server for GateKV
///
/// One acceptor thread (the caller of [`Server::run`]) spawns a handler
/// thread per accepted connection, up to `max_connections` at once. Idle
/// connections therefore never delay other clients.
pub struct Server {
    config: Config,
    service: Arc<dyn KeyValueService>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

/// Cloneable handle that stops a running [`Server`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting and close its connections
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Held by a connection thread for as long as it runs
struct ConnectionSlot {
    active: Arc<AtomicUsize>,
    _wait_group: WaitGroup,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Server {
    /// Bind the listener described by `config`
    ///
    /// Binding to port 0 picks a free port; see [`Server::local_addr`].
    pub fn bind(config: Config, service: Arc<dyn KeyValueService>) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(GateError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let listener = TcpListener::bind(&config.listen_addr)?;

        Ok(Self {
            config,
            service,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Start the server (blocking until shutdown is signalled)
    ///
    /// Open connections notice the shutdown within one read poll; `run`
    /// returns once all of them have closed.
    pub fn run(&self) -> Result<()> {
        self.listener.set_nonblocking(true)?;

        let addr = self.local_addr()?;
        let max_connections = self.config.max_connections;
        tracing::info!("Listening on {} (max {} connections)", addr, max_connections);

        let active = Arc::new(AtomicUsize::new(0));
        let wait_group = WaitGroup::new();
        let mut next_id: u64 = 0;

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::debug!("Accepted connection from {}", peer);
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", peer, e);
                        continue;
                    }

                    // Only this thread increments, so the check cannot overshoot
                    if active.load(Ordering::SeqCst) >= max_connections {
                        tracing::warn!(
                            "Rejecting {}: {} connections already open",
                            peer,
                            max_connections
                        );
                        reject(stream);
                        continue;
                    }

                    active.fetch_add(1, Ordering::SeqCst);
                    let slot = ConnectionSlot {
                        active: Arc::clone(&active),
                        _wait_group: wait_group.clone(),
                    };

                    next_id += 1;
                    if let Err(e) = self.spawn_connection(next_id, stream, slot) {
                        tracing::error!("Failed to spawn handler for {}: {}", peer, e);
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                }
            }
        }

        tracing::info!(
            "Shutting down, waiting for {} connections",
            active.load(Ordering::SeqCst)
        );
        wait_group.wait();

        Ok(())
    }

    fn spawn_connection(&self, id: u64, stream: TcpStream, slot: ConnectionSlot) -> Result<()> {
        let service = Arc::clone(&self.service);
        let shutdown = self.shutdown_handle();
        let idle_timeout = self.config.idle_timeout();
        let write_timeout = self.config.write_timeout();

        thread::Builder::new()
            .name(format!("gatekv-conn-{}", id))
            .spawn(move || {
                let _slot = slot;

                let mut connection = match Connection::new(stream, service, shutdown) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!("Failed to set up connection: {}", e);
                        return;
                    }
                };

                if let Err(e) = connection.set_timeouts(idle_timeout, write_timeout) {
                    tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
                    return;
                }

                if let Err(e) = connection.handle() {
                    tracing::debug!("Connection {} closed with error: {}", connection.peer_addr(), e);
                }
            })?;

        Ok(())
    }
}

/// Answer a connection over the limit with an `ERROR` line and close it
///
/// The request line is drained before closing so the client reads the reply
/// instead of a reset.
fn reject(stream: TcpStream) {
    let _ = stream.set_read_timeout(Some(REJECT_TIMEOUT));
    let _ = stream.set_write_timeout(Some(REJECT_TIMEOUT));

    let mut writer = &stream;
    let busy = Response::error("server busy, too many connections");
    if write_response(&mut writer, &busy).is_ok() {
        let _ = stream.shutdown(Shutdown::Write);
        let _ = read_line(&mut BufReader::new(&stream));
    }
}
