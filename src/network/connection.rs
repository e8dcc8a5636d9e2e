//! Connection Handler
//!
//! Handles individual client connections.
//!
//! ## States
//! ```text
//! AwaitHeader ──► AwaitPayload ──► Dispatch ──► RespondOrClose ──► Closed
//!      ▲                                              │
//!      └──────────────── next request ◄───────────────┘
//! ```
//! Clients send one request per connection, so in practice the loop ends
//! when the peer closes after reading its response. Once the server is
//! shutting down the loop ends before waiting for another request, and a
//! request read after that point is not dispatched.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use super::server::ShutdownHandle;
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::{RegistryError, Result};
use crate::protocol::{decode_request, read_header, read_payload, write_response, Response};
use crate::registry::Registry;

/// How a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// The peer went away or the exchange is over
    Closed,

    /// The peer asked the server to shut down
    Shutdown,
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    registry: Arc<Registry>,

    dispatcher: Arc<Dispatcher>,

    shutdown: ShutdownHandle,

    /// Largest payload a peer may announce
    max_payload_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(
        stream: TcpStream,
        registry: Arc<Registry>,
        dispatcher: Arc<Dispatcher>,
        shutdown: ShutdownHandle,
        max_payload_size: usize,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            registry,
            dispatcher,
            shutdown,
            max_payload_size,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves a direction unbounded)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Protocol violations end this connection with an error; they never
    /// reach the server loop as anything but a log line.
    pub fn handle(&mut self) -> Result<ConnectionOutcome> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            if self.shutdown.is_shutdown() {
                tracing::debug!("Closing {}: server shutting down", self.peer_addr);
                return Ok(ConnectionOutcome::Closed);
            }

            // AwaitHeader
            let header = match read_header(&mut self.reader) {
                Ok(Some(header)) => header,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(ConnectionOutcome::Closed);
                }
                Err(e) if is_disconnect(&e) => {
                    tracing::debug!("Client {} went away: {}", self.peer_addr, e);
                    return Ok(ConnectionOutcome::Closed);
                }
                Err(e) => {
                    tracing::warn!("Bad header from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            if let Err(e) = header.check_version() {
                // The payload is left unread.
                tracing::warn!("Rejecting {}: {}", self.peer_addr, e);
                self.send_best_effort(Response::failure(e.to_string()));
                return Err(e);
            }

            // AwaitPayload
            let payload = match read_payload(&mut self.reader, &header, self.max_payload_size) {
                Ok(payload) => payload,
                Err(e @ RegistryError::PayloadTooLarge { .. }) => {
                    tracing::warn!("Rejecting {}: {}", self.peer_addr, e);
                    self.send_best_effort(Response::failure(e.to_string()));
                    return Err(e);
                }
                Err(e) if is_disconnect(&e) => {
                    tracing::debug!("Client {} went away mid-payload: {}", self.peer_addr, e);
                    return Ok(ConnectionOutcome::Closed);
                }
                Err(e) => {
                    tracing::warn!("Bad payload from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            if self.shutdown.is_shutdown() {
                tracing::debug!("Dropping request from {}: server shutting down", self.peer_addr);
                return Ok(ConnectionOutcome::Closed);
            }

            // Dispatch
            let request = match decode_request(&payload) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!("Malformed request from {}: {}", self.peer_addr, e);
                    self.send_response(Response::failure(e.to_string()))?;
                    continue;
                }
            };

            tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);

            // RespondOrClose
            let response = match self.dispatcher.dispatch(&self.registry, &request) {
                Outcome::Shutdown => return Ok(ConnectionOutcome::Shutdown),
                Outcome::Reply(response) => response,
            };

            if let Err(e) = self.send_response(response) {
                if is_disconnect(&e) {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(ConnectionOutcome::Closed);
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Send a response on a connection that is about to close anyway
    fn send_best_effort(&mut self, response: Response) {
        if let Err(e) = self.send_response(response) {
            tracing::debug!("Could not notify {}: {}", self.peer_addr, e);
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Errors that mean the peer is gone (or silent past the timeout)
fn is_disconnect(e: &RegistryError) -> bool {
    match e {
        RegistryError::Io(io) => matches!(
            io.kind(),
            ErrorKind::UnexpectedEof
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::WouldBlock
                | ErrorKind::TimedOut
        ),
        _ => false,
    }
}
