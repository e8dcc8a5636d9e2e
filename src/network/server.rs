//! TCP Server
//!
//! Accepts connections and hands each one to its own worker thread.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use super::connection::{Connection, ConnectionOutcome};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{RegistryError, Result};
use crate::protocol::{write_response, Response};
use crate::registry::Registry;

/// Cloneable trigger that stops the accept loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting connections
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Clones of every live connection, keyed by connection id
type LiveStreams = Arc<Mutex<HashMap<u64, TcpStream>>>;

/// Releases a worker's connection slot and live stream when it ends
struct WorkerGuard {
    id: u64,
    active: Arc<AtomicUsize>,
    live: LiveStreams,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.live.lock().remove(&self.id);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// TCP server for the car registry
///
/// ## Threading
/// - The caller's thread runs the accept loop and owns the listener
/// - Every accepted connection gets its own worker thread
/// - On shutdown every live connection is closed, which unblocks workers
///   waiting for a request
/// - `run` returns only after every in-flight worker has finished, so the
///   registry is quiescent when the caller persists it
pub struct Server {
    config: Config,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    active: Arc<AtomicUsize>,
    live: LiveStreams,
    next_id: AtomicU64,
}

impl Server {
    /// Bind the listener described by `config`
    pub fn bind(config: Config, registry: Arc<Registry>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            RegistryError::Network(format!("cannot bind {}: {}", config.listen_addr, e))
        })?;

        // Non-blocking accept lets the loop notice a shutdown request
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            registry,
            dispatcher: Arc::new(Dispatcher::new()),
            listener,
            shutdown: ShutdownHandle::default(),
            active: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops this server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// The registry this server serves
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Start the server (blocking)
    ///
    /// Returns after a shutdown was requested and all workers finished.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        let workers = WaitGroup::new();
        let poll = Duration::from_millis(self.config.accept_poll_ms.max(1));

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, peer)) => self.spawn_worker(stream, peer, workers.clone()),
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(poll),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    // e.g. out of file descriptors; keep serving
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(poll);
                }
            }
        }

        tracing::info!("Stopped accepting connections, waiting for workers");
        self.close_live_connections();
        workers.wait();
        Ok(())
    }

    /// Shut down every open connection so blocked reads return at once
    fn close_live_connections(&self) {
        let live = self.live.lock();
        if !live.is_empty() {
            tracing::debug!("Closing {} open connection(s)", live.len());
        }
        for stream in live.values() {
            // The peer may already be gone
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn spawn_worker(&self, stream: TcpStream, peer: SocketAddr, workers: WaitGroup) {
        // Accepted sockets may inherit the listener's non-blocking mode
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping {}: {}", peer, e);
            return;
        }

        if self.active.fetch_add(1, Ordering::SeqCst) >= self.config.max_connections {
            self.active.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!("Connection limit reached, rejecting {}", peer);
            let mut stream = stream;
            if let Err(e) = write_response(&mut stream, &Response::failure("Server busy")) {
                tracing::debug!("Could not notify {}: {}", peer, e);
            }
            return;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match stream.try_clone() {
            Ok(clone) => {
                self.live.lock().insert(id, clone);
            }
            Err(e) => {
                self.active.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!("Dropping {}: {}", peer, e);
                return;
            }
        }
        let guard = WorkerGuard {
            id,
            active: Arc::clone(&self.active),
            live: Arc::clone(&self.live),
        };

        let registry = Arc::clone(&self.registry);
        let dispatcher = Arc::clone(&self.dispatcher);
        let shutdown = self.shutdown.clone();
        let config = self.config.clone();

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let _guard = guard;
                let _workers = workers;

                match serve(stream, registry, dispatcher, shutdown.clone(), &config) {
                    Ok(ConnectionOutcome::Shutdown) => {
                        tracing::info!("Shutdown requested by {}", peer);
                        shutdown.shutdown();
                    }
                    Ok(ConnectionOutcome::Closed) => {}
                    Err(e) if e.is_protocol() => {
                        tracing::warn!("Connection {} dropped: {}", peer, e)
                    }
                    Err(e) => tracing::debug!("Connection {} ended: {}", peer, e),
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Cannot spawn worker for {}: {}", peer, e);
        }
    }
}

fn serve(
    stream: TcpStream,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownHandle,
    config: &Config,
) -> Result<ConnectionOutcome> {
    let mut connection =
        Connection::new(stream, registry, dispatcher, shutdown, config.max_payload_size)?;
    connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;
    connection.handle()
}
