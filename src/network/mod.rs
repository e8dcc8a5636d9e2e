//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor loop on the caller's thread
//! - One worker thread per connection
//! - Requests routed through the Dispatcher into the Registry

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::{Connection, ConnectionOutcome};
