//! # carreg
//!
//! A small car registration service with:
//! - A length-prefixed, versioned TCP wire protocol
//! - One worker thread per accepted connection
//! - A single mutex-guarded registry (plate → seats, mileage, owner)
//! - Gzip-compressed snapshot persistence at startup and shutdown
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (one worker thread per connection)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  [len u32][version u8][payload]
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                Connection → Dispatcher                       │
//! │          (command name → handler function table)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐          ┌─────────────┐
//!               │   Registry   │◄────────►│ Persistence │
//!               │   (Mutex)    │  load /  │   (gzip)    │
//!               └──────────────┘   save   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod registry;
pub mod dispatch;
pub mod network;
pub mod persistence;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RegistryError, Result};
pub use config::Config;
pub use registry::{CarRecord, Registry};
pub use dispatch::{Dispatcher, Outcome};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of carreg
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
