//! Configuration for carreg
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{RegistryError, Result};

/// Default TCP port of the registration service
pub const DEFAULT_PORT: u16 = 9653;

/// Main configuration for a carreg server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Gzip-compressed registry snapshot, loaded at startup and written at
    /// shutdown. Fixture data is synthesized when the file is absent.
    pub data_file: PathBuf,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Largest payload a peer may declare in a frame header (bytes)
    pub max_payload_size: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// How often the accept loop checks the shutdown flag (milliseconds)
    pub accept_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("car-registrations.dat"),
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_connections: 1024,
            max_payload_size: 16 * 1024 * 1024, // 16 MB
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
            accept_poll_ms: 50,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(RegistryError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.max_payload_size == 0 {
            return Err(RegistryError::Config(
                "max_payload_size must be at least 1 byte".to_string(),
            ));
        }
        if self.listen_addr.is_empty() {
            return Err(RegistryError::Config("listen_addr is empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the registry snapshot file
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_file = path.into();
        self
    }

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

    /// Set the maximum accepted payload size (in bytes)
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Set the maximum accepted payload size (in KB)
    pub fn max_payload_kb(self, kb: usize) -> Result<Self> {
        let size = kb.checked_mul(1024).ok_or_else(|| {
            RegistryError::Config(format!("max payload of {} KB does not fit in memory", kb))
        })?;
        Ok(self.max_payload_size(size))
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the shutdown polling interval of the accept loop
    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
