//! carreg Server Binary
//!
//! Loads the registry, serves it over TCP until SHUTDOWN or Ctrl+C, then
//! saves it back.

use std::path::PathBuf;
use std::sync::Arc;

use carreg::network::Server;
use carreg::{persistence, Config};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// carreg Server
#[derive(Parser, Debug)]
#[command(name = "carreg-server")]
#[command(about = "Car registration server")]
#[command(version)]
struct Args {
    /// Registry file (gzip-compressed snapshot)
    #[arg(short, long, default_value = "car-registrations.dat")]
    data_file: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:9653")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Read/write timeout per connection in milliseconds (0 disables)
    #[arg(short, long, default_value = "30000")]
    timeout_ms: u64,

    /// Largest accepted request payload in KB
    #[arg(long, default_value = "16384")]
    max_payload_kb: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,carreg=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("carreg Server v{}", carreg::VERSION);
    tracing::info!("Registry file: {}", args.data_file.display());
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let builder = Config::builder()
        .data_file(&args.data_file)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms);
    let config = match builder.max_payload_kb(args.max_payload_kb) {
        Ok(builder) => builder.build(),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Load registry
    let registry = match persistence::load(&config.data_file) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!("Server cannot load data: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Loaded {} car registrations", registry.len());

    let data_file = config.data_file.clone();
    let server = match Server::bind(config, Arc::clone(&registry)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl+C takes the same orderly path as SHUTDOWN
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::warn!("Cannot install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        // Still save: the registry may hold accepted changes
        tracing::error!("Server error: {}", e);
    }

    match persistence::save(&data_file, &registry) {
        Ok(count) => tracing::info!("Saved {} car registrations", count),
        Err(e) => {
            tracing::error!("Server cannot save data: {}", e);
            std::process::exit(1);
        }
    }

    tracing::info!("Server stopped");
}
