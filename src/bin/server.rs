//! GateKV Server Binary
//!
//! Starts the TCP server for GateKV.

use std::sync::Arc;

use clap::Parser;
use gatekv::network::Server;
use gatekv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// GateKV Server
#[derive(Parser, Debug)]
#[command(name = "gatekv-server")]
#[command(about = "Prepare-gated in-memory key-value server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Close connections idle for this long (milliseconds, 0 = never)
    #[arg(long, default_value = "30000")]
    idle_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gatekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("GateKV Server v{}", gatekv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .idle_timeout_ms(args.idle_timeout_ms)
        .build();

    let engine = Arc::new(Engine::new());

    let server = match Server::bind(config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
