//! # Bobo Data Server
//!
//! Serves the `data` and `echo` JSON-RPC methods over HTTP.
//!
//! ## Usage
//! ```bash
//! cargo run --package bobo-data-server -- --bind 127.0.0.1:8080
//!
//! curl -X POST http://127.0.0.1:8080/rpc \
//!   -d '{"jsonrpc": "2.0", "method": "data", "params": {"key_name": "foobar"}, "id": 1}'
//! ```

mod service;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bobo_http_server::{HttpRpcServer, ServerConfig};

use crate::store::EntityStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Path of the JSON-RPC endpoint
    #[arg(short, long, default_value = "/rpc")]
    path: String,

    /// Send permissive CORS headers
    #[arg(long)]
    cors: bool,

    /// Maximum accepted request body in bytes
    #[arg(long, default_value = "1048576")]
    max_body_size: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_address: self.bind,
            rpc_path: self.path.clone(),
            enable_cors: self.cors,
            max_body_size: self.max_body_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Bobo Data Server");

    let registry = service::registry(Arc::new(EntityStore::seeded()))?;
    let server = HttpRpcServer::builder()
        .config(args.server_config())
        .registry(registry)
        .build();

    server.run_until(shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
}
