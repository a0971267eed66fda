//! courierd — Courier daemon.
//!
//! Serves `GreetService` and `BlogService` over gRPC until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use courier::server::CourierServer;
use courier::server::config::Config;
use courier::server::tls::server_tls;
use courier::store::{FsBlobStore, MemoryStore};

/// Courier daemon — streaming greeting and blog service.
#[derive(Parser)]
#[command(name = "courierd")]
#[command(version = courier::PKG_VERSION, long_version = courier::version_string())]
#[command(about = "Courier gRPC daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Override the bind address from the configuration.
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: info for the daemon; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(address) = args.address {
        config.server.address = address;
    }

    // Parse address
    let addr: SocketAddr = config.server.address.parse().map_err(|e| {
        courier::CourierError::Configuration(format!("Invalid address: {e}"))
    })?;

    let tls = server_tls(config.server.tls.as_ref()).await?;

    info!(
        version = courier::version_string(),
        built_at = courier::version::built_at().unwrap_or("unknown"),
        %addr,
        tls = tls.is_some(),
        blob_root = %config.storage.blob_root.display(),
        "courierd starting"
    );

    let server = CourierServer::new(
        &config,
        Arc::new(MemoryStore::new()),
        Arc::new(FsBlobStore::new(&config.storage.blob_root)),
    )
    .with_tls(tls);

    server.serve_with_shutdown(addr, shutdown_signal()).await?;

    info!("courierd stopped");
    Ok(())
}

/// Resolves on Ctrl-C. In-flight calls are drained before the server returns.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
