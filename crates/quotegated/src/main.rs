//! # quotegated
//!
//! Market-data gateway daemon. Wires the tool set, dispatcher, and HTTP
//! server together and runs until interrupted.

#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quotegate_rpc::ToolRegistry;
use quotegate_server::config::ServerConfig;
use quotegate_server::metrics;
use quotegate_server::server::GatewayServer;
use quotegate_tools::{ExchangeClient, market_tools};

/// Market-data gateway server.
#[derive(Parser, Debug)]
#[command(name = "quotegated", about = "Market-data gateway server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "8787")]
    port: u16,

    /// Base URL of the upstream exchange REST API.
    #[arg(long, default_value = "https://api.binance.com")]
    exchange_url: String,

    /// Seconds between heartbeat envelopes per stream connection.
    #[arg(long, default_value = "30")]
    heartbeat_interval: u64,

    /// Per-request timeout for upstream exchange calls, in seconds.
    #[arg(long, default_value = "10")]
    request_timeout: u64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_tool_registry(client: Arc<ExchangeClient>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in market_tools(client) {
        let name = tool.descriptor().name;
        registry
            .register(tool)
            .with_context(|| format!("failed to register tool '{name}'"))?;
    }
    tracing::debug!(tool_count = registry.len(), tools = ?registry.names(), "tool registry created");
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging();

    let metrics_handle = metrics::install_recorder();

    let client = Arc::new(
        ExchangeClient::new(&args.exchange_url, Duration::from_secs(args.request_timeout))
            .context("Failed to build exchange client")?,
    );
    let registry = build_tool_registry(client)?;
    let tool_count = registry.len();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        heartbeat_interval_secs: args.heartbeat_interval,
        exchange_base_url: args.exchange_url,
        request_timeout_secs: args.request_timeout,
        ..ServerConfig::default()
    };

    let server = GatewayServer::new(config, registry).with_metrics(metrics_handle);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;

    tracing::info!("quotegated listening on http://{addr} ({tool_count} tools registered)");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().graceful_shutdown(vec![handle], None).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
