//! Proposer service entry point: loads configuration from the environment,
//! wires up logging and metrics, and serves the metrics/health HTTP surface.
//! `forge_node::rpc` provides real engine-API and builder-relay clients;
//! the pool, fork-choice, and state-transition collaborators are left to
//! the embedding beacon node, since those subsystems are explicit
//! non-goals of this core (state transition, fork choice, validator
//! duties, deposit tracking, the p2p stack).

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use clap::Parser;

use forge_node::config::ProposerConfig;
use forge_node::logging::{self, LoggingConfig};
use forge_node::metrics::ProposerMetrics;

#[derive(Parser, Debug)]
#[command(name = "forge-proposer", version, about = "Block-proposer assembly core service")]
struct Cli {
    /// Override the metrics/health listen address; falls back to
    /// `FORGE_METRICS_ADDR` or the built-in default.
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ProposerConfig::from_env();

    logging::init(LoggingConfig::new(config.log_format));
    tracing::info!(strategy = ?config.attestation_packing_strategy, "forge-proposer starting");

    let metrics = std::sync::Arc::new(ProposerMetrics::new());
    let addr = cli
        .metrics_addr
        .or_else(|| config.metrics_addr.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 9090)));

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/metrics",
            get({
                let metrics = metrics.clone();
                move || render_metrics(metrics.clone())
            }),
        );

    tracing::info!(%addr, "serving metrics");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn render_metrics(metrics: std::sync::Arc<ProposerMetrics>) -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let families = metrics.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        tracing::warn!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
