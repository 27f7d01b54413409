//! EffectForge Backend Server
//!
//! Entry point: configuration loading, worker startup, sample seeding and the
//! HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use effectforge_backend::rate_limiter::RateLimiterManager;
use effectforge_backend::state::AppState;

mod bootstrap;
mod cli;
mod config_helpers;
mod tracing_setup;

use bootstrap::seed_sample_library;
use cli::CliArgs;
use config_helpers::{cors_layer_from_config, parse_bind_address};
use tracing_setup::install_tracing_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = load_config(args.config_path.as_ref())?;
    effectforge_config::validate_config(&config).context("invalid configuration")?;

    install_tracing_from_config(&config.logging);
    tracing::info!(
        config_path = ?args.config_path,
        workers = config.queue.workers,
        stage_delay_ms = config.queue.stage_delay_ms,
        rate_limit = config.rate_limit.enabled,
        "configuration loaded"
    );

    let state = Arc::new(AppState::from_config(&config).await);
    let pool = state.start_workers(config.queue.workers);

    if config.library.seed_samples {
        if let Err(e) = seed_sample_library(&state).await {
            tracing::error!(error = %e, "failed to seed sample library");
        }
    }

    let limiter = RateLimiterManager::from_config(&config.rate_limit);
    let mut app = effectforge_backend::build_router_with_limiter(state.clone(), limiter);
    if let Some(cors) = cors_layer_from_config(&config.cors) {
        app = app.layer(cors);
    }

    let addr = parse_bind_address(&config.server.host, config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped; draining job workers");
    pool.shutdown().await;
    Ok(())
}

/// Load configuration from file or defaults.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<effectforge_config::Config> {
    effectforge_config::load_config(path).map_err(|e| {
        eprintln!("failed to load configuration: {e}");
        anyhow::anyhow!(e.to_string())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
