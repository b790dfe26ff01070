//! gcs-daemon entry point.
//!
//! Thin on purpose: load config, build shared state, wire middleware, serve.
//! Route handlers live in `routes.rs`; shared state in `state.rs`.
//!
//! Environment:
//! - `GCS_CONFIG`: comma-separated YAML layers in merge order (optional)
//! - `GCS_DAEMON_ADDR`: full bind address, overrides everything
//! - `PORT`: bind `0.0.0.0:<PORT>`, overrides `daemon.addr`

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use gcs_daemon::{routes, state};
use tokio::sync::watch;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let state::Boot {
        rt,
        state: shared,
        scheduled,
    } = state::boot(config_paths_from_env()).await?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let ticker = scheduled.map(|(sink, interval)| {
        info!(interval_secs = interval.as_secs(), sink = sink.name(), "scheduled passes enabled");
        state::spawn_scheduled_passes(Arc::clone(&shared), sink, interval, stop_rx)
    });

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let addr = bind_addr(&rt.cfg.daemon.addr)?;
    info!("gcs-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    let _ = stop_tx.send(true);
    if let Some(ticker) = ticker {
        let _ = ticker.await;
    }
    // The blocking HTTP client inside the source must not be dropped on an async worker.
    let _ = tokio::task::spawn_blocking(move || drop(shared)).await;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn config_paths_from_env() -> Vec<String> {
    std::env::var("GCS_CONFIG")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn bind_addr(configured: &str) -> anyhow::Result<SocketAddr> {
    if let Ok(raw) = std::env::var("GCS_DAEMON_ADDR") {
        return raw
            .parse()
            .with_context(|| format!("invalid GCS_DAEMON_ADDR '{raw}'"));
    }
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid PORT '{port}'"))?;
        return Ok(SocketAddr::from(([0, 0, 0, 0], port)));
    }
    configured
        .parse()
        .with_context(|| format!("invalid daemon.addr '{configured}'"))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested");
}
