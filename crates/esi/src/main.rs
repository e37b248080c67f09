//! `esi` - REST service for email account profiles.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::net::SocketAddr;

use anyhow::Context;
use axum::ServiceExt;
use axum::extract::Request;
use clap::Parser;
use esi::{AppState, Config};
use esi_core::AccountStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "esi=info,esi_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let directory = config.store_directory();
    tokio::fs::create_dir_all(&directory)
        .await
        .with_context(|| format!("unable to create store directory {}", directory.display()))?;

    let mut state = AppState::new(AccountStore::new(&directory));
    if let Some(throttle) = config.throttle() {
        state = state.with_throttle(throttle);
    }
    let app = esi::app(state, config.audit());

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("unable to listen on {}", config.bind))?;
    info!(
        addr = %listener.local_addr()?,
        directory = %directory.display(),
        audit = config.audit(),
        throttle = !config.no_throttle,
        "Starting ESI"
    );

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server failed")?;

    info!("ESI stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutting down");
}
