//! otto: container dashboard
//!
//! Lists the containers known to the local engine in three columns
//! (running, paused, stopped) and lets the browser start, pause, unpause
//! or stop them. The engine owns all state; every page load is a fresh query.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod action;
mod assets;
mod config;
mod docker;
mod engine;
mod inventory;
mod web;

use config::{ConfigOrigin, LoggingConfig};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, origin) = config::load_config()?;
    init_tracing(&config.logging);

    match &origin {
        ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
        ConfigOrigin::Defaults(path) => {
            warn!("Config file not found at {}, using defaults", path.display())
        }
    }

    let assets_dir = config.server.assets_dir.as_deref();
    let app = if config.engine.enabled {
        let engine = docker::DockerEngine::connect()
            .context("Failed to connect to container engine")?;
        let state = web::AppState {
            engine: Arc::new(engine),
            deadline: config.engine.deadline(),
        };
        web::live_router(state, assets_dir)
    } else {
        info!("Engine integration disabled, serving the static page only");
        web::stub_router(assets_dir)
    };

    let addr = config.server.listen;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            return Err(e).with_context(|| format!("Failed to bind {addr}"));
        }
    };
    info!("Serving on port {}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("otto shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down..."),
        () = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
