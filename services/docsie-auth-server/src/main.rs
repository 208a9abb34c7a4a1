//! Docsie Auth Server
//!
//! Issues short-lived widget tokens signed with the Docsie master key and
//! serves the deployment configuration the widget loader needs:
//! 1. Loads `.env`, the optional TOML config and env overrides
//! 2. Builds the token issuer (refuses to start without a master key)
//! 3. Serves the auth and config routes until SIGTERM/SIGINT

mod config;
mod error;
mod metrics;
mod routes;

use anyhow::{Context, Result};
use docsie_auth::{DEFAULT_REDIRECT_URL, TokenIssuer};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::routes::{AppState, ServiceStats, build_router};

/// How long in-flight requests may drain after a shutdown signal
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // .env in the working directory or any parent; absence is fine
    let dotenv_path = dotenv::dotenv().ok();

    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting docsie-auth-server");
    if let Some(path) = dotenv_path {
        info!(path = %path.display(), "loaded .env");
    }

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    match &config_path {
        Some(path) => info!(path = %path.display(), "loading configuration"),
        None => info!("no config file, using defaults and environment"),
    }

    let config = Config::load(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load configuration".to_owned(),
    })?;

    let issuer = TokenIssuer::from_settings(
        config.docsie.master_key.as_ref(),
        config.docsie.expiry_minutes.as_deref(),
    )
    .context("cannot issue tokens; set DOCSIE_MASTER_KEY (and a positive JWT_EXPIRY_MINUTES)")?;

    if config.docsie.deployment_key.is_none() {
        warn!("DOCSIE_DEPLOYMENT_KEY not set; /config/docsie will answer 400");
    }
    let redirect_url = config
        .docsie
        .redirect_url
        .clone()
        .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_owned());

    info!(
        listen_addr = %config.server.listen_addr,
        max_connections = config.server.max_connections,
        expiry_minutes = issuer.expiry_minutes(),
        %redirect_url,
        login_page = %config.server.login_page.display(),
        "configuration loaded"
    );

    let state = AppState {
        issuer,
        deployment_key: config.docsie.deployment_key.clone(),
        redirect_url,
        login_page: config.server.login_page.clone(),
        stats: ServiceStats::new(),
        prometheus: prometheus_handle,
    };

    let app = build_router(state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timer starts at signal receipt, not at server start
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
