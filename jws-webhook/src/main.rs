//! JWS Webhook server.
//!
//! This binary provides a thin web server that:
//! - Receives webhooks on `POST /`
//! - Verifies the detached JWS signature against a remote JWKS
//! - Returns 200, 400 or 500 with an empty body

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jws_webhook::web::{router, AppState};
use jws_webhook::{Config, JwksKeyResolver};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        port = config.port,
        jwks_uri = %config.jwks_uri,
        signature_header = %config.signature_header,
        jwks_fetch_timeout_ms = config.jwks_fetch_timeout_ms,
        jwks_cache_ttl_secs = config.jwks_cache_ttl_secs,
        "config_loaded"
    );

    if config.jwks_uri.scheme() != "https" {
        tracing::warn!(jwks_uri = %config.jwks_uri, "jwks_uri_not_https");
    }

    // Create the JWKS key resolver
    let resolver =
        JwksKeyResolver::from_config(&config).context("Failed to create JWKS resolver")?;
    info!("jwks_resolver_created");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Build the router
    let app = router(AppState::new(config, Arc::new(resolver)));

    // Bind to address
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
