// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `atrium serve` command implementation.
//!
//! Opens storage (running migrations), resets stale presence rows left by a
//! crashed process, constructs the collaboration server, mounts the billing
//! webhook endpoint, and serves everything on a single listener until
//! SIGINT/SIGTERM.

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use atrium_billing::WebhookState;
use atrium_collab::CollabServer;
use atrium_config::AtriumConfig;
use atrium_core::{AtriumError, SessionVerifier};
use atrium_storage::queries::presence;
use atrium_storage::{Database, StoreSessionVerifier};

/// Runs the `atrium serve` command.
pub async fn run_serve(config: AtriumConfig) -> Result<(), AtriumError> {
    init_tracing(&config.server.log_level);
    info!("starting atrium serve");

    let db = Database::open(&config.storage).await?;

    // Crash recovery: presence rows left online by an unclean shutdown
    // would show phantom users until their next join.
    let reset = presence::reset_all_offline(&db).await?;
    if reset > 0 {
        info!(count = reset, "reset stale presence rows");
    }

    let app = build_router(&config, db.clone())?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AtriumError::Channel {
            message: format!("failed to bind to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;
    info!("atrium listening on {addr}");

    let cancel = install_signal_handler();
    axum::serve(listener, app)
        .with_graceful_shutdown({
            let cancel = cancel.clone();
            async move { cancel.cancelled().await }
        })
        .await
        .map_err(|e| AtriumError::Channel {
            message: format!("server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    db.close().await?;
    info!("atrium serve shutdown complete");
    Ok(())
}

/// Build the combined application router: collaboration `/ws` + `/health`,
/// plus the billing webhook endpoint when enabled.
pub fn build_router(config: &AtriumConfig, db: Database) -> Result<Router, AtriumError> {
    let verifier: Arc<dyn SessionVerifier> = Arc::new(StoreSessionVerifier::new(db.clone()));
    let collab = CollabServer::new(db.clone(), verifier, config.collab.clone());
    let mut app = collab.router();

    if config.billing.enabled {
        // Fail-closed: an unverified webhook endpoint would persist forged
        // events, so refuse to start without a secret.
        let secret = config.billing.webhook_secret.clone().ok_or_else(|| {
            AtriumError::Config(
                "billing.webhook_secret is required when billing is enabled".to_string(),
            )
        })?;
        app = app.merge(atrium_billing::router(WebhookState {
            db,
            secret,
            tolerance_secs: config.billing.signature_tolerance_secs,
        }));
        info!("billing webhook endpoint enabled");
    } else {
        info!("billing webhook endpoint disabled by configuration");
    }

    Ok(app)
}

/// Cancel the returned token on SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handler = token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(stream) => stream,
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down"),
                _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("SIGINT received, shutting down");
        }
        handler.cancel();
    });
    token
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("atrium={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
