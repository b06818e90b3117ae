// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! Veriflow server binary.
//!
//! Wires configuration, the verification service, the audit trail, and the
//! session sweeper together and serves the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use veriflow_server::api::router;
use veriflow_server::audit::{AuditLog, DEFAULT_AUDIT_CAPACITY};
use veriflow_server::config;
use veriflow_server::session::{InMemorySessionStore, StepCatalog, VerificationService};
use veriflow_server::state::{AppState, AuthConfig};
use veriflow_server::sweeper::{SessionSweeper, DEFAULT_SESSION_TTL, DEFAULT_SWEEP_INTERVAL};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` controls the filter; `LOG_FORMAT=json` switches to JSON
/// output for log aggregation.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var(config::LOG_FORMAT_ENV).as_deref() {
        Ok("json") => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let auth_config = AuthConfig::from_env();

    let store = Arc::new(InMemorySessionStore::new());
    let audit = Arc::new(AuditLog::with_capacity(config::env_usize_or(
        config::AUDIT_CAPACITY_ENV,
        DEFAULT_AUDIT_CAPACITY,
    )));
    let verification = VerificationService::new(store.clone(), StepCatalog::builtin());

    let sweeper = SessionSweeper::new(store, audit.clone())
        .with_ttl(Duration::from_secs(config::env_u64_or(
            config::SESSION_TTL_ENV,
            DEFAULT_SESSION_TTL.as_secs(),
        )))
        .with_sweep_interval(Duration::from_secs(config::env_u64_or(
            config::SWEEP_INTERVAL_ENV,
            DEFAULT_SWEEP_INTERVAL.as_secs(),
        )));

    let shutdown = CancellationToken::new();
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    let state = AppState::new(verification, audit, auth_config);
    let app = router(state);

    // Parse bind address
    let host = config::env_or(config::HOST_ENV, config::DEFAULT_HOST);
    let port: u16 = std::env::var(config::PORT_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(config::DEFAULT_PORT);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    info!("Veriflow server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");

    shutdown.cancel();
    let _ = sweeper_task.await;
    info!("Shutdown complete");
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
