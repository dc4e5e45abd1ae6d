//! Tollgate HTTP server.
//!
//! Mounts the first-party token endpoint, the scope-guarded resources declared
//! in configuration and, when an identity provider is configured, the
//! delegated login routes.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppState, SessionServices};

use std::sync::Arc;
use std::time::Duration;
use tollgate_core::TollgateConfig;

/// How often expired sessions are swept from the store.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Serve until Ctrl-C.
pub async fn run(config: TollgateConfig) -> anyhow::Result<()> {
    let bind = config.server.bind.clone();
    let state = Arc::new(AppState::from_config(config)?);

    let purge = state
        .session
        .as_ref()
        .map(|s| tollgate_session::spawn_purge_task(s.flow.store().clone(), PURGE_INTERVAL));

    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(
        bind = %bind,
        app_name = %state.config.app_name,
        resources = state.config.resources.len(),
        delegated_login = state.session.is_some(),
        "tollgate-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = purge {
        handle.abort();
    }
    tracing::info!("tollgate-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
