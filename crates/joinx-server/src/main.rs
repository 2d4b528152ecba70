//! # joinx-server: HTTP Service for Join-Reorder Exploration
//!
//! Exposes the join-reorder rule registry as a network service: a caller (a search
//! driver, a test harness, a plan debugger) posts a plan subtree and receives every
//! equivalent alternative the enabled rules produce for its root.
//!
//! ## Endpoints
//!
//! - `GET  /health`            - Health check
//! - `GET  /rules`             - List registered rules and whether each is enabled
//! - `POST /rules/configure`   - Enable/disable rules by id
//! - `POST /explore`           - Apply the enabled rules to a JSON plan
//!
//! ## Configuration
//!
//! See [`config`]. Logging is controlled by `RUST_LOG`, falling back to `JOINX_LOG`
//! and then to `info,joinx=debug`.

mod config;
mod routes;
mod state;
mod wire;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/rules", get(routes::list_rules))
        .route("/rules/configure", post(routes::configure_rules))
        .route("/explore", post(routes::explore))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !config.disabled_rules.is_empty() {
        tracing::info!("Rules disabled at startup: {:?}", config.disabled_rules);
    }
    let state = Arc::new(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&state.config.listen_addr).await?;
    tracing::info!("joinx-server listening on http://{}", state.config.listen_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
