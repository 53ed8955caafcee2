//! Minimal HTTP surface so hosting platforms see a live process.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Clone)]
pub struct KeepaliveState {
    pub started_at: DateTime<Utc>,
}

impl KeepaliveState {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

impl Default for KeepaliveState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn router(state: KeepaliveState) -> Router {
    Router::new()
        .route("/", get(ping_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `address` and serve the keepalive routes until the process exits.
pub async fn serve(address: String, state: KeepaliveState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "keepalive endpoint listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn ping_handler() -> &'static str {
    "Postdeck is running"
}

async fn health_handler(State(state): State<KeepaliveState>) -> Json<Value> {
    let uptime = Utc::now() - state.started_at;
    Json(json!({
        "status": "ok",
        "started_at": state.started_at.to_rfc3339(),
        "uptime_seconds": uptime.num_seconds(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
