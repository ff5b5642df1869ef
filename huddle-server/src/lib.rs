//! Signaling relay for mesh video calls.
//!
//! Clients connect over a WebSocket at `/ws`, join a named room and exchange
//! offers, answers and ICE candidates through the relay. The relay never looks
//! inside negotiation payloads; once peers are connected media flows directly
//! between them.

mod config;
mod room;
mod router;
mod signaling;

pub use config::*;
pub use room::*;
pub use router::*;
pub use signaling::*;

use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Spawns the router task and returns the connection table wired to it.
pub fn start_router(config: &RelayConfig) -> SignalingService {
    let (router_tx, router_rx) = mpsc::channel(config.command_buffer);
    let service = SignalingService::new(router_tx);

    let router = MessageRouter::new(
        router_rx,
        Arc::new(service.clone()),
        config.ice_servers.clone(),
    );
    tokio::spawn(router.run());

    service
}

/// HTTP surface of the relay.
pub fn app(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serves the relay on an already bound listener.
pub async fn serve(listener: TcpListener, config: RelayConfig) -> anyhow::Result<()> {
    let service = start_router(&config);

    info!(
        "Signaling relay listening on ws://{}/ws",
        listener.local_addr()?
    );
    axum::serve(listener, app(service))
        .await
        .context("relay server failed")
}

/// Binds `config.host:config.port` and serves the relay until it fails.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    serve(listener, config).await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "huddle-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn stats_handler(State(service): State<SignalingService>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    if service.router().send(RouterCommand::Stats { reply }).await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    match rx.await {
        Ok(stats) => Json(json!({
            "participants": stats.participants,
            "rooms": stats.rooms,
            "connections": service.connection_count(),
        }))
        .into_response(),
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
