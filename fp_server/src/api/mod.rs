//! HTTP/WebSocket API for the party game server.
//!
//! The API surface is deliberately small: clients hold a single
//! WebSocket for the whole visit, and every game interaction flows
//! through it as a tagged JSON event. The socket handler forwards
//! parsed events to the server actor and writes its broadcasts back.
//!
//! # Endpoints
//!
//! - `GET /health` - Server health status
//! - `GET /ws` - Establish the game WebSocket connection

pub mod websocket;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use forfeit_party::server::ServerHandle;

/// Application state shared across all handlers. Cloned per request;
/// the handle is just a channel sender.
#[derive(Clone)]
pub struct AppState {
    pub server: ServerHandle,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
async fn health_check() -> impl IntoResponse {
    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}
