use crate::relay::RelayHandle;
use crate::signaling::ws_handler;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub relay: RelayHandle,
}

/// HTTP surface of the relay: the WebSocket upgrade route and a status endpoint.
pub fn router(relay: RelayHandle) -> Router {
    Router::new()
        .route("/ws/{identity}", get(ws_handler))
        .route("/health", get(health))
        .with_state(AppState { relay })
}

async fn health(State(state): State<AppState>) -> Response {
    match state.relay.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}
