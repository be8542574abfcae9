//! Axum router construction for the player server.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws` -- `WebSocket` telemetry stream and command channel
/// - `GET /api/telemetry` -- current readings
/// - `POST /api/command` -- one command, one reply
/// - `GET /api/events` -- event history
/// - `GET /api/operator/status`, `POST /api/operator/speed`,
///   `POST /api/operator/stop` -- tick loop control
///
/// CORS allows any origin so a browser console served from elsewhere
/// can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws", get(ws::ws_player))
        .route("/api/telemetry", get(handlers::get_telemetry))
        .route("/api/command", post(handlers::post_command))
        .route("/api/events", get(handlers::list_events))
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
