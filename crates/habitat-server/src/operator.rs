//! Operator REST handlers for runtime control of the tick loop.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Loop and habitat status |
//! | `POST` | `/api/operator/speed` | Set tick interval (ms) |
//! | `POST` | `/api/operator/stop` | Stop the tick loop |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use habitat_core::runner::{LoopControl, MIN_TICK_INTERVAL_MS};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds (minimum 100).
    pub tick_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    ok: bool,
    message: String,
}

fn control(state: &AppState) -> Result<&Arc<LoopControl>, ApiError> {
    state
        .control
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("tick loop control not available".to_owned()))
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Return tick loop settings alongside the habitat's headline status.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let control = control(&state)?;
    let engine = state.engine.lock().await;

    Ok(Json(serde_json::json!({
        "tick": engine.state().metadata.tick_count,
        "elapsed_seconds": engine.state().metadata.elapsed_seconds,
        "tick_interval_ms": control.tick_interval_ms(),
        "dt_seconds": control.dt_seconds(),
        "max_ticks": control.max_ticks(),
        "stop_requested": control.is_stop_requested(),
        "scenario": engine.active_scenario(),
        "scenario_solved": engine.scenario_solved(),
        "game_over": engine.is_game_over(),
    })))
}

// ---------------------------------------------------------------------------
// POST /api/operator/speed
// ---------------------------------------------------------------------------

/// Change the real-time interval between ticks.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    control(&state)?
        .set_tick_interval_ms(body.tick_interval_ms)
        .map_or_else(
            || {
                Err(ApiError::BadRequest(format!(
                    "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
                )))
            },
            |prev| {
                Ok(Json(serde_json::json!({
                    "ok": true,
                    "message": format!("Tick interval changed from {prev}ms to {}ms", body.tick_interval_ms),
                    "previous_interval_ms": prev,
                    "new_interval_ms": body.tick_interval_ms,
                })))
            },
        )
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Stop the tick loop. The server keeps answering requests.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    control(&state)?.request_stop();

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Tick loop stop requested".to_owned(),
    }))
}
