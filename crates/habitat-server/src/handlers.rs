//! REST endpoint handlers for the player server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/telemetry` | Current readings and sensory text |
//! | `POST` | `/api/command` | Send one command to the survivor |
//! | `GET` | `/api/events` | Event history, oldest first |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use habitat_types::{EventRecord, Telemetry};
use serde::Serialize;

use crate::error::ApiError;
use crate::message::{ClientMessage, ServerMessage};
use crate::state::AppState;

/// Response body for `GET /api/telemetry`.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryView {
    /// Ticks run so far.
    pub tick: u64,
    /// Simulated seconds elapsed.
    pub elapsed_seconds: f64,
    /// Active scenario id.
    pub scenario: Option<&'static str>,
    /// Whether the active scenario has been solved.
    pub scenario_solved: bool,
    /// Whether the survivor is dead.
    pub game_over: bool,
    /// Rounded readings.
    pub telemetry: Telemetry,
    /// Sensory description.
    pub sensory: String,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing habitat status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tick, scenario, telemetry, game_over) = {
        let engine = state.engine.lock().await;
        (
            engine.state().metadata.tick_count,
            engine.active_scenario().unwrap_or("none"),
            engine.telemetry(),
            engine.is_game_over(),
        )
    };
    let status = if game_over { "SIGNAL LOST" } else { "LIVE" };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Ares Habitat Link</title>
    <style>
        body {{
            background: #120b08;
            color: #e6d5c3;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #ff7b39; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #1e1410;
            border: 1px solid #4a3226;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #a08878; font-size: 0.85rem; }}
        .metric .value {{ color: #ff7b39; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #ff7b39; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #7ee787; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Ares Habitat Link</h1>
    <p>Status: <span class="status">{status}</span> | Scenario: {scenario}</p>

    <div class="metric"><div class="label">Tick</div><div class="value">{tick}</div></div>
    <div class="metric"><div class="label">CO2 %</div><div class="value">{co2:.2}</div></div>
    <div class="metric"><div class="label">O2 %</div><div class="value">{o2:.1}</div></div>
    <div class="metric"><div class="label">Battery %</div><div class="value">{battery:.0}</div></div>
    <div class="metric"><div class="label">Heart Rate</div><div class="value">{hr}</div></div>

    <h2>Endpoints</h2>
    <ul>
        <li>WS <code>/ws</code> -- telemetry stream and commands</li>
        <li>GET <a href="/api/telemetry">/api/telemetry</a></li>
        <li>GET <a href="/api/events">/api/events</a></li>
        <li>POST <code>/api/command</code></li>
        <li>GET <a href="/api/operator/status">/api/operator/status</a></li>
    </ul>
</body>
</html>"#,
        co2 = telemetry.co2,
        o2 = telemetry.o2,
        battery = telemetry.battery,
        hr = telemetry.heart_rate,
    ))
}

// ---------------------------------------------------------------------------
// GET /api/telemetry
// ---------------------------------------------------------------------------

/// Return the current readings.
pub async fn get_telemetry(State(state): State<Arc<AppState>>) -> Json<TelemetryView> {
    let engine = state.engine.lock().await;
    Json(TelemetryView {
        tick: engine.state().metadata.tick_count,
        elapsed_seconds: engine.state().metadata.elapsed_seconds,
        scenario: engine.active_scenario(),
        scenario_solved: engine.scenario_solved(),
        game_over: engine.is_game_over(),
        telemetry: engine.telemetry(),
        sensory: engine.sensory(),
    })
}

// ---------------------------------------------------------------------------
// POST /api/command
// ---------------------------------------------------------------------------

/// Send one command to the survivor and return the reply frame.
///
/// The body is the same `{"text": "..."}` frame `WebSocket` clients send.
pub async fn post_command(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClientMessage>,
) -> Result<Json<ServerMessage>, ApiError> {
    if body.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_owned()));
    }
    Ok(Json(state.command(&body.text).await))
}

// ---------------------------------------------------------------------------
// GET /api/events
// ---------------------------------------------------------------------------

/// Return the event history, oldest first.
pub async fn list_events(State(state): State<Arc<AppState>>) -> Json<Vec<EventRecord>> {
    let engine = state.engine.lock().await;
    Json(engine.state().events.history.clone())
}
