//! `WebSocket` handler: telemetry stream plus player commands.
//!
//! Clients connect to `GET /ws`. The server greets them with an `INIT`
//! frame, then forwards every `TELEMETRY` broadcast. Text frames of the
//! form `{"text": "..."}` are run through the command path and answered
//! on the same socket with a `RESPONSE` or `INTERCEPT` frame.
//!
//! Lagging clients skip ahead to the newest telemetry.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::message::{ClientMessage, ServerMessage};
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_player(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    info!("Player connected");

    // Subscribe first so no tick between the greeting and the loop is lost.
    let mut rx = state.subscribe();

    if !send(&mut socket, &state.greeting().await).await {
        debug!("WebSocket client disconnected before greeting");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(message) => {
                        if !send(&mut socket, &message).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = reply_to_frame(&state, text.as_str()).await;
                        if !send(&mut socket, &reply).await {
                            debug!("WebSocket client disconnected (reply failed)");
                            return;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Player disconnected");
                        return;
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Binary and pong frames carry nothing for us.
                    }
                }
            }
        }
    }
}

/// Answer one client text frame.
pub(crate) async fn reply_to_frame(state: &AppState, frame: &str) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(frame) {
        Ok(client) if client.text.trim().is_empty() => ServerMessage::Error {
            message: "text must not be empty".to_owned(),
        },
        Ok(client) => state.command(&client.text).await,
        Err(e) => {
            warn!(error = %e, "Malformed client frame");
            ServerMessage::Error {
                message: format!("expected {{\"text\": \"...\"}}: {e}"),
            }
        }
    }
}

/// Serialize and send a frame. Returns `false` once the socket is gone.
async fn send(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize server message: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use habitat_core::engine::Engine;
    use habitat_runner::interpreter::CommandInterpreter;
    use habitat_runner::llm::{LlmBackend, MockBackend};
    use habitat_runner::persona::SurvivorPersona;
    use habitat_runner::prompt::PromptEngine;

    use super::*;

    fn state() -> AppState {
        let mut engine = Engine::new();
        engine.load_scenario("co2_crisis").unwrap();
        let backend = Arc::new(LlmBackend::Mock(MockBackend));
        let prompts = Arc::new(
            PromptEngine::from_sources("persona", "{{ narrative }}", "{{ input }}").unwrap(),
        );
        AppState::new(
            engine.into_shared(),
            CommandInterpreter::new(Arc::clone(&backend), Arc::clone(&prompts)),
            SurvivorPersona::new(backend, prompts),
        )
    }

    #[tokio::test]
    async fn text_frames_become_commands() {
        let reply = reply_to_frame(&state(), r#"{"text": "search the shelf"}"#).await;
        assert!(matches!(reply, ServerMessage::Response { .. }));

        let reply = reply_to_frame(&state(), r#"{"text": "open airlock"}"#).await;
        assert!(matches!(
            &reply,
            ServerMessage::Intercept { jack_response, .. }
                if jack_response.starts_with("[SAFETY INTERLOCK]")
        ));
    }

    #[tokio::test]
    async fn bad_frames_get_an_error_frame() {
        let state = state();
        assert!(matches!(
            reply_to_frame(&state, "not json").await,
            ServerMessage::Error { .. }
        ));
        assert!(matches!(
            reply_to_frame(&state, r#"{"text": "   "}"#).await,
            ServerMessage::Error { .. }
        ));
    }

    #[tokio::test]
    async fn greeting_carries_current_readings() {
        let greeting = state().greeting().await;
        assert!(matches!(
            &greeting,
            ServerMessage::Init { telemetry, .. } if telemetry.co2 > 2.0
        ));
    }
}
