//! Shared application state for the player server.
//!
//! [`AppState`] holds the engine handle, the command path (interpreter
//! and persona), optional loop controls, and the broadcast channel that
//! fans tick telemetry out to every connected `WebSocket` client.

use std::sync::Arc;

use habitat_core::command::handle_command;
use habitat_core::engine::SharedEngine;
use habitat_core::runner::LoopControl;
use habitat_runner::interpreter::CommandInterpreter;
use habitat_runner::persona::SurvivorPersona;
use tokio::sync::broadcast;

use crate::message::ServerMessage;

/// Capacity of the broadcast channel. Clients that fall further behind
/// skip ahead to the newest frame.
pub const BROADCAST_CAPACITY: usize = 256;

/// Shared state behind every handler.
#[derive(Debug)]
pub struct AppState {
    /// The simulation.
    pub engine: SharedEngine,
    /// Safety filter and intent parser.
    pub interpreter: CommandInterpreter,
    /// The survivor's voice.
    pub persona: SurvivorPersona,
    /// Tick loop controls, when a loop is running.
    pub control: Option<Arc<LoopControl>>,
    tx: broadcast::Sender<ServerMessage>,
}

impl AppState {
    /// Create state with no loop controls attached.
    pub fn new(
        engine: SharedEngine,
        interpreter: CommandInterpreter,
        persona: SurvivorPersona,
    ) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            engine,
            interpreter,
            persona,
            control: None,
            tx,
        }
    }

    /// Attach the controls of the running tick loop.
    #[must_use]
    pub fn with_control(mut self, control: Arc<LoopControl>) -> Self {
        self.control = Some(control);
        self
    }

    /// Subscribe to the broadcast stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }

    /// Publish a frame to all connected clients.
    ///
    /// Returns the number of receivers that got the frame.
    pub fn broadcast(&self, message: &ServerMessage) -> usize {
        // send only fails when nobody is subscribed.
        self.tx.send(message.clone()).unwrap_or(0)
    }

    /// Run one player command through the interlock and the persona.
    pub async fn command(&self, text: &str) -> ServerMessage {
        handle_command(&self.engine, &self.interpreter, &self.persona, text)
            .await
            .into()
    }

    /// The greeting frame for a new client.
    pub async fn greeting(&self) -> ServerMessage {
        let engine = self.engine.lock().await;
        ServerMessage::init(engine.telemetry(), engine.sensory())
    }
}
