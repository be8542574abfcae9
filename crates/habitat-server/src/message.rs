//! Wire messages exchanged with player clients.
//!
//! Every frame the server sends is a [`ServerMessage`], tagged by a
//! `type` field in `SCREAMING_SNAKE_CASE`:
//!
//! ```json
//! {"type": "TELEMETRY", "telemetry": {...}, "sensory": "..."}
//! {"type": "RESPONSE", "jack_response": "...", "telemetry": {...}}
//! ```
//!
//! Clients send [`ClientMessage`] frames (`{"text": "..."}`).

use habitat_core::command::CommandResponse;
use habitat_core::engine::TickReport;
use habitat_types::Telemetry;
use serde::{Deserialize, Serialize};

/// Greeting sent once per connection.
pub const INIT_MESSAGE: &str = "Connection Established. Telemetry Stream Active.";

/// A frame from the server to a player client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Sent once when a client connects.
    Init {
        /// Greeting text.
        message: String,
        /// Readings at connect time.
        telemetry: Telemetry,
        /// Sensory description at connect time.
        sensory: String,
    },
    /// Pushed after every tick.
    Telemetry {
        /// Tick that produced the readings.
        tick: u64,
        /// Readings after the tick.
        telemetry: Telemetry,
        /// Sensory description after the tick.
        sensory: String,
    },
    /// The survivor answered a command.
    Response {
        /// The survivor's words.
        jack_response: String,
        /// Readings after the command.
        telemetry: Telemetry,
    },
    /// The safety interlock refused a command.
    Intercept {
        /// Interlock message.
        jack_response: String,
        /// Readings when the command was refused.
        telemetry: Telemetry,
    },
    /// A client frame could not be handled.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl ServerMessage {
    /// The greeting frame for a new connection.
    pub fn init(telemetry: Telemetry, sensory: String) -> Self {
        Self::Init {
            message: INIT_MESSAGE.to_owned(),
            telemetry,
            sensory,
        }
    }
}

impl From<&TickReport> for ServerMessage {
    fn from(report: &TickReport) -> Self {
        Self::Telemetry {
            tick: report.tick,
            telemetry: report.telemetry.clone(),
            sensory: report.sensory.clone(),
        }
    }
}

impl From<CommandResponse> for ServerMessage {
    fn from(response: CommandResponse) -> Self {
        match response {
            CommandResponse::Reply {
                text, telemetry, ..
            } => Self::Response {
                jack_response: text,
                telemetry,
            },
            CommandResponse::Intercept {
                text, telemetry, ..
            } => Self::Intercept {
                jack_response: text,
                telemetry,
            },
        }
    }
}

/// A frame from a player client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientMessage {
    /// The player's command.
    pub text: String,
}
