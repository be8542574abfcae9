//! Tick callback that streams telemetry to connected clients.

use std::sync::Arc;

use habitat_core::engine::TickReport;
use habitat_core::runner::TickCallback;
use tracing::debug;

use crate::message::ServerMessage;
use crate::state::AppState;

/// Callback that bridges the tick loop to the `WebSocket` broadcast.
#[derive(Debug)]
pub struct BroadcastCallback {
    state: Arc<AppState>,
}

impl BroadcastCallback {
    /// Create a callback publishing through `state`.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl TickCallback for BroadcastCallback {
    fn on_tick(&mut self, report: &TickReport) {
        let receivers = self.state.broadcast(&ServerMessage::from(report));
        debug!(tick = report.tick, receivers, "Telemetry broadcast sent");
    }
}
