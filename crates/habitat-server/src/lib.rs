//! Player transport for the Mars habitat survival engine.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) streaming telemetry every tick via
//!   [`tokio::sync::broadcast`] and accepting player commands
//! - **REST endpoints** for telemetry, event history, and one-shot
//!   commands
//! - **Operator endpoints** for tick loop speed, status, and stop
//! - **Minimal HTML status page** (`GET /`)
//!
//! The [`startup`] module holds the pieces the `habitat-server` binary
//! wires together: config loading, logging, engine construction, and the
//! background tick loop.

pub mod callback;
pub mod error;
pub mod handlers;
pub mod message;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use message::{ClientMessage, ServerMessage};
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
