//! Server binary for the Mars habitat survival engine.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `HABITAT_CONFIG` or `habitat-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine, load the scenario, and set up the LLM backend
//! 4. Spawn the tick loop
//! 5. Serve HTTP and `WebSocket` until `Ctrl-C`
//! 6. Stop the tick loop and log the result

use std::sync::Arc;

use habitat_server::startup::{
    build_state, config_path, init_tracing, load_config, shutdown_signal, spawn_tick_loop,
};
use habitat_server::start_server;
use tracing::{info, warn};

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, scenario loading, backend setup,
/// or the server itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let path = config_path();
    let config = load_config(&path)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        path = %path.display(),
        scenario = config.simulation.scenario,
        tick_interval_ms = config.simulation.tick_interval_ms,
        dt_seconds = config.simulation.dt_seconds,
        llm_backend = config.llm.backend,
        "Configuration loaded"
    );

    // 3. Engine, scenario, and command path.
    let (state, control) = build_state(&config)?;

    // 4. Tick loop.
    let tick_loop = spawn_tick_loop(Arc::clone(&state), Arc::clone(&control));

    // 5. Serve until Ctrl-C.
    let served = start_server(&config.server, state, shutdown_signal()).await;

    // 6. Stop the loop whether or not the server exited cleanly.
    control.request_stop();
    if let Err(e) = tick_loop.await {
        warn!(error = %e, "Tick loop task failed");
    }

    served?;
    info!("habitat-server exiting");
    Ok(())
}
