//! Startup helpers for the server binary.
//!
//! Loading configuration, initializing logging, wiring the engine to the
//! command path, and spawning the tick loop live here so the binary's
//! `main` stays a short sequence of steps.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use habitat_core::config::{ConfigError, HabitatConfig, LoggingConfig};
use habitat_core::engine::Engine;
use habitat_core::runner::{LoopControl, LoopResult, log_loop_end, run_tick_loop};
use habitat_core::scenario::ScenarioError;
use habitat_runner::error::RunnerError;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::callback::BroadcastCallback;
use crate::server::ServerError;
use crate::state::AppState;

/// Config file read when `HABITAT_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "habitat-config.yaml";

/// Errors that can stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The configured scenario could not be loaded.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: ScenarioError,
    },

    /// The LLM backend or prompt templates could not be set up.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: RunnerError,
    },

    /// The HTTP server failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}

/// Path of the config file: `HABITAT_CONFIG` if set, else
/// [`DEFAULT_CONFIG_PATH`].
pub fn config_path() -> PathBuf {
    std::env::var_os("HABITAT_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration, falling back to defaults when the file is missing.
///
/// Environment overrides for the LLM backend apply either way.
pub fn load_config(path: &Path) -> Result<HabitatConfig, StartupError> {
    if path.exists() {
        Ok(HabitatConfig::from_file(path)?)
    } else {
        let mut config = HabitatConfig::default();
        config.llm.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Build the engine, load the configured scenario, and wire the command
/// path into shared server state.
///
/// Returns the state together with the loop controls it carries.
pub fn build_state(config: &HabitatConfig) -> Result<(Arc<AppState>, Arc<LoopControl>), StartupError> {
    let mut engine = Engine::new();
    engine.load_scenario(&config.simulation.scenario)?;
    info!(scenario = config.simulation.scenario, "Scenario loaded");

    let (interpreter, persona) = habitat_runner::build_from_config(&config.llm)?;

    let control = Arc::new(LoopControl::from_config(&config.simulation));
    let state = AppState::new(engine.into_shared(), interpreter, persona)
        .with_control(Arc::clone(&control));

    Ok((Arc::new(state), control))
}

/// Run the tick loop on a background task, broadcasting each tick.
pub fn spawn_tick_loop(state: Arc<AppState>, control: Arc<LoopControl>) -> JoinHandle<LoopResult> {
    tokio::spawn(async move {
        let engine = Arc::clone(&state.engine);
        let mut callback = BroadcastCallback::new(state);
        let result = run_tick_loop(&engine, &control, &mut callback).await;
        log_loop_end(&result);
        result
    })
}

/// Resolve on `Ctrl-C`.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use habitat_core::config::LlmConfig;

    use super::*;

    fn test_config() -> HabitatConfig {
        HabitatConfig {
            llm: LlmConfig {
                templates_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates").to_owned(),
                ..LlmConfig::default()
            },
            ..HabitatConfig::default()
        }
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/habitat-config.yaml")).unwrap();
        assert_eq!(config.simulation, HabitatConfig::default().simulation);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn config_file_is_parsed() {
        let path = std::env::temp_dir().join(format!(
            "habitat_startup_config_{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "server:\n  port: 9123\nsimulation:\n  scenario: power_box\n")
            .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 9123);
        assert_eq!(config.simulation.scenario, "power_box");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unknown_scenario_fails_startup() {
        let mut config = test_config();
        config.simulation.scenario = String::from("meteor_shower");
        assert!(matches!(
            build_state(&config),
            Err(StartupError::Scenario { .. })
        ));
    }

    #[tokio::test]
    async fn tick_loop_broadcasts_and_stops() {
        let mut config = test_config();
        config.simulation.tick_interval_ms = 0;
        config.simulation.max_ticks = 3;
        let (state, control) = build_state(&config).unwrap();
        let mut rx = state.subscribe();

        let result = spawn_tick_loop(Arc::clone(&state), control).await.unwrap();
        assert_eq!(result.total_ticks, 3);

        let mut ticks = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let crate::message::ServerMessage::Telemetry { tick, .. } = message {
                ticks.push(tick);
            }
        }
        assert_eq!(ticks, vec![1, 2, 3]);
    }
}
