//! Configuration loading and typed config structures for the habitat engine.
//!
//! The canonical configuration lives in `habitat-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and a loader that reads, overrides and validates the file.
//! Every field has a default, so an empty file is a valid configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `habitat-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HabitatConfig {
    /// Tick timing and scenario selection.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Player transport server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Language-model backend for intent parsing and dialogue.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl HabitatConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the LLM backend:
    /// - `HABITAT_LLM_API_KEY` (or `OPENAI_API_KEY`) overrides `llm.api_key`
    /// - `OPENAI_BASE_URL` overrides `llm.base_url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.llm.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// No environment overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml rejects an empty document, but an empty file is valid here.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dt = self.simulation.dt_seconds;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "simulation.dt_seconds",
                reason: format!("must be a positive number, got {dt}"),
            });
        }
        if self.simulation.scenario.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "simulation.scenario",
                reason: String::from("must not be empty"),
            });
        }
        if !matches!(self.llm.backend.as_str(), "mock" | "openai") {
            return Err(ConfigError::Invalid {
                field: "llm.backend",
                reason: format!("expected `mock` or `openai`, got `{}`", self.llm.backend),
            });
        }
        Ok(())
    }
}

/// Tick timing and scenario selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated seconds advanced per tick.
    #[serde(default = "default_dt_seconds")]
    pub dt_seconds: f64,

    /// Stop after this many ticks (0 = run until stopped or game over).
    #[serde(default)]
    pub max_ticks: u64,

    /// Scenario loaded at startup.
    #[serde(default = "default_scenario")]
    pub scenario: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            dt_seconds: default_dt_seconds(),
            max_ticks: 0,
            scenario: default_scenario(),
        }
    }
}

/// Player transport server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Language-model backend configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LlmConfig {
    /// Backend name: `mock` (offline) or `openai` (any compatible API).
    #[serde(default = "default_llm_backend")]
    pub backend: String,

    /// Model identifier sent to the API.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Base URL of the chat-completions API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// API key. Usually supplied through the environment.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Sampling temperature for dialogue.
    #[serde(default = "default_llm_temperature")]
    pub temperature: f64,

    /// Directory holding the prompt templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
}

impl LlmConfig {
    /// Override backend credentials with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HABITAT_LLM_API_KEY") {
            self.api_key = Some(val);
        } else if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.base_url = val;
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_llm_backend(),
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
            temperature: default_llm_temperature(),
            templates_dir: default_templates_dir(),
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_dt_seconds() -> f64 {
    1.0
}

fn default_scenario() -> String {
    String::from("co2_crisis")
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_llm_backend() -> String {
    String::from("mock")
}

fn default_llm_model() -> String {
    String::from("gpt-4o-mini")
}

fn default_llm_base_url() -> String {
    String::from("https://api.openai.com/v1")
}

const fn default_request_timeout_ms() -> u64 {
    15_000
}

const fn default_llm_temperature() -> f64 {
    0.7
}

fn default_templates_dir() -> String {
    String::from("templates")
}
