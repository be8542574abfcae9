//! Error types for the interpretation layer.
//!
//! Uses `thiserror` for typed errors that surface inside the runner:
//! backend setup, LLM calls, prompt rendering, response parsing. None of
//! them cross into the engine; the interpreter and the persona map every
//! failure to a safe fallback before returning.

/// Errors that can occur while interpreting commands or voicing replies.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The LLM response could not be parsed into an intent.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Backend configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
