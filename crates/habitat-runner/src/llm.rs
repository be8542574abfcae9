//! LLM backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for LLM backends, avoiding the
//! dyn-compatibility issues with async trait methods. The OpenAI-compatible
//! backend talks HTTP via `reqwest`; the mock backend answers offline with
//! canned survivor lines so the game is playable without an API key.

use std::time::Duration;

use habitat_core::config::LlmConfig;
use tracing::{info, warn};

use crate::error::RunnerError;
use crate::prompt::RenderedPrompt;

/// Token cap for spoken replies.
const DIALOGUE_MAX_TOKENS: u32 = 150;

/// Token cap for intent classification.
const INTENT_MAX_TOKENS: u32 = 256;

/// What shape of answer the caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// A single JSON object (intent classification).
    Json,
    /// Free text (survivor dialogue).
    Text,
}

/// An LLM backend that can process a prompt and return a response.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
#[derive(Debug, Clone)]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Offline canned responses.
    Mock(MockBackend),
}

impl LlmBackend {
    /// Send a prompt to the LLM and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::LlmBackend`] if the HTTP call fails or the
    /// response cannot be extracted.
    pub async fn complete(
        &self,
        prompt: &RenderedPrompt,
        format: ResponseFormat,
    ) -> Result<String, RunnerError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt, format).await,
            Self::Mock(_) => Ok(MockBackend::reply(prompt, format)),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Mock(_) => "mock",
        }
    }

    /// Whether this backend works without a network.
    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Mock(_))
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self, RunnerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| RunnerError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn request_body(&self, prompt: &RenderedPrompt, format: ResponseFormat) -> serde_json::Value {
        let messages = serde_json::json!([
            {"role": "system", "content": prompt.system},
            {"role": "user", "content": prompt.user}
        ]);
        match format {
            ResponseFormat::Json => serde_json::json!({
                "model": self.model,
                "messages": messages,
                "temperature": 0.0,
                "max_tokens": INTENT_MAX_TOKENS,
                "response_format": {"type": "json_object"}
            }),
            ResponseFormat::Text => serde_json::json!({
                "model": self.model,
                "messages": messages,
                "temperature": self.temperature,
                "max_tokens": DIALOGUE_MAX_TOKENS
            }),
        }
    }

    /// Send a prompt and return the response text.
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        format: ResponseFormat,
    ) -> Result<String, RunnerError> {
        let url = format!("{}/chat/completions", self.api_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt, format))
            .send()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(RunnerError::LlmBackend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_content(&json).map(|text| text.trim().to_owned())
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, RunnerError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            RunnerError::LlmBackend(
                "OpenAI response missing choices[0].message.content".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

/// Reply when nothing in the prompt matches a canned line.
pub const MOCK_FALLBACK: &str =
    "Uh, say again? It's loud in here and I'm freezing. Just tell me what to stick where.";

/// Canned replies keyed on lowercase phrases in the user prompt.
///
/// Checked in order; the first match wins.
const MOCK_REPLIES: [(&str, &str); 13] = [
    (
        "hummmmm",
        "Whoa... hear that? It's humming. Lights are on! You actually know your stuff, boss.",
    ),
    (
        "sparks!",
        "GAH! *Cough* *Cough* IT BIT ME! The panel is smoking! Did you read the manual upside down?!",
    ),
    ("zap!", "Ow! OW! That one bit back. Tell me you meant to do that."),
    (
        "fans spinning up",
        "Ha! Listen to that. Ugly as sin, but the air's moving again. Put duct tape on my resume.",
    ),
    ("both wires in", "That's both of them. Now what, the big switch?"),
    ("all wires set", "That's both of them. Now what, the big switch?"),
    (
        "red to a",
        "Alright, twisting the red one onto the A terminal... Tight. Don't electrocute me.",
    ),
    ("blue into b", "Blue one going to B. This wire feels greasy. Done."),
    (
        "cover off",
        "Got the cover off. Man, it's a rat's nest in here. I see Red, Blue, and a Switch.",
    ),
    (
        "missing:",
        "I've got some of the junk, but it won't hold yet. Need more stuff before I touch that thing.",
    ),
    (
        "heavy-duty duct tape",
        "Found tape and some old hose. Story of my life, man. What now?",
    ),
    (
        "it's square",
        "A square filter for a round hole. Which intern designed this junk?",
    ),
    (
        "gray metal box",
        "I'm freezing here. The box is just staring at me. What do I do?",
    ),
];

/// Offline backend with scripted answers.
///
/// Dialogue requests scan the rendered user prompt for known phrases.
/// Intent requests always answer `{"action": "unknown"}`; the interpreter
/// classifies offline commands with the heuristic parser instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBackend;

impl MockBackend {
    fn reply(prompt: &RenderedPrompt, format: ResponseFormat) -> String {
        match format {
            ResponseFormat::Json => String::from(r#"{"action": "unknown"}"#),
            ResponseFormat::Text => {
                let lower = prompt.user.to_lowercase();
                MOCK_REPLIES
                    .iter()
                    .find(|&&(needle, _)| lower.contains(needle))
                    .map_or(MOCK_FALLBACK, |&(_, reply)| reply)
                    .to_owned()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
///
/// An `openai` backend with no API key falls back to the mock with a
/// warning so the game still starts.
///
/// # Errors
///
/// Returns [`RunnerError::Config`] for an unknown backend name or if the
/// HTTP client cannot be built.
pub fn create_backend(config: &LlmConfig) -> Result<LlmBackend, RunnerError> {
    let backend = match config.backend.as_str() {
        "mock" => LlmBackend::Mock(MockBackend),
        "openai" => match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => LlmBackend::OpenAi(OpenAiBackend::new(config, key)?),
            None => {
                warn!("No LLM API key configured, falling back to the mock backend");
                LlmBackend::Mock(MockBackend)
            }
        },
        other => {
            return Err(RunnerError::Config(format!("unknown LLM backend `{other}`")));
        }
    };
    info!(backend = backend.name(), model = %config.model, "LLM backend ready");
    Ok(backend)
}
