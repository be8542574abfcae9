//! The survivor's voice.
//!
//! [`SurvivorPersona`] renders the persona and situation templates and asks
//! the backend for a reply. Failures become an in-world radio error so the
//! player always gets a line back.

use std::sync::Arc;

use habitat_core::command::{DialoguePrompt, DialogueSource};
use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::llm::{LlmBackend, ResponseFormat};
use crate::prompt::PromptEngine;

/// Marker the persona template asks the model to put before its spoken line.
pub const RESPONSE_MARKER: &str = "[RESPONSE]";

/// Dialogue source that voices the stranded survivor.
#[derive(Debug, Clone)]
pub struct SurvivorPersona {
    backend: Arc<LlmBackend>,
    prompts: Arc<PromptEngine>,
}

impl SurvivorPersona {
    /// Create a persona over a shared backend and prompt set.
    pub const fn new(backend: Arc<LlmBackend>, prompts: Arc<PromptEngine>) -> Self {
        Self { backend, prompts }
    }

    async fn try_speak(&self, prompt: &DialoguePrompt) -> Result<String, RunnerError> {
        let rendered = self.prompts.render_dialogue(prompt)?;
        let raw = self.backend.complete(&rendered, ResponseFormat::Text).await?;
        Ok(spoken_part(&raw).to_owned())
    }
}

impl DialogueSource for SurvivorPersona {
    async fn speak(&self, prompt: &DialoguePrompt) -> String {
        match self.try_speak(prompt).await {
            Ok(text) => {
                debug!(backend = self.backend.name(), chars = text.len(), "Survivor replied");
                text
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "Survivor reply failed");
                format!("[COMM ERROR]: Signal interference. ({e})")
            }
        }
    }
}

/// The part of a model reply meant for the player.
///
/// Anything before the last [`RESPONSE_MARKER`] is private reasoning and is
/// dropped.
pub fn spoken_part(raw: &str) -> &str {
    raw.rsplit_once(RESPONSE_MARKER)
        .map_or(raw, |(_, spoken)| spoken)
        .trim()
}
