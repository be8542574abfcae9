//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/` directory)
//! so the survivor's voice and the intent schema can be tuned without
//! recompiling. Three templates are expected:
//!
//! - `persona.j2` -- system message for dialogue (who the survivor is)
//! - `situation.j2` -- user message for dialogue (what just happened)
//! - `intent.j2` -- user message asking the model to classify a command

use habitat_core::command::{CommandContext, DialoguePrompt};
use minijinja::Environment;

use crate::error::RunnerError;

/// System message sent with every intent request.
pub const INTENT_SYSTEM_PROMPT: &str =
    "You are a JSON parser for a Mars survival game. Reply with one JSON object and nothing else.";

const TEMPLATE_NAMES: [&str; 3] = ["persona", "situation", "intent"];

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System message.
    pub system: String,
    /// User message.
    pub user: String,
}

/// How stressed the survivor is, in the bands the persona reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressBand {
    /// 0-30 %.
    Low,
    /// 31-70 %.
    Medium,
    /// Above 70 %.
    High,
}

impl StressBand {
    /// Band for a stress percentage.
    pub const fn from_percent(stress: f64) -> Self {
        if stress > 70.0 {
            Self::High
        } else if stress > 30.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Template-facing name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Manages prompt template loading and rendering.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Create a new prompt engine loading templates from the given directory.
    ///
    /// The directory must contain `persona.j2`, `situation.j2` and
    /// `intent.j2`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Template`] if a file is missing or does not
    /// compile.
    pub fn new(templates_dir: &str) -> Result<Self, RunnerError> {
        let mut env = Environment::new();
        for name in TEMPLATE_NAMES {
            let source = load_template(templates_dir, &format!("{name}.j2"))?;
            env.add_template_owned(name, source)
                .map_err(|e| RunnerError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Create a prompt engine from in-memory template sources.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Template`] if a source does not compile.
    pub fn from_sources(persona: &str, situation: &str, intent: &str) -> Result<Self, RunnerError> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATE_NAMES.into_iter().zip([persona, situation, intent]) {
            env.add_template_owned(name, source.to_owned())
                .map_err(|e| RunnerError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Render the dialogue prompt for one survivor reply.
    ///
    /// Both templates see the [`DialoguePrompt`] fields plus `stress_band`
    /// (`low`, `medium` or `high`).
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Template`] if rendering fails.
    pub fn render_dialogue(&self, prompt: &DialoguePrompt) -> Result<RenderedPrompt, RunnerError> {
        let mut ctx = serde_json::to_value(prompt)?;
        if let Some(map) = ctx.as_object_mut() {
            let band = StressBand::from_percent(prompt.telemetry.stress);
            map.insert("stress_band".to_owned(), band.as_str().into());
        }
        Ok(RenderedPrompt {
            system: self.render("persona", &ctx)?,
            user: self.render("situation", &ctx)?,
        })
    }

    /// Render the intent-classification prompt for a player command.
    ///
    /// The template sees `input` and `context` ([`CommandContext`]).
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Template`] if rendering fails.
    pub fn render_intent(
        &self,
        input: &str,
        context: &CommandContext,
    ) -> Result<RenderedPrompt, RunnerError> {
        let ctx = serde_json::json!({
            "input": input,
            "context": context,
        });
        Ok(RenderedPrompt {
            system: INTENT_SYSTEM_PROMPT.to_owned(),
            user: self.render("intent", &ctx)?,
        })
    }

    fn render(&self, name: &str, ctx: &serde_json::Value) -> Result<String, RunnerError> {
        self.env
            .get_template(name)
            .map_err(|e| RunnerError::Template(format!("missing {name} template: {e}")))?
            .render(ctx)
            .map_err(|e| RunnerError::Template(format!("{name} render failed: {e}")))
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, RunnerError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| RunnerError::Template(format!("failed to read {path}: {e}")))
}
