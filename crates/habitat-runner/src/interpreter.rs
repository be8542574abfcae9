//! The command interpreter: safety filter plus intent parsing.
//!
//! Every player command passes three levels:
//!
//! 1. keyword scan on the raw text (critical keywords veto immediately)
//! 2. classification into an [`Intent`] (LLM, or the heuristic parser when
//!    the backend is offline)
//! 3. context rules on the parsed intent against the command's telemetry
//!
//! Backend and parse failures never surface: they classify as
//! [`Intent::unknown`], which the engine ignores.

use std::sync::Arc;

use habitat_core::command::{CommandContext, IntentAnalysis, IntentSource};
use habitat_types::Intent;
use tracing::{debug, info, warn};

use crate::llm::{LlmBackend, ResponseFormat};
use crate::parse::{heuristic_intent, parse_intent_response};
use crate::prompt::PromptEngine;
use crate::safety::{check_context, scan_keywords};

/// Intent source backed by the safety filter and an LLM.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    backend: Arc<LlmBackend>,
    prompts: Arc<PromptEngine>,
}

impl CommandInterpreter {
    /// Create an interpreter over a shared backend and prompt set.
    pub const fn new(backend: Arc<LlmBackend>, prompts: Arc<PromptEngine>) -> Self {
        Self { backend, prompts }
    }

    /// Level 2: turn text into an intent.
    async fn classify(&self, input: &str, context: &CommandContext) -> Intent {
        if self.backend.is_offline() {
            return heuristic_intent(input);
        }

        let prompt = match self.prompts.render_intent(input, context) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Intent prompt render failed");
                return Intent::unknown();
            }
        };

        match self.backend.complete(&prompt, ResponseFormat::Json).await {
            Ok(raw) => parse_intent_response(&raw),
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "Intent classification failed"
                );
                Intent::unknown()
            }
        }
    }
}

impl IntentSource for CommandInterpreter {
    async fn analyze(&self, input: &str, context: &CommandContext) -> IntentAnalysis {
        if let Some(hit) = scan_keywords(input) {
            if hit.is_veto() {
                info!(keyword = hit.keyword, "Critical keyword in command");
                return IntentAnalysis::Vetoed {
                    reason: hit.reason(),
                };
            }
            warn!(keyword = hit.keyword, "High-danger keyword in command, allowing");
        }

        let intent = self.classify(input, context).await;

        if let Some(reason) = check_context(&intent, &context.telemetry) {
            info!(
                action = %intent.action,
                target = %intent.target,
                reason,
                "Command unsafe in current conditions"
            );
            return IntentAnalysis::Vetoed {
                reason: reason.to_owned(),
            };
        }

        debug!(action = %intent.action, target = %intent.target, "Command classified");
        IntentAnalysis::Safe(intent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use habitat_core::config::LlmConfig;
    use habitat_types::{ActionType, HabitatState, Telemetry};

    use super::*;
    use crate::llm::{MockBackend, OpenAiBackend};

    fn prompts() -> Arc<PromptEngine> {
        Arc::new(PromptEngine::from_sources("p", "s", "Classify: {{ input }}").unwrap())
    }

    fn offline() -> CommandInterpreter {
        CommandInterpreter::new(Arc::new(LlmBackend::Mock(MockBackend)), prompts())
    }

    fn context(co2: f64) -> CommandContext {
        let mut telemetry = Telemetry::from_state(&HabitatState::default());
        telemetry.co2 = co2;
        CommandContext {
            telemetry,
            sensory: String::new(),
            location: String::from("hab_module"),
            scenario: Some(String::from("co2_crisis")),
        }
    }

    #[tokio::test]
    async fn critical_keyword_vetoes_before_parsing() {
        let analysis = offline().analyze("open airlock", &context(0.04)).await;
        assert!(matches!(
            &analysis,
            IntentAnalysis::Vetoed { reason } if reason.contains("'open airlock'")
        ));
    }

    #[tokio::test]
    async fn offline_commands_use_the_heuristic_parser() {
        let analysis = offline().analyze("search the shelf", &context(0.04)).await;
        assert_eq!(
            analysis,
            IntentAnalysis::Safe(Intent::new(ActionType::Examine, "shelf"))
        );
    }

    #[tokio::test]
    async fn context_rules_veto_parsed_intents() {
        let analysis = offline().analyze("touch the red wire", &context(0.04)).await;
        assert_eq!(
            analysis,
            IntentAnalysis::Vetoed {
                reason: String::from("High voltage detected! Insulated tools required.")
            }
        );

        let analysis = offline().analyze("remove your helmet", &context(2.5)).await;
        assert_eq!(
            analysis,
            IntentAnalysis::Vetoed {
                reason: String::from("Toxic atmosphere! Keep helmet on.")
            }
        );
    }

    #[tokio::test]
    async fn high_keywords_pass_through() {
        let analysis = offline().analyze("smash the locker", &context(0.04)).await;
        assert!(matches!(analysis, IntentAnalysis::Safe(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_classifies_as_unknown() {
        let config = LlmConfig {
            base_url: String::from("http://127.0.0.1:9/v1"),
            request_timeout_ms: 500,
            ..LlmConfig::default()
        };
        let backend = LlmBackend::OpenAi(OpenAiBackend::new(&config, "key").unwrap());
        let interpreter = CommandInterpreter::new(Arc::new(backend), prompts());

        let analysis = interpreter.analyze("search the shelf", &context(0.04)).await;
        assert_eq!(analysis, IntentAnalysis::Safe(Intent::unknown()));
    }
}
