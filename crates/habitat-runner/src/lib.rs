//! Interpretation layer for the Mars habitat survival engine.
//!
//! Sits between the player and the engine. Free text goes through a safety
//! filter and an intent parser before the engine sees it; the engine's
//! outcome comes back through the survivor persona as spoken text.
//!
//! # Modules
//!
//! - [`safety`] -- Keyword scan and contextual safety rules.
//! - [`parse`] -- LLM JSON and offline heuristics into [`Intent`]s.
//! - [`llm`] -- OpenAI-compatible and mock backends.
//! - [`prompt`] -- `minijinja` templates for dialogue and intent prompts.
//! - [`interpreter`] -- [`CommandInterpreter`], the engine's intent source.
//! - [`persona`] -- [`SurvivorPersona`], the engine's dialogue source.
//!
//! [`Intent`]: habitat_types::Intent
//! [`CommandInterpreter`]: interpreter::CommandInterpreter
//! [`SurvivorPersona`]: persona::SurvivorPersona

use std::sync::Arc;

use habitat_core::config::LlmConfig;

pub mod error;
pub mod interpreter;
pub mod llm;
pub mod parse;
pub mod persona;
pub mod prompt;
pub mod safety;

use crate::error::RunnerError;
use crate::interpreter::CommandInterpreter;
use crate::persona::SurvivorPersona;
use crate::prompt::PromptEngine;

/// Build the interpreter and persona from configuration.
///
/// Both share one backend and one set of loaded templates.
///
/// # Errors
///
/// Returns [`RunnerError::Config`] for a bad backend setting, or
/// [`RunnerError::Template`] if the templates cannot be loaded.
pub fn build_from_config(
    config: &LlmConfig,
) -> Result<(CommandInterpreter, SurvivorPersona), RunnerError> {
    let backend = Arc::new(llm::create_backend(config)?);
    let prompts = Arc::new(PromptEngine::new(&config.templates_dir)?);
    Ok((
        CommandInterpreter::new(Arc::clone(&backend), Arc::clone(&prompts)),
        SurvivorPersona::new(backend, prompts),
    ))
}
