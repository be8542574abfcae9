//! Turning model output and raw player text into [`Intent`]s.
//!
//! The LLM returns raw text (ideally JSON). [`parse_intent_response`]
//! extracts and validates it; malformed responses degrade to
//! [`Intent::unknown`], which the engine treats as a no-op.
//!
//! [`heuristic_intent`] is the offline counterpart used by the mock
//! backend: a verb table and whatever follows it as the target.

use std::collections::BTreeMap;

use habitat_types::{ActionType, Intent};
use tracing::warn;

use crate::error::RunnerError;
use crate::safety::tokenize;

/// Intermediate struct for deserializing the LLM's raw JSON response.
#[derive(Debug, serde::Deserialize)]
struct RawIntent {
    action: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    parameters: serde_json::Value,
}

/// Parse an LLM response string into an [`Intent`].
///
/// Attempts multiple recovery strategies if the raw text is not clean JSON:
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from markdown code blocks
/// 3. Strip trailing commas and retry
///
/// If all attempts fail, returns [`Intent::unknown`] with a warning log.
pub fn parse_intent_response(raw: &str) -> Intent {
    match try_parse(raw) {
        Ok(intent) => intent,
        Err(e) => {
            warn!(
                error = %e,
                raw_response = raw,
                "failed to parse LLM response, returning unknown intent"
            );
            Intent::unknown()
        }
    }
}

/// Attempt to parse the response through multiple recovery strategies.
fn try_parse(raw: &str) -> Result<Intent, RunnerError> {
    let trimmed = raw.trim();

    if let Ok(parsed) = serde_json::from_str::<RawIntent>(trimmed) {
        return Ok(convert_raw_intent(parsed));
    }

    let fenced = extract_json_from_codeblock(trimmed);
    if let Some(json_str) = fenced
        && let Ok(parsed) = serde_json::from_str::<RawIntent>(json_str)
    {
        return Ok(convert_raw_intent(parsed));
    }

    let cleaned = strip_trailing_commas(fenced.unwrap_or(trimmed));
    if let Ok(parsed) = serde_json::from_str::<RawIntent>(&cleaned) {
        return Ok(convert_raw_intent(parsed));
    }

    Err(RunnerError::Parse(format!(
        "all parse strategies failed for: {trimmed}"
    )))
}

fn convert_raw_intent(raw: RawIntent) -> Intent {
    Intent {
        action: parse_action(&raw.action),
        target: raw.target.unwrap_or_default().trim().to_owned(),
        parameters: flatten_parameters(&raw.parameters),
    }
}

/// Map an action name (or a common synonym) onto [`ActionType`].
///
/// Unrecognized names become [`ActionType::Unknown`].
pub fn parse_action(name: &str) -> ActionType {
    let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
    action_alias(&normalized).unwrap_or(ActionType::Unknown)
}

/// Look up a single lowercase word in the verb table.
fn action_alias(word: &str) -> Option<ActionType> {
    let action = match word {
        "move" | "go" | "walk" | "run" | "head" | "enter" | "climb" => ActionType::Move,
        "interact" | "open" | "close" | "press" | "push" | "pull" | "flip" | "toggle"
        | "connect" | "plug" | "insert" | "attach" | "put" | "jam" | "twist" | "turn"
        | "touch" | "cut" | "remove" | "unscrew" | "pry" => ActionType::Interact,
        "use_item" | "use" | "combine" | "fix" | "repair" | "tape" | "seal" | "apply"
        | "install" => ActionType::UseItem,
        "examine" | "search" | "look" | "inspect" | "check" | "find" | "read" | "rummage"
        | "scan" => ActionType::Examine,
        "communicate" | "say" | "tell" | "talk" | "ask" | "radio" | "report" => {
            ActionType::Communicate
        }
        "wait" | "rest" | "hold" | "sleep" => ActionType::Wait,
        "cancel" | "stop" | "abort" | "nevermind" => ActionType::Cancel,
        "unknown" => ActionType::Unknown,
        _ => return None,
    };
    Some(action)
}

/// Flatten a JSON parameter object into string values.
///
/// Non-object input yields no parameters; `null` values are dropped.
fn flatten_parameters(value: &serde_json::Value) -> BTreeMap<String, String> {
    let Some(map) = value.as_object() else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(key, v)| {
            let text = match v {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = text.get(open.checked_add(3)?..)?;
    // Skip the rest of the fence line (`json`, or nothing).
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1))?;
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// Strip trailing commas before closing braces and brackets (common LLM error).
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if c == ',' {
            let rest = text.get(i.saturating_add(1)..).unwrap_or_default().trim_start();
            if rest.starts_with('}') || rest.starts_with(']') {
                continue;
            }
        }
        result.push(c);
    }
    result
}

/// Filler words dropped from heuristic targets.
const FILLER: [&str; 6] = ["please", "the", "jack", "can", "you", "now"];

/// Classify raw player text without a model.
///
/// The first word found in the verb table sets the action; the remaining
/// words (minus filler) form the target. Interaction verbs are also
/// recorded as the `type` parameter so context safety rules can see them.
/// Text with no known verb is [`Intent::unknown`].
pub fn heuristic_intent(input: &str) -> Intent {
    let words = tokenize(input);
    let Some((index, action)) = words
        .iter()
        .enumerate()
        .find_map(|(i, w)| action_alias(w).map(|a| (i, a)))
    else {
        return Intent::unknown();
    };

    let target = words
        .iter()
        .enumerate()
        .filter(|&(i, w)| i != index && !FILLER.contains(&w.as_str()))
        .map(|(_, w)| w.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut intent = Intent::new(action, target);
    if action == ActionType::Interact
        && let Some(verb) = words.get(index)
    {
        intent = intent.with_parameter("type", verb.as_str());
    }
    intent
}
