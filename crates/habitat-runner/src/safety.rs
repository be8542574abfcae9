//! Command safety filter.
//!
//! Two independent checks guard every player command:
//!
//! - **Keyword scan** runs on the raw text before any model call. A
//!   critical keyword vetoes the command outright; a high-danger keyword is
//!   reported and logged but lets the command through.
//! - **Context rules** run on the parsed [`Intent`] against the telemetry
//!   the command was issued under.
//!
//! Keywords match whole words only, so "heater" never trips "eat".

use habitat_types::{ActionType, Intent, Telemetry};

/// Phrases that veto a command on sight.
pub const CRITICAL_KEYWORDS: [&str; 12] = [
    "explode",
    "detonate",
    "suicide",
    "jump off",
    "burn",
    "fire",
    "short circuit",
    "lick",
    "eat",
    "drink poison",
    "remove helmet",
    "open airlock",
];

/// Phrases that are reported but not vetoed.
pub const HIGH_KEYWORDS: [&str; 6] = ["break", "smash", "destroy", "steal", "attack", "cut wire"];

/// Pressure (kPa) below which the suit must stay on.
pub const SUIT_MIN_PRESSURE_KPA: f64 = 60.0;

/// CO2 (%) above which the helmet must stay on.
pub const HELMET_MAX_CO2_PERCENT: f64 = 1.0;

/// Cabin pressure (kPa) above which an external door must stay shut.
pub const EXTERNAL_DOOR_MAX_PRESSURE_KPA: f64 = 10.0;

/// How dangerous a keyword is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DangerLevel {
    /// Logged, not blocked.
    High,
    /// Blocked.
    Critical,
}

/// A keyword found in player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordMatch {
    /// Severity of the keyword.
    pub level: DangerLevel,
    /// The phrase that matched.
    pub keyword: &'static str,
}

impl KeywordMatch {
    /// Whether this match blocks the command.
    pub const fn is_veto(self) -> bool {
        matches!(self.level, DangerLevel::Critical)
    }

    /// Player-facing reason for a veto.
    pub fn reason(self) -> String {
        format!(
            "CRITICAL SAFETY VIOLATION: Detected fatal keyword: '{}'",
            self.keyword
        )
    }
}

/// Scan raw input for dangerous keywords.
///
/// Critical keywords are checked first; the first hit wins.
pub fn scan_keywords(input: &str) -> Option<KeywordMatch> {
    let words = tokenize(input);
    let find = |list: &[&'static str], level: DangerLevel| {
        list.iter()
            .find(|phrase| contains_phrase(&words, phrase))
            .map(|&keyword| KeywordMatch { level, keyword })
    };
    find(CRITICAL_KEYWORDS.as_slice(), DangerLevel::Critical)
        .or_else(|| find(HIGH_KEYWORDS.as_slice(), DangerLevel::High))
}

/// Check a parsed intent against the current telemetry.
///
/// Returns the veto reason, or `None` if the action is safe here.
pub fn check_context(intent: &Intent, telemetry: &Telemetry) -> Option<&'static str> {
    let target = intent.target.to_lowercase();
    if target.is_empty() {
        return None;
    }
    let kind = intent
        .parameters
        .get("type")
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_default();

    if (target.contains("helmet") || target.contains("suit"))
        && matches!(kind.as_str(), "open" | "remove" | "take off")
    {
        if telemetry.pressure < SUIT_MIN_PRESSURE_KPA {
            return Some("Depressurization risk! Cannot remove suit.");
        }
        if telemetry.co2 > HELMET_MAX_CO2_PERCENT {
            return Some("Toxic atmosphere! Keep helmet on.");
        }
    }

    let interact = intent.action == ActionType::Interact;

    if interact
        && (target.contains("wire") || target.contains("panel"))
        && matches!(kind.as_str(), "cut" | "touch")
    {
        return Some("High voltage detected! Insulated tools required.");
    }

    if interact
        && (target.contains("airlock") || target.contains("door"))
        && kind == "open"
        && target.contains("external")
        && telemetry.pressure > EXTERNAL_DOOR_MAX_PRESSURE_KPA
    {
        return Some("Pressure differential too high to open door.");
    }

    None
}

/// Lowercase alphanumeric words of `text`.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() {
        return false;
    }
    words
        .windows(parts.len())
        .any(|window| window.iter().zip(&parts).all(|(w, p)| w == p))
}
