//! Recovery pipeline for turn-generation responses.
//!
//! Generation backends return free-form text that is supposed to be JSON and
//! frequently almost is: wrapped in markdown fences, or carrying a leading
//! `+` on positive numbers, or surrounded by prose. This pipeline repairs
//! the known defects, then falls back to extracting the outermost
//! `{...}` region, and as a last resort degrades to an empty event list.
//! It never returns an error to the turn engine.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use concordat_protocol::TurnGeneration;

/// Outcome of parsing a turn-generation response.
#[derive(Clone, Debug)]
pub enum TurnOutcome {
    /// The response parsed into a usable structure.
    Parsed(TurnGeneration),
    /// Nothing usable could be recovered; the turn proceeds with no events.
    Degraded { error: String },
}

impl TurnOutcome {
    /// The generation to apply: real content or the empty fallback.
    pub fn into_generation(self) -> TurnGeneration {
        match self {
            TurnOutcome::Parsed(generation) => generation,
            TurnOutcome::Degraded { .. } => TurnGeneration::default(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TurnOutcome::Degraded { .. })
    }
}

/// Strip a markdown code fence, keeping only the fenced body. Text without
/// fences passes through untouched.
fn strip_code_fences(response: &str) -> &str {
    let body = if let Some(after) = response.split_once("```json") {
        after.1
    } else if let Some(after) = response.split_once("```") {
        after.1
    } else {
        return response.trim();
    };
    match body.split_once("```") {
        Some((inner, _)) => inner.trim(),
        None => body.trim(),
    }
}

/// Rewrite `: +5` to `: 5`, a common generation defect that strict JSON
/// rejects.
fn fix_signed_numbers(content: &str) -> String {
    static PLUS_NUMBER: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PLUS_NUMBER.get_or_init(|| Regex::new(r":\s*\+(\d+(\.\d*)?)").expect("static regex"));
    pattern.replace_all(content, ": $1").into_owned()
}

/// Greedy outermost-object extraction: first `{` through last `}`.
fn extract_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Run the full recovery pipeline over a raw response.
pub fn parse_turn_generation(raw: &str) -> TurnOutcome {
    let content = fix_signed_numbers(strip_code_fences(raw));

    match serde_json::from_str::<TurnGeneration>(&content) {
        Ok(generation) => return TurnOutcome::Parsed(generation),
        Err(strict_err) => {
            if let Some(object) = extract_object(&content) {
                if let Ok(generation) = serde_json::from_str::<TurnGeneration>(object) {
                    return TurnOutcome::Parsed(generation);
                }
            }
            warn!(%strict_err, "turn generation response unparsable, degrading to empty events");
            TurnOutcome::Degraded {
                error: strict_err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concordat_protocol::Severity;

    const WELL_FORMED: &str = r#"{
        "events": [{
            "title": "Mobilization Decree",
            "description": "Reserves called up along the eastern frontier.",
            "event_type": "military",
            "severity": "major",
            "affected_nations": ["GER"],
            "state_changes": {"GER": {"war_support": 10, "treasury": -200}}
        }],
        "global_tension_delta": 5
    }"#;

    #[test]
    fn strict_json_parses() {
        let outcome = parse_turn_generation(WELL_FORMED);
        let generation = outcome.into_generation();
        assert_eq!(generation.events.len(), 1);
        assert_eq!(generation.events[0].severity, Severity::Major);
        assert_eq!(generation.global_tension_delta, 5.0);
    }

    #[test]
    fn markdown_fences_are_stripped() {
        let fenced = format!("```json\n{WELL_FORMED}\n```");
        let outcome = parse_turn_generation(&fenced);
        assert!(!outcome.is_degraded());

        let bare_fence = format!("```\n{WELL_FORMED}\n```");
        assert!(!parse_turn_generation(&bare_fence).is_degraded());
    }

    #[test]
    fn leading_plus_signs_are_repaired() {
        let raw = r#"{"events": [{"title": "Boom", "state_changes": {"ITA": {"stability": +5, "treasury": +2.5}}}], "global_tension_delta": +3}"#;
        let generation = parse_turn_generation(raw).into_generation();
        assert_eq!(generation.events.len(), 1);
        assert_eq!(generation.global_tension_delta, 3.0);
        let changes = generation.events[0].state_changes.as_ref().unwrap();
        assert_eq!(changes["ITA"].stability, Some(5.0));
        assert_eq!(changes["ITA"].treasury, Some(2.5));
    }

    #[test]
    fn surrounding_prose_falls_back_to_object_extraction() {
        let raw = format!("Here is the turn result you asked for:\n{WELL_FORMED}\nEnjoy!");
        let outcome = parse_turn_generation(&raw);
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.into_generation().events.len(), 1);
    }

    #[test]
    fn garbage_degrades_to_empty_events() {
        let outcome = parse_turn_generation("I'm sorry, I cannot produce JSON today.");
        assert!(outcome.is_degraded());
        assert!(outcome.into_generation().events.is_empty());
    }

    #[test]
    fn truncated_json_degrades() {
        let outcome = parse_turn_generation(r#"{"events": [{"title": "Cut off"#);
        assert!(outcome.is_degraded());
    }
}
