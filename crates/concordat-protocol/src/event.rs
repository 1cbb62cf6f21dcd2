//! World events: the immutable narrative log and the wire shape the
//! generation backend is expected to produce.
//!
//! Generated content is untrusted. The `GeneratedEvent` deserializers are
//! deliberately lenient: unknown enum strings fall back to defaults and
//! missing fields are filled in, so one sloppy field never discards a whole
//! turn's worth of events.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{GameDate, NationCode};

/// Narrative category of a generated event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Political,
    Military,
    Economic,
    Diplomatic,
    Social,
}

impl EventType {
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "military" => EventType::Military,
            "economic" => EventType::Economic,
            "diplomatic" => EventType::Diplomatic,
            "social" => EventType::Social,
            _ => EventType::Political,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Political => "political",
            EventType::Military => "military",
            EventType::Economic => "economic",
            EventType::Diplomatic => "diplomatic",
            EventType::Social => "social",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much an event matters. Ordering follows impact, so severities can be
/// compared and sorted directly.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    #[default]
    Moderate,
    Major,
    Critical,
}

impl Severity {
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Severity::Minor,
            "major" => Severity::Major,
            "critical" => Severity::Critical,
            _ => Severity::Moderate,
        }
    }

    pub fn is_important(&self) -> bool {
        matches!(self, Severity::Major | Severity::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mechanical deltas an event applies to one nation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub war_support: Option<f64>,
    /// Treasury delta. Generated numbers are occasionally fractional, so the
    /// wire type is `f64`; application rounds to whole currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treasury: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupied_regions: Option<Vec<String>>,
}

/// One event exactly as the generation backend describes it, before the
/// turn engine stamps identity and dates onto it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GeneratedEvent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_event_type")]
    pub event_type: EventType,
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub affected_nations: Vec<NationCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_changes: Option<BTreeMap<NationCode, StateChange>>,
}

/// The full turn-generation response contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TurnGeneration {
    #[serde(default)]
    pub events: Vec<GeneratedEvent>,
    #[serde(default)]
    pub global_tension_delta: f64,
}

/// An event as persisted in the save's append-only log. Immutable once
/// created; never deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub severity: Severity,
    pub affected_nations: Vec<NationCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_changes: Option<BTreeMap<NationCode, StateChange>>,
    pub game_date: GameDate,
    pub turn_number: u32,
    pub created_at: DateTime<Utc>,
}

impl WorldEvent {
    /// Stamp a generated event with identity, date, and turn.
    pub fn from_generated(
        generated: GeneratedEvent,
        id: String,
        game_date: GameDate,
        turn_number: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: generated.title,
            description: generated.description,
            event_type: generated.event_type,
            severity: generated.severity,
            affected_nations: generated.affected_nations,
            state_changes: generated.state_changes,
            game_date,
            turn_number,
            created_at,
        }
    }
}

fn lenient_event_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EventType, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(EventType::parse_lenient(&raw))
}

fn lenient_severity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Severity, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(Severity::parse_lenient(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_impact() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Moderate);
        assert!(Severity::Moderate > Severity::Minor);
        assert!(Severity::Critical.is_important());
        assert!(!Severity::Minor.is_important());
    }

    #[test]
    fn generated_event_tolerates_unknown_enum_strings() {
        let json = r#"{
            "title": "Border Incident",
            "description": "Shots exchanged at the frontier.",
            "event_type": "catastrophic-vibes",
            "severity": "apocalyptic",
            "affected_nations": ["ITA", "ETH"]
        }"#;
        let event: GeneratedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, EventType::Political);
        assert_eq!(event.severity, Severity::Moderate);
        assert_eq!(event.affected_nations.len(), 2);
    }

    #[test]
    fn generated_event_fills_missing_fields() {
        let event: GeneratedEvent = serde_json::from_str(r#"{"title": "Quiet Week"}"#).unwrap();
        assert_eq!(event.severity, Severity::Moderate);
        assert!(event.affected_nations.is_empty());
        assert!(event.state_changes.is_none());
    }

    #[test]
    fn turn_generation_defaults_to_empty() {
        let parsed: TurnGeneration = serde_json::from_str("{}").unwrap();
        assert!(parsed.events.is_empty());
        assert_eq!(parsed.global_tension_delta, 0.0);
    }
}
