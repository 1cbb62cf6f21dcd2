//! The persisted save document: one complete, independent playthrough.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::chat::DiplomaticChat;
use crate::event::WorldEvent;
use crate::nation::NationState;
use crate::types::{GameDate, NationCode};
use crate::unit::Unit;

/// Root aggregate for a playthrough. Owns every sub-collection; there is no
/// cross-save referencing. Persisted as one JSON document and always written
/// whole (load, mutate in memory, write back).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Save {
    pub id: String,
    pub name: String,
    pub player_nation_code: NationCode,
    pub current_date: GameDate,
    pub turn_number: u32,
    pub created_at: DateTime<Utc>,
    /// Injected verbatim into every generation prompt.
    pub world_context: String,
    /// Injected verbatim into every generation prompt.
    pub simulation_rules: String,
    #[serde(default)]
    pub nations: BTreeMap<NationCode, NationState>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub events: Vec<WorldEvent>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub chats: Vec<DiplomaticChat>,
}

impl Save {
    /// All actions still awaiting the next turn advancement.
    pub fn pending_actions(&self) -> Vec<&Action> {
        self.actions.iter().filter(|a| a.is_pending()).collect()
    }

    /// The most recent `n` events in log order.
    pub fn recent_events(&self, n: usize) -> &[WorldEvent] {
        let start = self.events.len().saturating_sub(n);
        &self.events[start..]
    }

    pub fn chat(&self, chat_id: &str) -> Option<&DiplomaticChat> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    pub fn chat_mut(&mut self, chat_id: &str) -> Option<&mut DiplomaticChat> {
        self.chats.iter_mut().find(|c| c.id == chat_id)
    }
}

/// Listing view for the save picker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveSummary {
    pub id: String,
    pub name: String,
    pub nation_code: NationCode,
    pub nation_name: String,
    pub current_date: GameDate,
    pub turn_number: u32,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventType, Severity};

    fn event(n: u32) -> WorldEvent {
        WorldEvent {
            id: n.to_string(),
            title: format!("event {n}"),
            description: String::new(),
            event_type: EventType::Political,
            severity: Severity::Minor,
            affected_nations: vec![],
            state_changes: None,
            game_date: GameDate::from_ymd_opt(1936, 1, 1).unwrap(),
            turn_number: n,
            created_at: Utc::now(),
        }
    }

    fn empty_save() -> Save {
        Save {
            id: "s".to_string(),
            name: "Test".to_string(),
            player_nation_code: NationCode::new("ITA"),
            current_date: GameDate::from_ymd_opt(1936, 1, 1).unwrap(),
            turn_number: 1,
            created_at: Utc::now(),
            world_context: String::new(),
            simulation_rules: String::new(),
            nations: BTreeMap::new(),
            actions: vec![],
            events: vec![],
            units: vec![],
            chats: vec![],
        }
    }

    #[test]
    fn recent_events_takes_the_tail() {
        let mut save = empty_save();
        save.events = (0..15).map(event).collect();
        let recent = save.recent_events(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].turn_number, 5);
        assert_eq!(recent[9].turn_number, 14);
    }

    #[test]
    fn recent_events_handles_short_logs() {
        let mut save = empty_save();
        save.events = (0..3).map(event).collect();
        assert_eq!(save.recent_events(10).len(), 3);
    }
}
