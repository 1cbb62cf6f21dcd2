//! Bounded world-state views handed to the generation backend.
//!
//! Prompts cannot carry the whole save document, so turn generation and
//! advisor calls both receive a summary restricted to a priority set of
//! nations. `concordat-core` computes these; the generation client renders
//! them into prompt text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::event::WorldEvent;
use crate::types::{GameDate, NationCode, TimeJump};

/// One nation's line in a world summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NationBrief {
    pub name: String,
    pub stability: f64,
    pub war_support: f64,
    /// Count of occupied regions, not the identifiers themselves.
    pub occupied: usize,
    pub at_war: bool,
}

/// Token-bounded summary over the priority set of nations.
pub type WorldStateSummary = BTreeMap<NationCode, NationBrief>;

/// Everything the turn-event generation prompt needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnContext {
    pub time_jump: TimeJump,
    pub current_date: GameDate,
    pub player_nation_code: NationCode,
    pub player_nation_name: String,
    pub pending_actions: Vec<Action>,
    pub recent_events: Vec<WorldEvent>,
    pub world_state: WorldStateSummary,
    pub world_context: String,
    pub simulation_rules: String,
}

/// The player's own nation, as the advisor sees it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerBrief {
    pub code: NationCode,
    pub name: String,
    pub at_war: bool,
    pub occupied_regions: Vec<String>,
}

/// Everything an advisor Q&A prompt needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdvisorContext {
    pub current_date: GameDate,
    pub turn_number: u32,
    pub player_nation: PlayerBrief,
    pub world_state: WorldStateSummary,
    pub recent_events: Vec<WorldEvent>,
    pub pending_actions: Vec<Action>,
    pub world_context: String,
    pub simulation_rules: String,
}
