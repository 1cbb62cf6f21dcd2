//! Context builder: bounded world-state views for generation prompts.
//!
//! Both turn generation and advisor calls must see the same picture of the
//! world, so the summary is computed by exactly one function here.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use concordat_protocol::{
    AdvisorContext, NationBrief, NationCode, PlayerBrief, Save, WorldStateSummary,
};

use crate::registry::NationRegistry;

/// How many trailing events count as "recent" for prompt context.
pub const RECENT_EVENT_WINDOW: usize = 10;

/// Diplomacy prompts get a deeper history window: negotiations reference
/// events further back than turn generation needs.
pub const DIPLOMACY_EVENT_WINDOW: usize = 20;

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[A-Z]{3}").expect("static regex"))
}

/// The priority set: nations worth spending prompt tokens on.
///
/// Union of the player's nation, every code mentioned in pending action text,
/// the owners of pending actions, every nation affected by the last ten
/// events, and every registry major power. Order-independent.
fn priority_nations(save: &Save, registry: &NationRegistry) -> BTreeSet<NationCode> {
    let mut priority = BTreeSet::new();
    priority.insert(save.player_nation_code.clone());

    for action in save.pending_actions() {
        priority.insert(action.nation_code.clone());
        for mention in code_pattern().find_iter(&action.action_text) {
            priority.insert(NationCode::new(mention.as_str()));
        }
    }

    for event in save.recent_events(RECENT_EVENT_WINDOW) {
        for code in &event.affected_nations {
            priority.insert(code.clone());
        }
    }

    for major in registry.majors() {
        priority.insert(major.code.clone());
    }

    priority
}

/// Build the token-bounded world summary for a save.
///
/// Only nations in the priority set that both exist in the save and have a
/// registry entry appear; the summary carries display names so prompts never
/// need a second registry lookup.
pub fn world_state_summary(save: &Save, registry: &NationRegistry) -> WorldStateSummary {
    let priority = priority_nations(save, registry);

    save.nations
        .iter()
        .filter(|(code, _)| priority.contains(*code))
        .filter_map(|(code, state)| {
            let info = registry.get(code)?;
            Some((
                code.clone(),
                NationBrief {
                    name: info.name.clone(),
                    stability: state.stability,
                    war_support: state.war_support,
                    occupied: state.occupied_regions.len(),
                    at_war: state.at_war,
                },
            ))
        })
        .collect()
}

/// Assemble the advisor's view of the world: the shared summary plus the
/// player's own situation, recent history, and the save's policy strings.
pub fn advisor_context(save: &Save, registry: &NationRegistry) -> AdvisorContext {
    let player_code = save.player_nation_code.clone();
    let player_name = registry
        .get(&player_code)
        .map(|info| info.name.clone())
        .unwrap_or_else(|| player_code.to_string());
    let player_state = save.nations.get(&player_code);

    AdvisorContext {
        current_date: save.current_date,
        turn_number: save.turn_number,
        player_nation: PlayerBrief {
            code: player_code,
            name: player_name,
            at_war: player_state.map(|s| s.at_war).unwrap_or(false),
            occupied_regions: player_state
                .map(|s| s.occupied_regions.clone())
                .unwrap_or_default(),
        },
        world_state: world_state_summary(save, registry),
        recent_events: save.recent_events(RECENT_EVENT_WINDOW).to_vec(),
        pending_actions: save.pending_actions().into_iter().cloned().collect(),
        world_context: save.world_context.clone(),
        simulation_rules: save.simulation_rules.clone(),
    }
}
