//! Turn advancement: the simulation heartbeat.
//!
//! One turn is a strict sequence under the save's lock: snapshot the pending
//! orders, generate events for the elapsed period, apply their mechanical
//! consequences, advance the calendar, mark the snapshotted orders complete,
//! and persist the whole document once. Generation trouble of any kind
//! degrades to an eventless turn; the calendar still moves.

use chrono::Utc;
use tracing::{info, warn};

use concordat_core::{advance_date, apply_state_changes, world_state_summary, RECENT_EVENT_WINDOW};
use concordat_protocol::{Save, TimeJump, TurnContext, WorldEvent};

use crate::llm::TurnOutcome;
use crate::notify::Notification;

use super::{GameService, ServiceError};

/// What one advancement did, for the response payload.
#[derive(Debug, serde::Serialize)]
pub struct TurnReport {
    pub previous_date: concordat_protocol::GameDate,
    pub new_date: concordat_protocol::GameDate,
    pub turn_number: u32,
    pub events: Vec<WorldEvent>,
    pub processed_actions: usize,
    /// Parsed from the generation response and surfaced to the client;
    /// nothing in the save persists it.
    pub global_tension_delta: f64,
    /// Set when the generation response could not be parsed and the turn
    /// proceeded without events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

fn turn_context(save: &Save, service: &GameService, jump: TimeJump) -> TurnContext {
    TurnContext {
        time_jump: jump,
        current_date: save.current_date,
        player_nation_code: save.player_nation_code.clone(),
        player_nation_name: service.nation_name(&save.player_nation_code),
        pending_actions: save.pending_actions().into_iter().cloned().collect(),
        recent_events: save.recent_events(RECENT_EVENT_WINDOW).to_vec(),
        world_state: world_state_summary(save, service.registry()),
        world_context: save.world_context.clone(),
        simulation_rules: save.simulation_rules.clone(),
    }
}

impl GameService {
    /// Advance the simulation clock by one jump.
    pub async fn advance_time(
        &self,
        save_id: &str,
        time_jump: &str,
    ) -> Result<TurnReport, ServiceError> {
        let jump = TimeJump::parse(time_jump);
        let _guard = self.locks.lock(save_id).await;
        let mut save = self.store.load(save_id)?;

        self.notifier.publish(Notification::TimeAdvanceStart {
            save_id: save_id.to_string(),
            time_jump: jump.token(),
        });

        // Orders submitted after this snapshot belong to the next turn.
        let snapshot: Vec<String> = save
            .pending_actions()
            .iter()
            .map(|a| a.id.clone())
            .collect();

        let ctx = turn_context(&save, self, jump);
        let outcome = match self.generator.turn_events(&ctx).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(save_id, %err, "turn generation unavailable, advancing without events");
                TurnOutcome::Degraded {
                    error: err.to_string(),
                }
            }
        };
        let degraded = match &outcome {
            TurnOutcome::Degraded { error } => Some(error.clone()),
            TurnOutcome::Parsed(_) => None,
        };
        let generation = outcome.into_generation();

        let previous_date = save.current_date;
        let completed_turn = save.turn_number;
        let new_date = advance_date(previous_date, &jump);
        let now = Utc::now();

        let mut new_events = Vec::with_capacity(generation.events.len());
        for (index, generated) in generation.events.into_iter().enumerate() {
            if let Some(changes) = &generated.state_changes {
                apply_state_changes(&mut save.nations, changes);
            }
            // Events narrate the period being resolved, so they carry the
            // date the turn started from, not the post-advance date.
            new_events.push(WorldEvent::from_generated(
                generated,
                format!("evt_{}_{completed_turn}_{index}", now.timestamp_millis()),
                previous_date,
                completed_turn,
                now,
            ));
        }
        save.events.extend(new_events.iter().cloned());

        let mut processed = 0;
        for action in &mut save.actions {
            if action.is_pending() && snapshot.contains(&action.id) {
                action.status = concordat_protocol::ActionStatus::Completed;
                processed += 1;
            }
        }

        save.current_date = new_date;
        save.turn_number = completed_turn + 1;
        self.store.save(save_id, &save)?;

        info!(
            save_id,
            turn = completed_turn,
            events = new_events.len(),
            actions = processed,
            %new_date,
            "turn advanced"
        );
        self.notifier.publish(Notification::TimeAdvanceComplete {
            save_id: save_id.to_string(),
            turn_number: save.turn_number,
            event_count: new_events.len(),
        });

        Ok(TurnReport {
            previous_date,
            new_date,
            turn_number: save.turn_number,
            events: new_events,
            processed_actions: processed,
            global_tension_delta: generation.global_tension_delta,
            degraded,
        })
    }
}
