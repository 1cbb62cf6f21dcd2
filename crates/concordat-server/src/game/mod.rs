//! Game orchestration: save lifecycle, actions, units, advisor calls, and
//! event queries. Turn advancement lives in [`turn`], diplomacy in
//! [`diplomacy`].

pub mod diplomacy;
pub mod locks;
pub mod turn;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use concordat_core::{advisor_context, new_save, NationRegistry, SaveStore, StoreError};
use concordat_protocol::{
    Action, ActionStatus, GameDate, NationCode, NationInfo, Save, SaveSummary, Unit, UnitType,
    WorldEvent,
};

use crate::llm::{GenerationError, Generator};
use crate::notify::{Notification, Notifier};

use locks::SaveLocks;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Store(StoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(format!("save {id}")),
            other => ServiceError::Store(other),
        }
    }
}

/// A loaded save joined with the player's registry entry, so clients get
/// leader and ideology metadata in one fetch.
#[derive(Debug, Serialize)]
pub struct GameView {
    #[serde(flatten)]
    pub save: Save,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_nation: Option<NationInfo>,
}

/// Aggregate counts over a save's event log.
#[derive(Debug, Serialize)]
pub struct EventStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
}

/// The server's single orchestration point. Cheap to share behind an `Arc`;
/// the registry is loaded once and never reloaded.
pub struct GameService {
    registry: Arc<NationRegistry>,
    store: SaveStore,
    generator: Arc<dyn Generator>,
    locks: SaveLocks,
    notifier: Notifier,
}

impl GameService {
    pub fn new(
        registry: Arc<NationRegistry>,
        store: SaveStore,
        generator: Arc<dyn Generator>,
        notifier: Notifier,
    ) -> Self {
        Self {
            registry,
            store,
            generator,
            locks: SaveLocks::new(),
            notifier,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn registry(&self) -> &NationRegistry {
        &self.registry
    }

    fn nation_name(&self, code: &NationCode) -> String {
        self.registry
            .get(code)
            .map(|info| info.name.clone())
            .unwrap_or_else(|| code.to_string())
    }

    /// Millisecond timestamp plus a random suffix. Unique enough for ids
    /// minted by a single process.
    fn generate_id(prefix: &str) -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..1000);
        format!("{prefix}_{millis}{suffix:03}")
    }

    // ---- save lifecycle ----

    pub async fn create_game(
        &self,
        nation_code: &str,
        start_date: Option<GameDate>,
    ) -> Result<Save, ServiceError> {
        let code = NationCode::new(nation_code);
        let info = self
            .registry
            .get(&code)
            .ok_or_else(|| ServiceError::Validation(format!("unknown nation {code}")))?;

        let start = start_date
            .unwrap_or_else(|| GameDate::from_ymd_opt(1936, 1, 1).expect("valid epoch"));
        let save_id = Self::generate_id("save");
        let save = new_save(
            save_id.clone(),
            code,
            &info.name,
            start,
            &self.registry,
            Utc::now(),
        );

        let _guard = self.locks.lock(&save_id).await;
        self.store.save(&save_id, &save)?;
        info!(save_id, nation = %save.player_nation_code, "new game created");
        Ok(save)
    }

    pub fn load_game(&self, save_id: &str) -> Result<GameView, ServiceError> {
        let save = self.store.load(save_id)?;
        let player_nation = self.registry.get(&save.player_nation_code).cloned();
        Ok(GameView { save, player_nation })
    }

    pub fn list_games(&self) -> Result<Vec<SaveSummary>, ServiceError> {
        Ok(self
            .store
            .list(|save| self.nation_name(&save.player_nation_code))?)
    }

    pub async fn delete_game(&self, save_id: &str) -> Result<(), ServiceError> {
        let _guard = self.locks.lock(save_id).await;
        self.store.delete(save_id)?;
        info!(save_id, "save deleted");
        Ok(())
    }

    pub async fn rename_game(&self, save_id: &str, new_name: &str) -> Result<(), ServiceError> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("save name cannot be empty".into()));
        }
        let _guard = self.locks.lock(save_id).await;
        Ok(self.store.rename(save_id, name)?)
    }

    // ---- actions ----

    /// Record a player order. Free-text, accepted unconditionally: judgment
    /// on feasibility belongs to the next turn's simulation, not to input
    /// validation.
    pub async fn submit_action(
        &self,
        save_id: &str,
        action_text: &str,
        action_type: Option<&str>,
    ) -> Result<Action, ServiceError> {
        let text = action_text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation("action text cannot be empty".into()));
        }

        let _guard = self.locks.lock(save_id).await;
        let mut save = self.store.load(save_id)?;

        let action = Action {
            id: Self::generate_id("action"),
            nation_code: save.player_nation_code.clone(),
            action_text: text.to_string(),
            action_type: action_type.unwrap_or("general").to_string(),
            status: ActionStatus::Pending,
            turn_number: save.turn_number,
            created_at: Utc::now(),
        };
        save.actions.push(action.clone());
        self.store.save(save_id, &save)?;

        self.notifier.publish(Notification::ActionSubmitted {
            save_id: save_id.to_string(),
            action: action.clone(),
        });
        Ok(action)
    }

    pub fn actions(&self, save_id: &str) -> Result<Vec<Action>, ServiceError> {
        Ok(self.store.load(save_id)?.actions)
    }

    pub fn pending_actions(&self, save_id: &str) -> Result<Vec<Action>, ServiceError> {
        let save = self.store.load(save_id)?;
        Ok(save.pending_actions().into_iter().cloned().collect())
    }

    pub fn current_turn_actions(&self, save_id: &str) -> Result<Vec<Action>, ServiceError> {
        let save = self.store.load(save_id)?;
        Ok(save
            .actions
            .iter()
            .filter(|a| a.turn_number == save.turn_number)
            .cloned()
            .collect())
    }

    /// Withdraw an order. Only pending actions can be withdrawn; completed
    /// ones are history.
    pub async fn delete_action(&self, save_id: &str, action_id: &str) -> Result<(), ServiceError> {
        let _guard = self.locks.lock(save_id).await;
        let mut save = self.store.load(save_id)?;

        let before = save.actions.len();
        save.actions
            .retain(|a| !(a.id == action_id && a.is_pending()));
        if save.actions.len() == before {
            return Err(ServiceError::NotFound(format!(
                "pending action {action_id}"
            )));
        }
        self.store.save(save_id, &save)?;
        Ok(())
    }

    // ---- units ----

    pub fn units(
        &self,
        save_id: &str,
        nation: Option<&str>,
        region: Option<&str>,
    ) -> Result<Vec<Unit>, ServiceError> {
        let nation = nation.map(NationCode::new);
        let mut units = self.store.load(save_id)?.units;
        if let Some(code) = nation {
            units.retain(|u| u.nation_code == code);
        }
        if let Some(region) = region {
            units.retain(|u| u.region_id == region);
        }
        Ok(units)
    }

    pub fn unit(&self, save_id: &str, unit_id: &str) -> Result<Unit, ServiceError> {
        self.store
            .load(save_id)?
            .units
            .into_iter()
            .find(|u| u.id == unit_id)
            .ok_or_else(|| ServiceError::NotFound(format!("unit {unit_id}")))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_unit(
        &self,
        save_id: &str,
        name: &str,
        unit_type: UnitType,
        nation_code: &str,
        region_id: &str,
        strength: i32,
        centroid: Option<[f64; 2]>,
    ) -> Result<Unit, ServiceError> {
        let code = NationCode::new(nation_code);
        if !self.registry.contains(&code) {
            return Err(ServiceError::Validation(format!("unknown nation {code}")));
        }

        let _guard = self.locks.lock(save_id).await;
        let mut save = self.store.load(save_id)?;

        let unit = Unit {
            id: Self::generate_id("unit"),
            name: name.to_string(),
            unit_type,
            nation_code: code,
            region_id: region_id.to_string(),
            strength: Unit::clamp_attr(strength),
            organization: 100,
            experience: 0,
            centroid,
            created_at: Utc::now(),
            updated_at: None,
        };
        save.units.push(unit.clone());
        self.store.save(save_id, &save)?;
        Ok(unit)
    }

    pub async fn move_unit(
        &self,
        save_id: &str,
        unit_id: &str,
        region_id: &str,
        centroid: Option<[f64; 2]>,
    ) -> Result<Unit, ServiceError> {
        let _guard = self.locks.lock(save_id).await;
        let mut save = self.store.load(save_id)?;

        let unit = save
            .units
            .iter_mut()
            .find(|u| u.id == unit_id)
            .ok_or_else(|| ServiceError::NotFound(format!("unit {unit_id}")))?;
        unit.region_id = region_id.to_string();
        if centroid.is_some() {
            unit.centroid = centroid;
        }
        unit.updated_at = Some(Utc::now());
        let moved = unit.clone();

        self.store.save(save_id, &save)?;
        Ok(moved)
    }

    // ---- advisor ----

    /// Ask the strategic advisor a question. Generation failures degrade to
    /// a stock unavailable message so the UI always has something to show.
    pub async fn ask_advisor(
        &self,
        save_id: &str,
        question: &str,
    ) -> Result<String, ServiceError> {
        let save = self.store.load(save_id)?;
        let ctx = advisor_context(&save, &self.registry);

        match self.generator.advisor(question, &ctx).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                warn!(save_id, %err, "advisor generation failed");
                Ok("The advisor is unreachable at the moment. Give the order again shortly."
                    .to_string())
            }
        }
    }

    pub async fn advisor_summary(&self, save_id: &str) -> Result<String, ServiceError> {
        self.ask_advisor(
            save_id,
            "Summarize the current world situation and our position in it.",
        )
        .await
    }

    pub async fn advisor_strategy(
        &self,
        save_id: &str,
        focus: Option<&str>,
    ) -> Result<String, ServiceError> {
        let question = match focus {
            Some(focus) => format!(
                "Give a strategic analysis of our position with a focus on {focus}: strengths, \
                 vulnerabilities, and the moves our rivals are preparing."
            ),
            None => "Give a strategic analysis of our position: strengths, vulnerabilities, and \
                     the moves our rivals are preparing."
                .to_string(),
        };
        self.ask_advisor(save_id, &question).await
    }

    pub async fn advisor_suggestions(&self, save_id: &str) -> Result<String, ServiceError> {
        self.ask_advisor(
            save_id,
            "Propose three concrete actions we should take this turn, with expected outcomes.",
        )
        .await
    }

    // ---- event queries ----

    pub fn recent_events(&self, save_id: &str, limit: usize) -> Result<Vec<WorldEvent>, ServiceError> {
        let save = self.store.load(save_id)?;
        Ok(save.recent_events(limit).to_vec())
    }

    /// Events of one turn, most severe first.
    pub fn events_by_turn(&self, save_id: &str, turn: u32) -> Result<Vec<WorldEvent>, ServiceError> {
        let save = self.store.load(save_id)?;
        let mut events: Vec<WorldEvent> = save
            .events
            .into_iter()
            .filter(|e| e.turn_number == turn)
            .collect();
        events.sort_by(|a, b| b.severity.cmp(&a.severity));
        Ok(events)
    }

    pub fn events_by_type(
        &self,
        save_id: &str,
        event_type: &str,
    ) -> Result<Vec<WorldEvent>, ServiceError> {
        let wanted = concordat_protocol::EventType::parse_lenient(event_type);
        let save = self.store.load(save_id)?;
        Ok(save
            .events
            .into_iter()
            .filter(|e| e.event_type == wanted)
            .collect())
    }

    pub fn events_by_nation(
        &self,
        save_id: &str,
        nation_code: &str,
    ) -> Result<Vec<WorldEvent>, ServiceError> {
        let code = NationCode::new(nation_code);
        let save = self.store.load(save_id)?;
        Ok(save
            .events
            .into_iter()
            .filter(|e| e.affected_nations.contains(&code))
            .collect())
    }

    pub fn important_events(&self, save_id: &str) -> Result<Vec<WorldEvent>, ServiceError> {
        let save = self.store.load(save_id)?;
        Ok(save
            .events
            .into_iter()
            .filter(|e| e.severity.is_important())
            .collect())
    }

    pub fn event(&self, save_id: &str, event_id: &str) -> Result<WorldEvent, ServiceError> {
        self.store
            .load(save_id)?
            .events
            .into_iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| ServiceError::NotFound(format!("event {event_id}")))
    }

    pub fn event_stats(&self, save_id: &str) -> Result<EventStats, ServiceError> {
        let save = self.store.load(save_id)?;
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
        for event in &save.events {
            *by_type.entry(event.event_type.to_string()).or_default() += 1;
            *by_severity.entry(event.severity.to_string()).or_default() += 1;
        }
        Ok(EventStats {
            total: save.events.len(),
            by_type,
            by_severity,
        })
    }

    // ---- nations ----

    /// All nations, majors first.
    pub fn nations(&self) -> Vec<NationInfo> {
        self.registry.sorted().into_iter().cloned().collect()
    }

    pub fn nation(&self, code: &str) -> Result<NationInfo, ServiceError> {
        let code = NationCode::new(code);
        self.registry
            .get(&code)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("nation {code}")))
    }
}
