//! Player actions queued for the next turn advancement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::NationCode;

/// Lifecycle of an action. `Pending` actions are consumed (and marked
/// `Completed`) by the next turn advancement; they are deletable only while
/// still pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Completed,
}

/// A free-text order submitted by the player.
///
/// Accepted unconditionally: feasibility is judged narratively by the
/// generation backend, not gated server-side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub nation_code: NationCode,
    pub action_text: String,
    pub action_type: String,
    pub status: ActionStatus,
    pub turn_number: u32,
    pub created_at: DateTime<Utc>,
}

impl Action {
    pub fn is_pending(&self) -> bool {
        self.status == ActionStatus::Pending
    }
}
