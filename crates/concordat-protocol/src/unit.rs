//! Military units. Display-level only: units move between regions but there
//! is no combat or attrition model; occupation is asserted by events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::NationCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Infantry,
    Armor,
    Naval,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub unit_type: UnitType,
    pub nation_code: NationCode,
    pub region_id: String,
    /// 0-100. Clamped at creation; nothing in the simulation mutates these
    /// after the fact.
    pub strength: i32,
    pub organization: i32,
    pub experience: i32,
    /// Map placement for display clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<[f64; 2]>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Unit {
    /// Clamp an attribute to the 0-100 gauge range.
    pub fn clamp_attr(value: i32) -> i32 {
        value.clamp(0, 100)
    }
}
