//! Per-save nation state and the static registry entry it is joined with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::NationCode;

/// Static, read-only metadata for a nation.
///
/// Loaded once at process start from the nation registry file and shared
/// by reference; never copied into save documents except where a display
/// field is explicitly denormalized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NationInfo {
    pub code: NationCode,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub leader_name: Option<String>,
    #[serde(default)]
    pub leader_title: Option<String>,
    #[serde(default)]
    pub ideology: Option<String>,
    #[serde(default)]
    pub is_major_power: bool,
    /// Seed manpower for new games; defaults to 100k when absent.
    #[serde(default)]
    pub manpower: Option<i64>,
}

/// The mutable simulation state of one nation within a save.
///
/// Mutated only by event application during turn advancement. Stability and
/// war support stay clamped to [0, 100]; treasury has no floor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NationState {
    pub code: NationCode,
    pub stability: f64,
    pub war_support: f64,
    pub manpower: i64,
    pub political_power: i64,
    pub treasury: i64,
    pub at_war: bool,
    /// Sparse relation map: nation code -> relation value.
    #[serde(default)]
    pub relations: BTreeMap<NationCode, i32>,
    /// Regions this nation occupies. Ordered, duplicate-free, and only ever
    /// grows; there is no loss-of-territory event.
    #[serde(default)]
    pub occupied_regions: Vec<String>,
}

impl NationState {
    const GAUGE_MIN: f64 = 0.0;
    const GAUGE_MAX: f64 = 100.0;

    /// Initial state for a nation at game start.
    pub fn initial(code: NationCode, manpower: i64) -> Self {
        Self {
            code,
            stability: 70.0,
            war_support: 20.0,
            manpower,
            political_power: 100,
            treasury: 1000,
            at_war: false,
            relations: BTreeMap::new(),
            occupied_regions: Vec::new(),
        }
    }

    pub fn adjust_stability(&mut self, delta: f64) {
        self.stability = (self.stability + delta).clamp(Self::GAUGE_MIN, Self::GAUGE_MAX);
    }

    pub fn adjust_war_support(&mut self, delta: f64) {
        self.war_support = (self.war_support + delta).clamp(Self::GAUGE_MIN, Self::GAUGE_MAX);
    }

    pub fn adjust_treasury(&mut self, delta: i64) {
        self.treasury += delta;
    }

    /// Union-merge regions into the occupied set. Idempotent: applying the
    /// same region twice leaves a single entry.
    pub fn occupy_regions<I>(&mut self, regions: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for region in regions {
            let region = region.into();
            if !self.occupied_regions.contains(&region) {
                self.occupied_regions.push(region);
            }
        }
    }
}
