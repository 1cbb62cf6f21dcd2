//! The static nation registry.
//!
//! A read-only catalog of every polity the simulation knows about, loaded
//! once at process start from a JSON file keyed by nation code and shared as
//! an `Arc`; never re-read per request.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use concordat_protocol::{NationCode, NationInfo};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read nation registry: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse nation registry: {0}")]
    Json(#[from] serde_json::Error),
}

/// Registry file entries omit the code (it is the map key).
#[derive(Debug, Deserialize)]
struct RegistryEntry {
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    leader_name: Option<String>,
    #[serde(default)]
    leader_title: Option<String>,
    #[serde(default)]
    ideology: Option<String>,
    #[serde(default)]
    is_major_power: bool,
    #[serde(default)]
    manpower: Option<i64>,
}

#[derive(Debug, Default)]
pub struct NationRegistry {
    nations: BTreeMap<NationCode, NationInfo>,
}

impl NationRegistry {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let entries: BTreeMap<String, RegistryEntry> = serde_json::from_str(&raw)?;

        let nations = entries
            .into_iter()
            .map(|(code, entry)| {
                let code = NationCode::new(code);
                let info = NationInfo {
                    code: code.clone(),
                    name: entry.name,
                    color: entry.color,
                    leader_name: entry.leader_name,
                    leader_title: entry.leader_title,
                    ideology: entry.ideology,
                    is_major_power: entry.is_major_power,
                    manpower: entry.manpower,
                };
                (code, info)
            })
            .collect::<BTreeMap<_, _>>();

        info!(nations = nations.len(), "nation registry loaded");
        Ok(Self { nations })
    }

    /// Build a registry directly from entries (tests and tools).
    pub fn from_entries(entries: impl IntoIterator<Item = NationInfo>) -> Self {
        Self {
            nations: entries
                .into_iter()
                .map(|info| (info.code.clone(), info))
                .collect(),
        }
    }

    pub fn get(&self, code: &NationCode) -> Option<&NationInfo> {
        self.nations.get(code)
    }

    pub fn contains(&self, code: &NationCode) -> bool {
        self.nations.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NationInfo> {
        self.nations.values()
    }

    pub fn len(&self) -> usize {
        self.nations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nations.is_empty()
    }

    pub fn majors(&self) -> impl Iterator<Item = &NationInfo> {
        self.nations.values().filter(|n| n.is_major_power)
    }

    /// All nations, majors first, then alphabetical by display name.
    pub fn sorted(&self) -> Vec<&NationInfo> {
        let mut all: Vec<&NationInfo> = self.nations.values().collect();
        all.sort_by(|a, b| {
            b.is_major_power
                .cmp(&a.is_major_power)
                .then_with(|| a.name.cmp(&b.name))
        });
        all
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn nation(code: &str, name: &str, major: bool) -> NationInfo {
        NationInfo {
            code: NationCode::new(code),
            name: name.to_string(),
            color: None,
            leader_name: None,
            leader_title: None,
            ideology: None,
            is_major_power: major,
            manpower: None,
        }
    }

    pub fn small_registry() -> NationRegistry {
        NationRegistry::from_entries([
            nation("ITA", "Italy", true),
            nation("GER", "Germany", true),
            nation("ETH", "Ethiopia", false),
            nation("SWE", "Sweden", false),
        ])
    }
}
