//! File-backed save store.
//!
//! One JSON document per save, written whole. Every mutation path in the
//! server loads the full document, mutates it in memory, and writes it back;
//! the write goes to a temp file first and is renamed into place so a failed
//! write never leaves a torn document behind. Per-save mutual exclusion is
//! the server's job (`concordat-server::game::locks`).

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use concordat_protocol::{Save, SaveSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("save {0} not found")]
    NotFound(String),
    #[error("save store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("save document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, save_id: &str) -> PathBuf {
        self.dir.join(format!("{save_id}.json"))
    }

    pub fn load(&self, save_id: &str) -> Result<Save, StoreError> {
        let path = self.path_for(save_id);
        if !path.exists() {
            return Err(StoreError::NotFound(save_id.to_string()));
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Full-document overwrite, last writer wins.
    pub fn save(&self, save_id: &str, save: &Save) -> Result<(), StoreError> {
        let path = self.path_for(save_id);
        let tmp = self.dir.join(format!("{save_id}.json.tmp"));
        let raw = serde_json::to_string_pretty(save)?;
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &path)?;
        debug!(save_id, "save written");
        Ok(())
    }

    /// Summaries of every save in the store. Documents that fail to parse
    /// are skipped with a warning rather than breaking the listing.
    pub fn list(&self, nation_name: impl Fn(&Save) -> String) -> Result<Vec<SaveSummary>, StoreError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = match fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(?path, %err, "skipping unreadable save file");
                    continue;
                }
            };
            match serde_json::from_str::<Save>(&raw) {
                Ok(save) => summaries.push(SaveSummary {
                    id: save.id.clone(),
                    name: save.name.clone(),
                    nation_code: save.player_nation_code.clone(),
                    nation_name: nation_name(&save),
                    current_date: save.current_date,
                    turn_number: save.turn_number,
                    updated_at: save.created_at,
                }),
                Err(err) => {
                    warn!(?path, %err, "skipping corrupt save file");
                }
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    pub fn delete(&self, save_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(save_id);
        if !path.exists() {
            return Err(StoreError::NotFound(save_id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn rename(&self, save_id: &str, new_name: &str) -> Result<(), StoreError> {
        let mut save = self.load(save_id)?;
        save.name = new_name.to_string();
        self.save(save_id, &save)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use concordat_protocol::{GameDate, NationCode};
    use std::collections::BTreeMap;

    fn save_doc(id: &str) -> Save {
        Save {
            id: id.to_string(),
            name: format!("Save {id}"),
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
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();

        let doc = save_doc("1001");
        store.save("1001", &doc).unwrap();
        let loaded = store.load("1001").unwrap();
        assert_eq!(loaded.id, "1001");
        assert_eq!(loaded.name, "Save 1001");
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_and_rename() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        store.save("1", &save_doc("1")).unwrap();

        store.rename("1", "Renamed").unwrap();
        assert_eq!(store.load("1").unwrap().name, "Renamed");

        store.delete("1").unwrap();
        assert!(matches!(store.load("1"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("1"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_skips_corrupt_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::open(dir.path()).unwrap();
        store.save("1", &save_doc("1")).unwrap();
        store.save("2", &save_doc("2")).unwrap();
        fs::write(dir.path().join("junk.json"), "{ not json").unwrap();

        let summaries = store.list(|_| "Italy".to_string()).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.nation_name == "Italy"));
    }
}
