use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{info, warn};

use crate::session::result::SessionResult;
use crate::store::schema::{CharacterStatsData, HistoryData, Versioned, WeightsData};

const WEIGHTS_FILE: &str = "weights.json";
const STATS_FILE: &str = "character_stats.json";
const HISTORY_FILE: &str = "history.json";

/// Oldest sessions are dropped past this many.
pub const MAX_HISTORY: usize = 500;

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kanadrill");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Missing, unreadable or stale files all come back as defaults.
    fn load<T: DeserializeOwned + Default + Versioned>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        let data: T = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    warn!(target: "store", file = name, error = %e, "unparseable, using defaults");
                    return T::default();
                }
            },
            Err(e) => {
                warn!(target: "store", file = name, error = %e, "unreadable, using defaults");
                return T::default();
            }
        };
        if data.needs_reset() {
            info!(
                target: "store",
                file = name,
                found = data.schema_version(),
                "schema version changed, resetting"
            );
            return T::default();
        }
        data
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_weights(&self) -> WeightsData {
        self.load(WEIGHTS_FILE)
    }

    pub fn save_weights(&self, data: &WeightsData) -> Result<()> {
        self.save(WEIGHTS_FILE, data)
    }

    pub fn load_character_stats(&self) -> CharacterStatsData {
        self.load(STATS_FILE)
    }

    pub fn save_character_stats(&self, data: &CharacterStatsData) -> Result<()> {
        self.save(STATS_FILE, data)
    }

    pub fn load_history(&self) -> HistoryData {
        self.load(HISTORY_FILE)
    }

    pub fn save_history(&self, data: &HistoryData) -> Result<()> {
        self.save(HISTORY_FILE, data)
    }

    pub fn append_result(&self, result: &SessionResult) -> Result<()> {
        let mut history = self.load_history();
        history.sessions.push(result.clone());
        if history.sessions.len() > MAX_HISTORY {
            let excess = history.sessions.len() - MAX_HISTORY;
            history.sessions.drain(..excess);
        }
        self.save_history(&history)
    }

    /// Remove every persisted file. Used by `--reset`.
    pub fn clear(&self) -> Result<()> {
        for name in [WEIGHTS_FILE, STATS_FILE, HISTORY_FILE] {
            let path = self.file_path(name);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::result::SessionTally;
    use crate::store::schema::SCHEMA_VERSION;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn result(score: u64) -> SessionResult {
        SessionResult::new("classic", score, 3, &SessionTally::default())
    }

    #[test]
    fn test_missing_files_load_defaults() {
        let (_dir, store) = make_test_store();
        assert!(store.load_weights().weights.is_empty());
        assert!(store.load_character_stats().stats.is_empty());
        assert!(store.load_history().sessions.is_empty());
    }

    #[test]
    fn test_weights_persist() {
        let (_dir, store) = make_test_store();
        let mut data = WeightsData::default();
        data.weights.insert("ぬ".to_string(), 9.0);
        store.save_weights(&data).unwrap();
        assert_eq!(store.load_weights().weights.get("ぬ"), Some(&9.0));
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let (dir, store) = make_test_store();
        store.save_history(&HistoryData::default()).unwrap();
        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(tmp_files.is_empty(), "no residual .tmp files");
        assert!(store.file_path(HISTORY_FILE).exists());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path(WEIGHTS_FILE), "{not json").unwrap();
        assert!(store.load_weights().weights.is_empty());
    }

    #[test]
    fn test_stale_schema_is_reset() {
        let (_dir, store) = make_test_store();
        let stale = format!(
            r#"{{"schema_version": {}, "weights": {{"あ": 12.0}}}}"#,
            SCHEMA_VERSION + 1
        );
        fs::write(store.file_path(WEIGHTS_FILE), stale).unwrap();
        let loaded = store.load_weights();
        assert!(loaded.weights.is_empty());
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_append_result_caps_history() {
        let (_dir, store) = make_test_store();
        let mut history = HistoryData::default();
        history.sessions = (0..MAX_HISTORY as u64).map(result).collect();
        store.save_history(&history).unwrap();

        store.append_result(&result(9999)).unwrap();
        let loaded = store.load_history();
        assert_eq!(loaded.sessions.len(), MAX_HISTORY);
        assert_eq!(loaded.sessions[0].score, 1);
        assert_eq!(loaded.best_score("classic"), Some(9999));
        assert_eq!(loaded.best_score("snake"), None);
    }

    #[test]
    fn test_clear_removes_files() {
        let (_dir, store) = make_test_store();
        store.save_weights(&WeightsData::default()).unwrap();
        store.append_result(&result(1)).unwrap();
        store.clear().unwrap();
        assert!(!store.file_path(WEIGHTS_FILE).exists());
        assert!(!store.file_path(HISTORY_FILE).exists());
    }
}
