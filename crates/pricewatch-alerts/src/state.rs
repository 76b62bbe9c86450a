//! JSON file persistence for [`AlertState`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pricewatch_core::AlertState;

use crate::error::StateError;

/// Reads and writes the alert state document.
///
/// Loading never fails: a missing file is an empty state, and an unreadable
/// or corrupt one is logged and treated as empty. Saving replaces the whole
/// document through a sibling temp file and a rename, so readers see either
/// the old document or the new one.
#[derive(Debug, Clone)]
pub struct AlertStateStore {
    path: PathBuf,
}

impl AlertStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn load(&self) -> AlertState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return AlertState::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "alert state unreadable; starting from empty state"
                );
                return AlertState::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "alert state corrupt; starting from empty state"
                );
                AlertState::new()
            }
        }
    }

    /// Overwrites the stored document with `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the state cannot be serialized or the file
    /// cannot be written or renamed into place.
    pub fn save(&self, state: &AlertState) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }

        tracing::debug!(path = %self.path.display(), models = state.len(), "alert state saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "alert_state".into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pricewatch_core::BestOffer;

    use super::*;

    /// Unique scratch directory per test.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pricewatch-state-{name}-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn offer(model: &str, price: f64) -> BestOffer {
        BestOffer {
            model: model.to_string(),
            price_num: price,
            price_text: None,
            site: "Smiths TV".to_string(),
            url: None,
            title: None,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = scratch_dir("missing");
        let store = AlertStateStore::new(dir.join("state.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = scratch_dir("corrupt");
        let path = dir.join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(AlertStateStore::new(&path).load().is_empty());
    }

    #[test]
    fn legacy_file_keeps_alert_history() {
        let dir = scratch_dir("legacy");
        let path = dir.join("state.json");
        fs::write(
            &path,
            r#"{
  "OLED55C4": {"last_notified_price": 850.0, "last_site": "Currys", "ts": "2025-03-01T10:00:00"},
  "OLED65C4": {"last_notified_price": 1300.0, "ts": "not a date"}
}"#,
        )
        .unwrap();

        let state = AlertStateStore::new(&path).load();
        assert_eq!(state.len(), 1);
        assert_eq!(state.last_notified_price("OLED55C4"), Some(850.0));
        assert_eq!(state.last_notified_price("OLED65C4"), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = scratch_dir("roundtrip");
        let store = AlertStateStore::new(dir.join("nested").join("state.json"));
        let mut state = AlertState::new();
        state.record_dispatch(&[offer("OLED55C4", 850.0)], Utc::now());

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
        assert!(
            !store.temp_path().exists(),
            "temp file should be renamed away"
        );
    }

    #[test]
    fn save_replaces_whole_document() {
        let dir = scratch_dir("replace");
        let store = AlertStateStore::new(dir.join("state.json"));

        let mut first = AlertState::new();
        first.record_dispatch(&[offer("OLED55C4", 850.0), offer("OLED65C4", 1300.0)], Utc::now());
        store.save(&first).unwrap();

        let mut second = AlertState::new();
        second.record_dispatch(&[offer("OLED55B4", 700.0)], Utc::now());
        store.save(&second).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("OLED55C4").is_none());
    }

    #[test]
    fn saved_document_is_pretty_json_keyed_by_model() {
        let dir = scratch_dir("pretty");
        let store = AlertStateStore::new(dir.join("state.json"));
        let mut state = AlertState::new();
        state.record_dispatch(&[offer("OLED55C4", 850.0)], Utc::now());
        store.save(&state).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["OLED55C4"]["last_notified_price"], 850.0);
        assert_eq!(value["OLED55C4"]["last_url"], "");
    }
}
