//! Persisted UI preferences.
//!
//! A small string-keyed JSON document. Writes replace the whole file via a
//! temp file and rename, so a reader sees either the old or the new
//! document. Last write wins.

use crate::error::Result;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key of the sidebar width preference.
pub const SIDEBAR_WIDTH_KEY: &str = "cache-browser-sidebar-width";
pub const MIN_SIDEBAR_WIDTH: u32 = 200;
pub const MAX_SIDEBAR_WIDTH: u32 = 600;

/// File-backed key/value store.
pub struct PreferenceStore {
    path: PathBuf,
    // Serialises writers within this process.
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Map<String, Value> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read preferences");
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "Corrupt preferences file, ignoring");
                Map::new()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.read_all().remove(key)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Store `value` under `key`, replacing the file atomically.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_all();
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(map))?;
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "preferences.json".to_string());
        let temp = self
            .path
            .with_file_name(format!("{file_name}.tmp.{}", std::process::id()));

        std::fs::write(&temp, json)?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        tracing::debug!(key, path = %self.path.display(), "Preference saved");
        Ok(())
    }
}

/// Clamp a width into the sidebar's allowed range.
pub fn clamp_width(width: i64) -> u32 {
    width.clamp(MIN_SIDEBAR_WIDTH as i64, MAX_SIDEBAR_WIDTH as i64) as u32
}

/// Sidebar width, read at startup and written when a resize ends.
pub struct WidthPreference {
    store: PreferenceStore,
}

impl WidthPreference {
    pub fn new(store: PreferenceStore) -> Self {
        Self { store }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::new(PreferenceStore::new(path))
    }

    /// Saved width, clamped. `None` when nothing usable is stored.
    pub fn load(&self) -> Option<u32> {
        let raw = self.store.get(SIDEBAR_WIDTH_KEY)?;
        let width = raw.trim().parse::<f64>().ok().filter(|w| w.is_finite())?;
        Some(clamp_width(width.round() as i64))
    }

    /// Persist `width` after clamping. Returns the stored value.
    pub fn save(&self, width: i64) -> Result<u32> {
        let width = clamp_width(width);
        self.store.set(SIDEBAR_WIDTH_KEY, &width.to_string())?;
        Ok(width)
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_round_trip_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let pref = WidthPreference::at(dir.path().join("nested/prefs.json"));

        assert_eq!(pref.load(), None);
        assert_eq!(pref.save(320).unwrap(), 320);
        assert_eq!(pref.load(), Some(320));

        assert_eq!(pref.save(50).unwrap(), MIN_SIDEBAR_WIDTH);
        assert_eq!(pref.save(9000).unwrap(), MAX_SIDEBAR_WIDTH);
        assert_eq!(pref.load(), Some(MAX_SIDEBAR_WIDTH));
    }

    #[test]
    fn test_other_keys_survive_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        store.set("theme", "dark").unwrap();
        store.set(SIDEBAR_WIDTH_KEY, "250").unwrap();

        assert_eq!(store.get("theme").as_deref(), Some("dark"));
        assert_eq!(store.get(SIDEBAR_WIDTH_KEY).as_deref(), Some("250"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_corrupt_or_garbage_values_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json at all").unwrap();
        let pref = WidthPreference::at(&path);
        assert_eq!(pref.load(), None);

        std::fs::write(&path, r#"{"cache-browser-sidebar-width": "wide"}"#).unwrap();
        assert_eq!(pref.load(), None);

        std::fs::write(&path, r#"{"cache-browser-sidebar-width": 412.6}"#).unwrap();
        assert_eq!(pref.load(), Some(413));
    }
}
