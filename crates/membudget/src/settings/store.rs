//! File-backed and in-memory settings stores.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{SettingsSink, SettingsSource, UserSettings, validate_user_id};
use crate::error::StoreError;

/// Settings persisted as one JSON file per user.
///
/// Directory layout:
/// ```text
/// settings_dir/
///   alice.json
///   bob.json
/// ```
pub struct FileSettingsStore {
    dir: PathBuf,
}

impl FileSettingsStore {
    /// Create a store, ensuring the settings directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{user}.json"))
    }

    /// Remove a user's settings. Returns `false` if none were stored.
    pub fn remove(&self, user: &str) -> Result<bool, StoreError> {
        validate_user_id(user)?;
        match std::fs::remove_file(self.path_for(user)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl SettingsSource for FileSettingsStore {
    fn load(&self, user: &str) -> Result<Option<UserSettings>, StoreError> {
        validate_user_id(user)?;
        let path = self.path_for(user);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "loaded settings");
        Ok(Some(serde_json::from_str(&json)?))
    }
}

impl SettingsSink for FileSettingsStore {
    /// Atomic write: serialize to a uniquely named temp file in the same
    /// directory, then rename it over `<user>.json`. Concurrent saves of the
    /// same user each get their own temp file; the last rename wins.
    fn store(&self, user: &str, settings: &UserSettings) -> Result<(), StoreError> {
        validate_user_id(user)?;
        let final_path = self.path_for(user);

        let json = serde_json::to_string_pretty(settings)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{user}.json."))
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&final_path).map_err(|e| e.error)?;
        debug!(path = %final_path.display(), "stored settings");
        Ok(())
    }
}

/// Settings kept in process memory.
#[derive(Default)]
pub struct MemorySettingsStore {
    entries: Mutex<HashMap<String, UserSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's settings without validation of the sizes, so tests can
    /// plant malformed data.
    pub fn insert(&self, user: impl Into<String>, settings: UserSettings) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(user.into(), settings);
    }

    pub fn get(&self, user: &str) -> Option<UserSettings> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(user).cloned()
    }
}

impl SettingsSource for MemorySettingsStore {
    fn load(&self, user: &str) -> Result<Option<UserSettings>, StoreError> {
        validate_user_id(user)?;
        Ok(self.get(user))
    }
}

impl SettingsSink for MemorySettingsStore {
    fn store(&self, user: &str, settings: &UserSettings) -> Result<(), StoreError> {
        validate_user_id(user)?;
        self.insert(user, settings.clone());
        Ok(())
    }
}
