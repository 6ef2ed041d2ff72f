//! JSON-file settings store: one `user_<id>.json` per user.
//!
//! Files hold only the overrides, so changing a process default takes
//! effect for every user who never touched that field. Records are cached
//! after the first read; unreadable files fall back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::{debug, warn};

use super::store::{SettingsError, SettingsResult, SettingsStore, UserId};
use super::types::{SettingField, SettingsDefaults, UserOverrides, UserSettings};

pub struct FileSettingsStore {
    dir: PathBuf,
    defaults: SettingsDefaults,
    cache: DashMap<UserId, UserOverrides>,
}

impl FileSettingsStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>, defaults: SettingsDefaults) -> SettingsResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            SettingsError::Storage(format!(
                "Failed to create settings directory {}: {e}",
                dir.display()
            ))
        })?;

        debug!(dir = %dir.display(), "Opened settings directory");
        Ok(Self {
            dir,
            defaults,
            cache: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, user_id: UserId) -> PathBuf {
        self.dir.join(format!("user_{user_id}.json"))
    }

    fn read_file(&self, user_id: UserId) -> UserOverrides {
        let path = self.path_for(user_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return UserOverrides::default(),
            Err(e) => {
                warn!(user_id, path = %path.display(), error = %e, "Failed to read user settings, using defaults");
                return UserOverrides::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!(user_id, path = %path.display(), error = %e, "Corrupt user settings file, using defaults");
                UserOverrides::default()
            }
        }
    }

    fn write_file(&self, user_id: UserId, overrides: &UserOverrides) -> SettingsResult<()> {
        let path = self.path_for(user_id);
        let json = serde_json::to_string_pretty(overrides)
            .map_err(|e| SettingsError::Storage(format!("Failed to serialize settings: {e}")))?;
        fs::write(&path, json).map_err(|e| {
            SettingsError::Storage(format!("Failed to write {}: {e}", path.display()))
        })
    }
}

impl SettingsStore for FileSettingsStore {
    fn defaults(&self) -> &SettingsDefaults {
        &self.defaults
    }

    fn get_settings(&self, user_id: UserId) -> UserSettings {
        if let Some(entry) = self.cache.get(&user_id) {
            return entry.resolve(&self.defaults);
        }
        self.cache
            .entry(user_id)
            .or_insert_with(|| self.read_file(user_id))
            .resolve(&self.defaults)
    }

    fn set_setting(
        &self,
        user_id: UserId,
        field: SettingField,
        value: &str,
    ) -> SettingsResult<UserSettings> {
        // The entry guard serialises concurrent writers for the same user
        let mut entry = self
            .cache
            .entry(user_id)
            .or_insert_with(|| self.read_file(user_id));
        let mut updated = *entry;
        updated.apply(&self.defaults, field, value)?;
        self.write_file(user_id, &updated)?;
        *entry = updated;

        debug!(user_id, field = %field, value = %value, "Saved user setting");
        Ok(updated.resolve(&self.defaults))
    }

    fn reset(&self, user_id: UserId) -> SettingsResult<()> {
        let mut entry = self.cache.entry(user_id).or_default();
        let cleared = UserOverrides::default();
        self.write_file(user_id, &cleared)?;
        *entry = cleared;

        debug!(user_id, "Reset user settings file");
        Ok(())
    }
}
