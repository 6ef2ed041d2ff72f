//! Settings store trait and the in-memory implementation.

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use super::types::{Role, SettingField, SettingsDefaults, UserOverrides, UserSettings, Voice};

/// Telegram user identifier
pub type UserId = i64;

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: SettingField,
        value: String,
        reason: String,
    },

    #[error("Voice '{voice}' does not support role '{role}'")]
    IncompatibleRole { voice: Voice, role: Role },

    #[error("Settings storage error: {0}")]
    Storage(String),
}

/// Keyed per-user preference store.
///
/// Implementations must be safe to share between request handlers; updates
/// for different users never contend on a common lock.
pub trait SettingsStore: Send + Sync {
    /// Defaults every record is resolved against
    fn defaults(&self) -> &SettingsDefaults;

    /// Resolved settings, creating an empty record on first use
    fn get_settings(&self, user_id: UserId) -> UserSettings;

    /// Validate and store one field, returning the updated settings
    fn set_setting(
        &self,
        user_id: UserId,
        field: SettingField,
        value: &str,
    ) -> SettingsResult<UserSettings>;

    /// Drop all overrides for the user. The record itself stays.
    fn reset(&self, user_id: UserId) -> SettingsResult<()>;
}

/// Process-local store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    defaults: SettingsDefaults,
    records: DashMap<UserId, UserOverrides>,
}

impl InMemorySettingsStore {
    pub fn new(defaults: SettingsDefaults) -> Self {
        Self {
            defaults,
            records: DashMap::new(),
        }
    }

    /// Number of users seen so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw overrides for a user, if a record exists
    pub fn overrides(&self, user_id: UserId) -> Option<UserOverrides> {
        self.records.get(&user_id).map(|entry| *entry.value())
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn defaults(&self) -> &SettingsDefaults {
        &self.defaults
    }

    fn get_settings(&self, user_id: UserId) -> UserSettings {
        self.records
            .entry(user_id)
            .or_default()
            .resolve(&self.defaults)
    }

    fn set_setting(
        &self,
        user_id: UserId,
        field: SettingField,
        value: &str,
    ) -> SettingsResult<UserSettings> {
        let mut entry = self.records.entry(user_id).or_default();
        let mut updated = *entry;
        updated.apply(&self.defaults, field, value)?;
        *entry = updated;

        debug!(user_id, field = %field, value = %value, "Updated user setting");
        Ok(updated.resolve(&self.defaults))
    }

    fn reset(&self, user_id: UserId) -> SettingsResult<()> {
        self.records.insert(user_id, UserOverrides::default());
        debug!(user_id, "Reset user settings");
        Ok(())
    }
}
