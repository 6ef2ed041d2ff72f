//! Per-user synthesis preferences.
//!
//! A record holds only the fields a user changed; everything else resolves
//! to the process-wide [`SettingsDefaults`]. Stores are passed to handlers
//! as `Arc<dyn SettingsStore>`.

mod file;
mod store;
mod types;


pub use file::FileSettingsStore;
pub use store::{InMemorySettingsStore, SettingsError, SettingsResult, SettingsStore, UserId};
pub use types::{
    AudioFormat, Role, SPEED_PRESETS, SettingField, SettingsDefaults, Speed, UserOverrides,
    UserSettings, Voice,
};
