//! Configuration module for the EchoSage server
//!
//! Configuration comes from .env files, environment variables and an optional
//! YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `yaml`: YAML configuration file loading
//! - `merge`: Applying YAML overrides on top of the environment
//!
//! # Example
//! ```rust,no_run
//! use echosage::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use zeroize::Zeroize;

use crate::core::formatter::{GptConfig, YANDEX_GPT_URL};
use crate::core::markup::MarkupConfig;
use crate::core::settings::SettingsDefaults;
use crate::core::tts::{SpeechKitConfig, YANDEX_TTS_V1_URL, YANDEX_TTS_V3_URL};

mod env;
mod merge;
mod yaml;

pub use yaml::YamlConfig;

/// Telegram Bot API base URL
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Default GPT model for auto-formatting
pub const DEFAULT_GPT_MODEL: &str = "yandexgpt-lite";

/// Server configuration
///
/// Everything needed to run the bot:
/// - HTTP listener (host, port)
/// - Telegram credentials and webhook secret
/// - Yandex Cloud credentials and endpoints (SpeechKit, YandexGPT)
/// - Per-user setting defaults and markup bounds
/// - Settings storage and audio cache
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Telegram
    pub telegram_bot_token: Option<String>,
    pub telegram_api_url: String,
    /// Expected value of `X-Telegram-Bot-Api-Secret-Token` on webhook calls
    pub telegram_webhook_secret: Option<String>,

    // Yandex Cloud
    pub yandex_api_key: Option<String>,
    /// Required by v1 and YandexGPT when the key belongs to a user account
    pub yandex_folder_id: Option<String>,
    pub yandex_tts_url: String,
    pub yandex_tts_v1_url: String,
    pub yandex_gpt_url: String,
    pub gpt_model: String,

    // Synthesis defaults
    pub defaults: SettingsDefaults,
    pub markup: MarkupConfig,

    // Storage
    /// Directory for per-user settings files. In-memory store when unset.
    pub settings_dir: Option<PathBuf>,

    // Cache
    /// Audio cache TTL; 0 disables the cache
    pub cache_ttl_seconds: u64,
    pub cache_max_entries: u64,

    /// Timeout for every outbound HTTP request
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            telegram_bot_token: None,
            telegram_api_url: TELEGRAM_API_URL.to_string(),
            telegram_webhook_secret: None,
            yandex_api_key: None,
            yandex_folder_id: None,
            yandex_tts_url: YANDEX_TTS_V3_URL.to_string(),
            yandex_tts_v1_url: YANDEX_TTS_V1_URL.to_string(),
            yandex_gpt_url: YANDEX_GPT_URL.to_string(),
            gpt_model: DEFAULT_GPT_MODEL.to_string(),
            defaults: SettingsDefaults::default(),
            markup: MarkupConfig::default(),
            settings_dir: None,
            cache_ttl_seconds: 3600,
            cache_max_entries: 1000,
            request_timeout_seconds: 30,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("telegram_bot_token", &redact(&self.telegram_bot_token))
            .field("telegram_api_url", &self.telegram_api_url)
            .field("telegram_webhook_secret", &redact(&self.telegram_webhook_secret))
            .field("yandex_api_key", &redact(&self.yandex_api_key))
            .field("yandex_folder_id", &self.yandex_folder_id)
            .field("yandex_tts_url", &self.yandex_tts_url)
            .field("yandex_tts_v1_url", &self.yandex_tts_v1_url)
            .field("yandex_gpt_url", &self.yandex_gpt_url)
            .field("gpt_model", &self.gpt_model)
            .field("defaults", &self.defaults)
            .field("markup", &self.markup)
            .field("settings_dir", &self.settings_dir)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

/// Zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        if let Some(ref mut token) = self.telegram_bot_token {
            token.zeroize();
        }
        if let Some(ref mut secret) = self.telegram_webhook_secret {
            secret.zeroize();
        }
        if let Some(ref mut key) = self.yandex_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only
    ///
    /// The .env file is loaded in main.rs before this is called.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the merged configuration is consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be greater than zero".to_string());
        }
        if self.request_timeout_seconds == 0 {
            return Err("REQUEST_TIMEOUT_SECONDS must be greater than zero".to_string());
        }
        self.defaults.validate()?;
        self.markup.validate()?;
        if self.gpt_model.trim().is_empty() {
            return Err("GPT_MODEL must not be empty".to_string());
        }
        Ok(())
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// SpeechKit client configuration, if a Yandex key is present
    pub fn speechkit_config(&self) -> Option<SpeechKitConfig> {
        let api_key = self.yandex_api_key.as_ref()?;
        let mut config = SpeechKitConfig::new(api_key.clone());
        config.folder_id = self.yandex_folder_id.clone();
        config.v3_url = self.yandex_tts_url.clone();
        config.v1_url = self.yandex_tts_v1_url.clone();
        config.request_timeout_secs = self.request_timeout_seconds;
        Some(config)
    }

    /// YandexGPT configuration. Needs both the key and the folder id.
    pub fn gpt_config(&self) -> Option<GptConfig> {
        let api_key = self.yandex_api_key.as_ref()?;
        let folder_id = self.yandex_folder_id.as_ref()?;
        let mut config = GptConfig::default();
        config.api_key = api_key.clone();
        config.folder_id = folder_id.clone();
        config.model = self.gpt_model.clone();
        config.url = self.yandex_gpt_url.clone();
        config.request_timeout_secs = self.request_timeout_seconds;
        Some(config)
    }

    pub fn is_webhook_secret_set(&self) -> bool {
        self.telegram_webhook_secret
            .as_ref()
            .is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markup::{Dialect, LegacyPolicy};
    use crate::core::settings::{Role, Voice};
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "HOST",
        "PORT",
        "TELEGRAM_BOT_TOKEN",
        "TELEGRAM_API_URL",
        "TELEGRAM_WEBHOOK_SECRET",
        "YANDEX_API_KEY",
        "YANDEX_FOLDER_ID",
        "YANDEX_TTS_URL",
        "YANDEX_TTS_V1_URL",
        "YANDEX_GPT_URL",
        "GPT_MODEL",
        "DEFAULT_VOICE",
        "DEFAULT_ROLE",
        "DEFAULT_SPEED",
        "DEFAULT_AUDIO_FORMAT",
        "DEFAULT_MARKUP_DIALECT",
        "ENABLE_AUTO_FORMAT",
        "TTS_LANGUAGE",
        "PAUSE_MIN_MS",
        "PAUSE_MAX_MS",
        "LEGACY_MARKUP_POLICY",
        "SETTINGS_DIR",
        "CACHE_TTL_SECONDS",
        "CACHE_MAX_ENTRIES",
        "REQUEST_TIMEOUT_SECONDS",
    ];

    fn cleanup_env_vars() {
        unsafe {
            for var in ENV_VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.telegram_api_url, TELEGRAM_API_URL);
        assert_eq!(config.defaults, SettingsDefaults::default());
        assert_eq!(config.markup, MarkupConfig::default());
        assert!(config.speechkit_config().is_none());
        assert!(config.gpt_config().is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_values() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "9000");
            env::set_var("YANDEX_API_KEY", "env-key");
            env::set_var("YANDEX_FOLDER_ID", "b1g");
            env::set_var("DEFAULT_VOICE", "ermil");
            env::set_var("DEFAULT_ROLE", "good");
            env::set_var("DEFAULT_SPEED", "1,2");
            env::set_var("DEFAULT_MARKUP_DIALECT", "ssml");
            env::set_var("ENABLE_AUTO_FORMAT", "true");
            env::set_var("PAUSE_MAX_MS", "3000");
            env::set_var("LEGACY_MARKUP_POLICY", "reject");
            env::set_var("CACHE_TTL_SECONDS", "0");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.defaults.voice, Voice::Ermil);
        assert_eq!(config.defaults.role, Role::Good);
        assert_eq!(config.defaults.speed.value(), 1.2);
        assert_eq!(config.defaults.dialect, Dialect::Legacy);
        assert!(config.defaults.auto_format);
        assert_eq!(config.markup.max_pause_ms, 3000);
        assert_eq!(config.markup.legacy_policy, LegacyPolicy::Reject);
        assert_eq!(config.cache_ttl_seconds, 0);

        let speechkit = config.speechkit_config().unwrap();
        assert_eq!(speechkit.api_key, "env-key");
        assert_eq!(speechkit.folder_id.as_deref(), Some("b1g"));
        assert_eq!(config.gpt_config().unwrap().model_uri(), "gpt://b1g/yandexgpt-lite");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_values() {
        cleanup_env_vars();

        unsafe { env::set_var("DEFAULT_VOICE", "nobody") };
        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("DEFAULT_VOICE"));
        cleanup_env_vars();

        unsafe { env::set_var("PORT", "eighty") };
        assert!(ServerConfig::from_env().is_err());
        cleanup_env_vars();

        unsafe { env::set_var("DEFAULT_SPEED", "7") };
        assert!(ServerConfig::from_env().is_err());
        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_incompatible_default_role_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("DEFAULT_VOICE", "john");
            env::set_var("DEFAULT_ROLE", "evil");
        }

        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("not available"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_inverted_pause_bounds_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PAUSE_MIN_MS", "800");
            env::set_var("PAUSE_MAX_MS", "500");
        }

        assert!(ServerConfig::from_env().is_err());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 3001

yandex:
  api_key: "yaml-key"

defaults:
  voice: "filipp"
  speed: 0.8

storage:
  settings_dir: "/tmp/echosage-users"
"#;
        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("YANDEX_API_KEY", "env-key");
            env::set_var("YANDEX_FOLDER_ID", "env-folder");
        }

        let config = ServerConfig::from_file(&config_path).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3001);
        assert_eq!(config.yandex_api_key.as_deref(), Some("yaml-key"));
        // Not in YAML, kept from ENV
        assert_eq!(config.yandex_folder_id.as_deref(), Some("env-folder"));
        assert_eq!(config.defaults.voice, Voice::Filipp);
        assert_eq!(config.defaults.speed.value(), 0.8);
        assert_eq!(
            config.settings_dir,
            Some(PathBuf::from("/tmp/echosage-users"))
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let result = ServerConfig::from_file(&PathBuf::from("/nonexistent/config.yaml"));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = ServerConfig::default();
        config.telegram_bot_token = Some("123:SECRET".to_string());
        config.yandex_api_key = Some("AQVN-secret".to_string());

        let debug = format!("{config:?}");
        assert!(!debug.contains("SECRET"));
        assert!(!debug.contains("AQVN"));
        assert!(debug.contains("<redacted>"));
    }
}
