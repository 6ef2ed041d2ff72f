use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///
/// telegram:
///   bot_token: "123456:ABC"
///   api_url: "https://api.telegram.org"
///   webhook_secret: "random-secret"
///
/// yandex:
///   api_key: "AQVN..."
///   folder_id: "b1g..."
///   tts_url: "https://tts.api.cloud.yandex.net/tts/v3/utteranceSynthesis"
///   tts_v1_url: "https://tts.api.cloud.yandex.net/speech/v1/tts:synthesize"
///   gpt_url: "https://llm.api.cloud.yandex.net/foundationModels/v1/completion"
///   gpt_model: "yandexgpt-lite"
///
/// defaults:
///   voice: "alena"
///   role: "neutral"
///   speed: 1.0
///   format: "oggopus"
///   dialect: "inline"
///   auto_format: false
///
/// markup:
///   language: "ru"
///   min_pause_ms: 100
///   max_pause_ms: 5000
///   legacy_policy: "strip"
///
/// storage:
///   settings_dir: "/var/lib/echosage/users"
///
/// cache:
///   ttl_seconds: 3600
///   max_entries: 1000
///
/// request_timeout_seconds: 30
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub telegram: Option<TelegramYaml>,
    pub yandex: Option<YandexYaml>,
    pub defaults: Option<DefaultsYaml>,
    pub markup: Option<MarkupYaml>,
    pub storage: Option<StorageYaml>,
    pub cache: Option<CacheYaml>,
    pub request_timeout_seconds: Option<u64>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Telegram Bot API settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TelegramYaml {
    pub bot_token: Option<String>,
    pub api_url: Option<String>,
    pub webhook_secret: Option<String>,
}

/// Yandex Cloud credentials and endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YandexYaml {
    pub api_key: Option<String>,
    pub folder_id: Option<String>,
    pub tts_url: Option<String>,
    pub tts_v1_url: Option<String>,
    pub gpt_url: Option<String>,
    pub gpt_model: Option<String>,
}

/// Per-user setting defaults from YAML
///
/// Names are validated during merge, so typos fail loudly.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DefaultsYaml {
    pub voice: Option<String>,
    pub role: Option<String>,
    pub speed: Option<f32>,
    pub format: Option<String>,
    pub dialect: Option<String>,
    pub auto_format: Option<bool>,
}

/// Markup translator bounds from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MarkupYaml {
    pub language: Option<String>,
    pub min_pause_ms: Option<u32>,
    pub max_pause_ms: Option<u32>,
    pub legacy_policy: Option<String>,
}

/// Settings storage from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYaml {
    pub settings_dir: Option<String>,
}

/// Audio cache settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CacheYaml {
    /// 0 disables the cache
    pub ttl_seconds: Option<u64>,
    pub max_entries: Option<u64>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 3001

telegram:
  bot_token: "123:abc"
  webhook_secret: "hook"

yandex:
  api_key: "key"
  folder_id: "b1g"
  gpt_model: "yandexgpt"

defaults:
  voice: "jane"
  role: "evil"
  speed: 1.2
  format: "mp3"
  dialect: "legacy"
  auto_format: true

markup:
  language: "ru"
  min_pause_ms: 200
  max_pause_ms: 4000
  legacy_policy: "reject"

storage:
  settings_dir: "/data/users"

cache:
  ttl_seconds: 0
  max_entries: 10

request_timeout_seconds: 15
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.host, Some("127.0.0.1".to_string()));
        assert_eq!(server.port, Some(3001));

        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.bot_token, Some("123:abc".to_string()));
        assert!(telegram.api_url.is_none());

        let yandex = config.yandex.unwrap();
        assert_eq!(yandex.gpt_model, Some("yandexgpt".to_string()));

        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.voice, Some("jane".to_string()));
        assert_eq!(defaults.speed, Some(1.2));
        assert_eq!(defaults.auto_format, Some(true));

        let markup = config.markup.unwrap();
        assert_eq!(markup.max_pause_ms, Some(4000));
        assert_eq!(markup.legacy_policy, Some("reject".to_string()));

        assert_eq!(config.cache.unwrap().ttl_seconds, Some(0));
        assert_eq!(config.request_timeout_seconds, Some(15));
    }

    #[test]
    fn test_yaml_config_partial() {
        let yaml = r#"
defaults:
  voice: "ermil"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.server.is_none());
        assert!(config.yandex.is_none());
        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.voice, Some("ermil".to_string()));
        assert!(defaults.speed.is_none());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();

        assert!(config.server.is_none());
        assert!(config.telegram.is_none());
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: content:").unwrap();

        let result = YamlConfig::from_file(&config_path);

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }
}
