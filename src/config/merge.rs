//! Merging YAML overrides on top of the environment.

use std::path::PathBuf;

use crate::core::markup::{Language, LegacyPolicy};
use crate::core::settings::Speed;

use super::ServerConfig;
use super::env::{self, load_from_env};
use super::yaml::YamlConfig;

/// Environment (with defaults) first, then every value present in YAML
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
    }

    if let Some(telegram) = yaml.telegram {
        if telegram.bot_token.is_some() {
            config.telegram_bot_token = telegram.bot_token;
        }
        if let Some(url) = telegram.api_url {
            config.telegram_api_url = url;
        }
        if telegram.webhook_secret.is_some() {
            config.telegram_webhook_secret = telegram.webhook_secret;
        }
    }

    if let Some(yandex) = yaml.yandex {
        if yandex.api_key.is_some() {
            config.yandex_api_key = yandex.api_key;
        }
        if yandex.folder_id.is_some() {
            config.yandex_folder_id = yandex.folder_id;
        }
        if let Some(url) = yandex.tts_url {
            config.yandex_tts_url = url;
        }
        if let Some(url) = yandex.tts_v1_url {
            config.yandex_tts_v1_url = url;
        }
        if let Some(url) = yandex.gpt_url {
            config.yandex_gpt_url = url;
        }
        if let Some(model) = yandex.gpt_model {
            config.gpt_model = model;
        }
    }

    if let Some(defaults) = yaml.defaults {
        if let Some(raw) = defaults.voice {
            config.defaults.voice = env::parse_voice("defaults.voice", &raw)?;
        }
        if let Some(raw) = defaults.role {
            config.defaults.role = env::parse_role("defaults.role", &raw)?;
        }
        if let Some(speed) = defaults.speed {
            config.defaults.speed =
                Speed::new(speed).map_err(|e| format!("Invalid defaults.speed: {e}"))?;
        }
        if let Some(raw) = defaults.format {
            config.defaults.format = env::parse_format("defaults.format", &raw)?;
        }
        if let Some(raw) = defaults.dialect {
            config.defaults.dialect = env::parse_dialect("defaults.dialect", &raw)?;
        }
        if let Some(auto_format) = defaults.auto_format {
            config.defaults.auto_format = auto_format;
        }
    }

    if let Some(markup) = yaml.markup {
        if let Some(raw) = markup.language {
            config.markup.language = Language::from_str_or_default(&raw);
        }
        if let Some(min) = markup.min_pause_ms {
            config.markup.min_pause_ms = min;
        }
        if let Some(max) = markup.max_pause_ms {
            config.markup.max_pause_ms = max;
        }
        if let Some(raw) = markup.legacy_policy {
            config.markup.legacy_policy = LegacyPolicy::from_str_or_default(&raw);
        }
    }

    if let Some(dir) = yaml.storage.and_then(|s| s.settings_dir) {
        config.settings_dir = Some(PathBuf::from(dir));
    }

    if let Some(cache) = yaml.cache {
        if let Some(ttl) = cache.ttl_seconds {
            config.cache_ttl_seconds = ttl;
        }
        if let Some(max) = cache.max_entries {
            config.cache_max_entries = max;
        }
    }

    if let Some(timeout) = yaml.request_timeout_seconds {
        config.request_timeout_seconds = timeout;
    }

    Ok(config)
}
