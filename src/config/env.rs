//! Environment variable loading.

use std::path::PathBuf;
use std::str::FromStr;

use crate::core::markup::{Dialect, Language, LegacyPolicy};
use crate::core::settings::{AudioFormat, Role, Speed, Voice};

use super::ServerConfig;

type EnvResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Non-empty value of an environment variable
pub(super) fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable, naming the variable on failure
pub(super) fn parse_env<T>(key: &str) -> EnvResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {key} '{raw}': {e}").into()),
        None => Ok(None),
    }
}

pub(super) fn parse_bool(key: &str, raw: &str) -> EnvResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("Invalid {key} '{raw}': expected true or false").into()),
    }
}

pub(super) fn parse_voice(key: &str, raw: &str) -> EnvResult<Voice> {
    Voice::from_name(raw).ok_or_else(|| format!("Invalid {key} '{raw}': unknown voice").into())
}

pub(super) fn parse_role(key: &str, raw: &str) -> EnvResult<Role> {
    Role::from_name(raw).ok_or_else(|| format!("Invalid {key} '{raw}': unknown role").into())
}

pub(super) fn parse_format(key: &str, raw: &str) -> EnvResult<AudioFormat> {
    AudioFormat::from_name(raw)
        .ok_or_else(|| format!("Invalid {key} '{raw}': unknown audio format").into())
}

pub(super) fn parse_dialect(key: &str, raw: &str) -> EnvResult<Dialect> {
    Dialect::from_name(raw)
        .ok_or_else(|| format!("Invalid {key} '{raw}': expected inline or legacy").into())
}

pub(super) fn parse_speed(key: &str, raw: &str) -> EnvResult<Speed> {
    Speed::parse(raw).map_err(|e| format!("Invalid {key}: {e}").into())
}

/// Build a configuration from defaults and environment variables
pub(super) fn load_from_env() -> EnvResult<ServerConfig> {
    let mut config = ServerConfig::default();

    if let Some(host) = env_var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse_env::<u16>("PORT")? {
        config.port = port;
    }

    config.telegram_bot_token = env_var("TELEGRAM_BOT_TOKEN");
    if let Some(url) = env_var("TELEGRAM_API_URL") {
        config.telegram_api_url = url;
    }
    config.telegram_webhook_secret = env_var("TELEGRAM_WEBHOOK_SECRET");

    config.yandex_api_key = env_var("YANDEX_API_KEY");
    config.yandex_folder_id = env_var("YANDEX_FOLDER_ID");
    if let Some(url) = env_var("YANDEX_TTS_URL") {
        config.yandex_tts_url = url;
    }
    if let Some(url) = env_var("YANDEX_TTS_V1_URL") {
        config.yandex_tts_v1_url = url;
    }
    if let Some(url) = env_var("YANDEX_GPT_URL") {
        config.yandex_gpt_url = url;
    }
    if let Some(model) = env_var("GPT_MODEL") {
        config.gpt_model = model;
    }

    if let Some(raw) = env_var("DEFAULT_VOICE") {
        config.defaults.voice = parse_voice("DEFAULT_VOICE", &raw)?;
    }
    if let Some(raw) = env_var("DEFAULT_ROLE") {
        config.defaults.role = parse_role("DEFAULT_ROLE", &raw)?;
    }
    if let Some(raw) = env_var("DEFAULT_SPEED") {
        config.defaults.speed = parse_speed("DEFAULT_SPEED", &raw)?;
    }
    if let Some(raw) = env_var("DEFAULT_AUDIO_FORMAT") {
        config.defaults.format = parse_format("DEFAULT_AUDIO_FORMAT", &raw)?;
    }
    if let Some(raw) = env_var("DEFAULT_MARKUP_DIALECT") {
        config.defaults.dialect = parse_dialect("DEFAULT_MARKUP_DIALECT", &raw)?;
    }
    if let Some(raw) = env_var("ENABLE_AUTO_FORMAT") {
        config.defaults.auto_format = parse_bool("ENABLE_AUTO_FORMAT", &raw)?;
    }

    if let Some(raw) = env_var("TTS_LANGUAGE") {
        config.markup.language = Language::from_str_or_default(&raw);
    }
    if let Some(min) = parse_env::<u32>("PAUSE_MIN_MS")? {
        config.markup.min_pause_ms = min;
    }
    if let Some(max) = parse_env::<u32>("PAUSE_MAX_MS")? {
        config.markup.max_pause_ms = max;
    }
    if let Some(raw) = env_var("LEGACY_MARKUP_POLICY") {
        config.markup.legacy_policy = LegacyPolicy::from_str_or_default(&raw);
    }

    config.settings_dir = env_var("SETTINGS_DIR").map(PathBuf::from);
    if let Some(ttl) = parse_env::<u64>("CACHE_TTL_SECONDS")? {
        config.cache_ttl_seconds = ttl;
    }
    if let Some(max) = parse_env::<u64>("CACHE_MAX_ENTRIES")? {
        config.cache_max_entries = max;
    }
    if let Some(timeout) = parse_env::<u64>("REQUEST_TIMEOUT_SECONDS")? {
        config.request_timeout_seconds = timeout;
    }

    Ok(config)
}
