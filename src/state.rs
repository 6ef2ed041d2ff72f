use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{info, warn};

use crate::bot::Bot;
use crate::config::ServerConfig;
use crate::core::formatter::{RuleFormatter, SharedFormatter, YandexGptFormatter};
use crate::core::settings::{FileSettingsStore, InMemorySettingsStore, SettingsStore};
use crate::core::speech::SpeechPipeline;
use crate::core::tts::{CachedSynthesizer, SharedSynthesizer, create_synthesizer};
use crate::telegram::TelegramClient;

/// Shared state handed to every request handler
pub struct AppState {
    pub config: ServerConfig,
    pub settings: Arc<dyn SettingsStore>,
    pub pipeline: Arc<SpeechPipeline>,
    /// Absent when no bot token is configured
    pub bot: Option<Arc<Bot>>,
}

impl AppState {
    /// Build every service from the configuration
    pub fn new(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let settings: Arc<dyn SettingsStore> = match &config.settings_dir {
            Some(dir) => {
                let store = FileSettingsStore::open(dir.clone(), config.defaults)
                    .with_context(|| format!("Failed to open settings directory {}", dir.display()))?;
                info!(dir = %dir.display(), "Using file settings store");
                Arc::new(store)
            }
            None => {
                warn!("SETTINGS_DIR not set, user settings are kept in memory only");
                Arc::new(InMemorySettingsStore::new(config.defaults))
            }
        };

        let speechkit = config
            .speechkit_config()
            .ok_or_else(|| anyhow!("YANDEX_API_KEY is required"))?;
        let synthesizer = create_synthesizer("yandex", speechkit)?;
        let synthesizer = CachedSynthesizer::wrap(
            synthesizer,
            Duration::from_secs(config.cache_ttl_seconds),
            config.cache_max_entries,
        );

        let formatter: SharedFormatter = match config.gpt_config() {
            Some(gpt) => {
                info!(model = %config.gpt_model, "Auto-format uses YandexGPT");
                Arc::new(YandexGptFormatter::new(gpt)?)
            }
            None => {
                info!("YANDEX_FOLDER_ID not set, auto-format uses punctuation rules only");
                Arc::new(RuleFormatter::new())
            }
        };

        let telegram = match &config.telegram_bot_token {
            Some(token) => Some(Arc::new(TelegramClient::new(
                token,
                &config.telegram_api_url,
                Duration::from_secs(config.request_timeout_seconds),
            )?)),
            None => {
                warn!("TELEGRAM_BOT_TOKEN not set, bot updates are disabled");
                None
            }
        };

        Ok(Self::from_parts(
            config,
            settings,
            synthesizer,
            Some(formatter),
            telegram,
        ))
    }

    /// Assemble state from ready-made services
    pub fn from_parts(
        config: ServerConfig,
        settings: Arc<dyn SettingsStore>,
        synthesizer: SharedSynthesizer,
        formatter: Option<SharedFormatter>,
        telegram: Option<Arc<TelegramClient>>,
    ) -> Arc<Self> {
        let pipeline = Arc::new(SpeechPipeline::new(
            settings.clone(),
            synthesizer,
            formatter,
            config.markup,
        ));
        let bot = telegram.map(|client| Arc::new(Bot::new(client, settings.clone(), pipeline.clone())));

        Arc::new(Self {
            config,
            settings,
            pipeline,
            bot,
        })
    }
}
