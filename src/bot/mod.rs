//! Chat front end: turns Telegram updates into settings changes and
//! synthesized voice replies.

pub mod commands;
pub mod keyboard;
pub mod texts;


use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::core::settings::{SettingField, SettingsError, SettingsStore, UserId, UserSettings};
use crate::core::speech::{SpeakMode, SpeechError, SpeechPipeline};
use crate::core::tts::yandex::is_text_too_long;
use crate::core::tts::TTSError;
use crate::telegram::{
    CallbackQuery, ChatAction, InlineKeyboardMarkup, Message, TelegramClient, TelegramResult,
    Update,
};

pub use commands::Command;

/// Long-poll timeout for getUpdates
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct Bot {
    telegram: Arc<TelegramClient>,
    settings: Arc<dyn SettingsStore>,
    pipeline: Arc<SpeechPipeline>,
}

impl Bot {
    pub fn new(
        telegram: Arc<TelegramClient>,
        settings: Arc<dyn SettingsStore>,
        pipeline: Arc<SpeechPipeline>,
    ) -> Self {
        Self {
            telegram,
            settings,
            pipeline,
        }
    }

    /// Process one update. Only Telegram delivery failures are returned;
    /// user mistakes and synthesis failures are answered in the chat.
    pub async fn handle_update(&self, update: &Update) -> TelegramResult<()> {
        if let Some(query) = &update.callback_query {
            return self.handle_callback(query).await;
        }
        if let Some(message) = &update.message {
            return self.handle_message(message).await;
        }
        debug!(update_id = update.update_id, "Ignoring update without message");
        Ok(())
    }

    /// Poll getUpdates until the task is cancelled
    pub async fn run_polling(&self) -> TelegramResult<()> {
        self.telegram.delete_webhook().await?;
        info!("Bot polling started");

        let mut offset = 0;
        loop {
            let updates = match self.telegram.get_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };
            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Err(e) = self.handle_update(&update).await {
                    error!(update_id = update.update_id, error = %e, "Failed to handle update");
                }
            }
        }
    }

    // =========================================================================
    // Messages
    // =========================================================================

    async fn handle_message(&self, message: &Message) -> TelegramResult<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let user_id = message.from.as_ref().map_or(chat_id, |u| u.id);

        match Command::parse(text) {
            Some(command) => {
                debug!(user_id, command = command.name(), "Command received");
                self.handle_command(chat_id, user_id, message.message_id, command)
                    .await
            }
            None => self.handle_text(chat_id, user_id, message.message_id, text).await,
        }
    }

    async fn reply(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> TelegramResult<()> {
        self.telegram.send_message(chat_id, text, markup).await?;
        Ok(())
    }

    async fn handle_command(
        &self,
        chat_id: i64,
        user_id: UserId,
        message_id: i64,
        command: Command,
    ) -> TelegramResult<()> {
        match command {
            Command::Start => self.reply(chat_id, texts::WELCOME, None).await,
            Command::Help => {
                self.reply(chat_id, &texts::help(self.settings.defaults()), None)
                    .await
            }
            Command::SetVoice => {
                self.reply(chat_id, texts::CHOOSE_VOICE, Some(&keyboard::voice_keyboard()))
                    .await
            }
            Command::SetRole => {
                let voice = self.settings.get_settings(user_id).voice;
                self.reply(
                    chat_id,
                    &texts::role_prompt(voice.display_name()),
                    Some(&keyboard::role_keyboard(voice)),
                )
                .await
            }
            Command::SetSpeed => {
                self.reply(chat_id, texts::CHOOSE_SPEED, Some(&keyboard::speed_keyboard()))
                    .await
            }
            Command::SetFormat => {
                self.reply(chat_id, texts::CHOOSE_FORMAT, Some(&keyboard::format_keyboard()))
                    .await
            }
            Command::SetDialect => {
                self.reply(
                    chat_id,
                    texts::CHOOSE_DIALECT,
                    Some(&keyboard::dialect_keyboard()),
                )
                .await
            }
            Command::Settings => {
                let settings = self.settings.get_settings(user_id);
                self.reply(chat_id, &texts::settings(&settings), None).await
            }
            Command::Reset => match self.settings.reset(user_id) {
                Ok(()) => {
                    info!(user_id, "Settings reset");
                    let settings = self.settings.get_settings(user_id);
                    self.reply(chat_id, &texts::settings_reset(&settings), None)
                        .await
                }
                Err(e) => {
                    error!(user_id, error = %e, "Failed to reset settings");
                    self.reply(chat_id, texts::RESET_FAILED, None).await
                }
            },
            Command::SpeakSsml(markup) => {
                if markup.is_empty() {
                    return self.reply(chat_id, texts::SSML_USAGE, None).await;
                }
                if !texts::is_wrapped_ssml(&markup) {
                    return self.reply(chat_id, texts::SSML_NOT_WRAPPED, None).await;
                }
                self.speak(chat_id, user_id, message_id, &markup, SpeakMode::Ssml)
                    .await
            }
            Command::ToggleFormat => {
                match self
                    .settings
                    .set_setting(user_id, SettingField::AutoFormat, "toggle")
                {
                    Ok(settings) => {
                        self.reply(
                            chat_id,
                            &texts::auto_format_toggled(settings.auto_format),
                            None,
                        )
                        .await
                    }
                    Err(e) => {
                        error!(user_id, error = %e, "Failed to toggle auto-format");
                        self.reply(chat_id, texts::SETTING_FAILED, None).await
                    }
                }
            }
            Command::DemoMarkup => {
                let markup = self.pipeline.markup_config();
                self.reply(
                    chat_id,
                    &texts::demo_markup(markup.min_pause_ms, markup.max_pause_ms),
                    None,
                )
                .await
            }
            Command::Unknown(_) => self.reply(chat_id, texts::UNKNOWN_COMMAND, None).await,
        }
    }

    async fn handle_text(
        &self,
        chat_id: i64,
        user_id: UserId,
        message_id: i64,
        text: &str,
    ) -> TelegramResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        if texts::is_wrapped_ssml(text) {
            return self.reply(chat_id, &texts::ssml_hint(text), None).await;
        }
        if !texts::looks_russian(text) {
            return self.reply(chat_id, texts::NOT_RUSSIAN, None).await;
        }
        self.speak(chat_id, user_id, message_id, text, SpeakMode::Plain)
            .await
    }

    async fn speak(
        &self,
        chat_id: i64,
        user_id: UserId,
        message_id: i64,
        text: &str,
        mode: SpeakMode,
    ) -> TelegramResult<()> {
        if let Err(e) = self
            .telegram
            .send_chat_action(chat_id, ChatAction::UploadVoice)
            .await
        {
            warn!(chat_id, error = %e, "Failed to send chat action");
        }

        match self.pipeline.speak(user_id, text, mode).await {
            Ok(output) => {
                self.telegram
                    .send_voice(chat_id, output.audio, output.format, Some(message_id))
                    .await?;
                if !output.warnings.is_empty() {
                    let tokens: Vec<&str> =
                        output.warnings.iter().map(|w| w.token.as_str()).collect();
                    self.reply(chat_id, &texts::dropped_marks(&tokens), None)
                        .await?;
                }
                Ok(())
            }
            Err(e) => {
                warn!(user_id, error = %e, "Speech request failed");
                self.reply(chat_id, &error_reply(&e, mode), None).await
            }
        }
    }

    // =========================================================================
    // Inline keyboard callbacks
    // =========================================================================

    async fn handle_callback(&self, query: &CallbackQuery) -> TelegramResult<()> {
        if let Err(e) = self.telegram.answer_callback_query(&query.id).await {
            warn!(error = %e, "Failed to answer callback query");
        }

        let Some((field, value)) = query.data.as_deref().and_then(keyboard::parse_callback)
        else {
            debug!(data = ?query.data, "Ignoring callback without setting data");
            return Ok(());
        };
        let Some(message) = &query.message else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let user_id = query.from.id;

        let reply = match self.settings.set_setting(user_id, field, value) {
            Ok(updated) => {
                info!(user_id, field = %field, value = value, "Setting changed");
                let confirmation = texts::setting_changed(field, &display_value(field, &updated));
                self.telegram
                    .edit_message_text(chat_id, message.message_id, &confirmation)
                    .await?;

                if field == SettingField::Voice {
                    self.reply(
                        chat_id,
                        &texts::role_prompt_after_voice_change(updated.voice.display_name()),
                        Some(&keyboard::role_keyboard(updated.voice)),
                    )
                    .await?;
                }
                return Ok(());
            }
            Err(SettingsError::IncompatibleRole { voice, role }) => {
                texts::role_unavailable(role.display_name(), voice.display_name())
            }
            Err(SettingsError::InvalidValue { .. }) => texts::invalid_value(field),
            Err(e) => {
                error!(user_id, field = %field, error = %e, "Failed to store setting");
                texts::SETTING_FAILED.to_string()
            }
        };
        self.telegram
            .edit_message_text(chat_id, message.message_id, &reply)
            .await?;
        Ok(())
    }
}

/// Human-readable value of `field` for confirmations
fn display_value(field: SettingField, settings: &UserSettings) -> String {
    match field {
        SettingField::Voice => settings.voice.display_name().to_string(),
        SettingField::Role => settings.role.display_name().to_string(),
        SettingField::Speed => settings.speed.display_name(),
        SettingField::Format => texts::format_label(settings.format).to_string(),
        SettingField::Dialect => texts::dialect_label(settings.dialect).to_string(),
        SettingField::AutoFormat => {
            if settings.auto_format { "вкл" } else { "выкл" }.to_string()
        }
    }
}

/// Chat reply for a failed speech request
fn error_reply(error: &SpeechError, mode: SpeakMode) -> String {
    match error {
        SpeechError::Markup(e) => texts::markup_error(e),
        SpeechError::EmptyText => texts::NOTHING_TO_SAY.to_string(),
        SpeechError::Format(_) => texts::FORMATTER_FAILED.to_string(),
        SpeechError::Synthesis(e) if is_text_too_long(e) => texts::TOO_LONG.to_string(),
        SpeechError::Synthesis(e) if mode == SpeakMode::Ssml => {
            if e.to_string().to_lowercase().contains("folder") {
                texts::SSML_FOLDER_MISSING.to_string()
            } else if matches!(e, TTSError::InvalidConfiguration(_)) {
                texts::SSML_REJECTED.to_string()
            } else {
                texts::SPEECHKIT_FAILED.to_string()
            }
        }
        SpeechError::Synthesis(_) => texts::SPEECHKIT_FAILED.to_string(),
    }
}
