use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};
use zeroize::Zeroize;

use super::types::{ApiResponse, ChatAction, InlineKeyboardMarkup, Message, Update};
use crate::core::settings::AudioFormat;

pub type TelegramResult<T> = Result<T, TelegramError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelegramError {
    #[error("Invalid Telegram configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Telegram request failed: {0}")]
    Network(String),

    #[error("Telegram API error ({code}): {description}")]
    Api { code: u16, description: String },

    #[error("Unexpected Telegram response: {0}")]
    InvalidResponse(String),
}

/// Thin Bot API client. One instance is shared by every handler.
pub struct TelegramClient {
    client: Client,
    /// `<api_url>/bot<token>`
    base_url: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &"<redacted>")
            .finish()
    }
}

impl Drop for TelegramClient {
    fn drop(&mut self) {
        self.base_url.zeroize();
    }
}

impl TelegramClient {
    pub fn new(token: &str, api_url: &str, timeout: Duration) -> TelegramResult<Self> {
        if token.trim().is_empty() {
            return Err(TelegramError::InvalidConfiguration(
                "TELEGRAM_BOT_TOKEN is required".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| {
                TelegramError::InvalidConfiguration(format!("Failed to create HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token.trim()),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> TelegramResult<T> {
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            error!(method = method, status = %status, error = %e, "Unreadable Telegram response");
            TelegramError::InvalidResponse(e.to_string())
        })?;

        if !envelope.ok {
            let code = envelope.error_code.unwrap_or(status.as_u16());
            let description = envelope.description.unwrap_or_default();
            error!(method = method, code = code, description = %description, "Telegram API error");
            return Err(TelegramError::Api { code, description });
        }
        envelope
            .result
            .ok_or_else(|| TelegramError::InvalidResponse(format!("{method}: missing result")))
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> TelegramResult<T> {
        debug!(method = method, "Telegram API call");
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(method = method, error = %e, "Telegram request failed");
                TelegramError::Network(e.to_string())
            })?;
        Self::decode(method, response).await
    }

    /// Send an HTML-formatted message
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> TelegramResult<Message> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = json!(markup);
        }
        self.call("sendMessage", &body).await
    }

    /// Upload synthesized audio. OGG/Opus goes out as a voice message,
    /// other formats as an audio file.
    pub async fn send_voice(
        &self,
        chat_id: i64,
        audio: Bytes,
        format: AudioFormat,
        reply_to: Option<i64>,
    ) -> TelegramResult<Message> {
        let (method, field) = match format {
            AudioFormat::OggOpus => ("sendVoice", "voice"),
            _ => ("sendAudio", "audio"),
        };
        let part = Part::bytes(audio.to_vec())
            .file_name(format!("speech.{}", format.file_extension()))
            .mime_str(format.mime_type())
            .map_err(|e| TelegramError::InvalidConfiguration(e.to_string()))?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(field, part);
        if let Some(message_id) = reply_to {
            form = form.text("reply_to_message_id", message_id.to_string());
        }

        debug!(method = method, bytes = audio.len(), "Uploading audio");
        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(method = method, error = %e, "Telegram upload failed");
                TelegramError::Network(e.to_string())
            })?;
        Self::decode(method, response).await
    }

    pub async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> TelegramResult<bool> {
        self.call(
            "sendChatAction",
            &json!({ "chat_id": chat_id, "action": action.as_str() }),
        )
        .await
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> TelegramResult<bool> {
        self.call(
            "answerCallbackQuery",
            &json!({ "callback_query_id": callback_query_id }),
        )
        .await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> TelegramResult<serde_json::Value> {
        self.call(
            "editMessageText",
            &json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
        )
        .await
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> TelegramResult<Vec<Update>> {
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs + 10))
            .json(&json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }))
            .send()
            .await
            .map_err(|e| TelegramError::Network(e.to_string()))?;
        Self::decode("getUpdates", response).await
    }

    /// Polling and webhooks are mutually exclusive on Telegram's side
    pub async fn delete_webhook(&self) -> TelegramResult<bool> {
        self.call("deleteWebhook", &json!({})).await
    }
}
