//! YandexGPT-backed formatter.
//!
//! Complex text (several sentences, heavy punctuation, verse) is sent to the
//! completion API with instructions to insert markup. Simple text, and text
//! whose completion request fails for a transient reason, goes through
//! [`RuleFormatter`] instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use zeroize::Zeroize;

use super::rules::RuleFormatter;
use super::{FormatError, FormatResult, TextFormatter};

/// Completion endpoint
pub const YANDEX_GPT_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

const SYSTEM_PROMPT: &str = "Ты готовишь тексты для синтеза речи Yandex SpeechKit. \
Расставляй разметку так, чтобы речь звучала естественно и чётко, как живое общение.";

const USER_PROMPT: &str = "Добавь в русский текст разметку для синтеза речи.\n\n\
Разрешённая разметка:\n\
1. sil<[t]> — пауза, t в миллисекундах от 100 до 5000\n\
2. <[tiny]>, <[small]>, <[medium]>, <[large]>, <[huge]> — контекстная пауза\n\
3. + перед ударной гласной в трудных словах (м+олоко)\n\
4. **слово** — выделение эмоционально важного слова\n\n\
Правила:\n\
- после точки пауза 300-500 мс, после запятой 150-200 мс\n\
- не ставь две паузы подряд и не начинай текст с паузы\n\
- не вкладывай разметку внутрь **выделения**\n\
- не меняй сами слова и не добавляй пояснений\n\n\
Верни только размеченный текст.\n\nТекст: ";

#[derive(Clone)]
pub struct GptConfig {
    pub api_key: String,
    pub folder_id: String,
    /// Model name, e.g. `yandexgpt-lite`
    pub model: String,
    pub url: String,
    pub request_timeout_secs: u64,
    pub temperature: f32,
}

impl Default for GptConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            folder_id: String::new(),
            model: "yandexgpt-lite".to_string(),
            url: YANDEX_GPT_URL.to_string(),
            request_timeout_secs: 30,
            temperature: 0.1,
        }
    }
}

impl std::fmt::Debug for GptConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GptConfig")
            .field("api_key", &"<redacted>")
            .field("folder_id", &self.folder_id)
            .field("model", &self.model)
            .field("url", &self.url)
            .finish()
    }
}

impl Drop for GptConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

impl GptConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("Yandex API key is required for auto-formatting".to_string());
        }
        if self.folder_id.trim().is_empty() {
            return Err("YANDEX_FOLDER_ID is required for auto-formatting".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("GPT model name must not be empty".to_string());
        }
        Ok(())
    }

    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.folder_id, self.model)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    message: AlternativeMessage,
}

#[derive(Debug, Deserialize)]
struct AlternativeMessage {
    text: String,
}

// =============================================================================
// Formatter
// =============================================================================

pub struct YandexGptFormatter {
    config: GptConfig,
    client: Client,
    rules: RuleFormatter,
}

impl YandexGptFormatter {
    pub fn new(config: GptConfig) -> FormatResult<Self> {
        config.validate().map_err(FormatError::InvalidConfiguration)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FormatError::InvalidConfiguration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            config,
            client,
            rules: RuleFormatter::new(),
        })
    }

    /// Ask the model to annotate `text`
    pub async fn complete(&self, text: &str) -> FormatResult<String> {
        let prompt = format!("{USER_PROMPT}{text}");
        let body = CompletionRequest {
            model_uri: self.config.model_uri(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.config.temperature,
                max_tokens: (text.chars().count() * 2).max(64),
            },
            messages: [
                Message {
                    role: "system",
                    text: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    text: &prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.config.url)
            .header("Authorization", format!("Api-Key {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| FormatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "YandexGPT returned error");
            return Err(FormatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| FormatError::InvalidResponse(e.to_string()))?;
        let text = parsed
            .result
            .alternatives
            .into_iter()
            .next()
            .map(|a| a.message.text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(FormatError::InvalidResponse(
                "completion has no text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl TextFormatter for YandexGptFormatter {
    async fn format(&self, text: &str) -> FormatResult<String> {
        let cleaned = self.rules.clean(text);
        if !self.rules.is_complex(text) {
            debug!(text_len = cleaned.len(), "Simple text, using rule formatter");
            return Ok(self.rules.apply(&cleaned));
        }

        match self.complete(&cleaned).await {
            Ok(annotated) => {
                debug!(
                    input_len = cleaned.len(),
                    output_len = annotated.len(),
                    "Text annotated by YandexGPT"
                );
                Ok(annotated)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(error = %e, "YandexGPT formatting failed, falling back to rules");
                Ok(self.rules.apply(&cleaned))
            }
        }
    }

    fn name(&self) -> &'static str {
        "yandex-gpt"
    }
}
