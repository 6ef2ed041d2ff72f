//! Yandex SpeechKit provider.
//!
//! Inline-dialect payloads go to the v3 `utteranceSynthesis` endpoint; legacy
//! SSML payloads go to the v1 `tts:synthesize` endpoint. Both authenticate
//! with `Authorization: Api-Key <key>`.
//!
//! # Example
//!
//! ```rust,ignore
//! use echosage::core::tts::{SpeechSynthesizer, SynthesisRequest};
//! use echosage::core::tts::yandex::{SpeechKitConfig, YandexSpeechKit};
//!
//! let tts = YandexSpeechKit::new(SpeechKitConfig::new(std::env::var("YANDEX_API_KEY")?))?;
//! let audio = tts.synthesize(&request).await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

use super::config::{
    MAX_TEXT_LENGTH, OutputAudioSpec, SpeechKitConfig, UtteranceRequest, build_hints, v1_format,
};
use crate::core::markup::Dialect;
use crate::core::settings::{AudioFormat, Role};
use crate::core::tts::base::{SpeechSynthesizer, SynthesisRequest, TTSError, TTSResult};

// =============================================================================
// Streaming response
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamLine {
    audio_chunk: Option<AudioChunk>,
    result: Option<StreamResult>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamResult {
    audio_chunk: Option<AudioChunk>,
}

#[derive(Debug, Deserialize)]
struct AudioChunk {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamError {
    #[serde(default)]
    message: String,
    http_code: Option<u16>,
}

/// Concatenate the base64 audio chunks of a v3 JSON-lines response.
///
/// Unparseable lines and undecodable chunks are logged and skipped; an
/// inline error object fails the whole response.
pub fn decode_audio_stream(body: &str) -> TTSResult<Bytes> {
    let mut audio = BytesMut::new();
    let mut chunks = 0usize;

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed: StreamLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                let preview: String = line.chars().take(100).collect();
                warn!(error = %e, line = %preview, "Skipping undecodable response line");
                continue;
            }
        };

        if let Some(err) = parsed.error {
            return Err(match err.http_code {
                Some(code) => classify_status(code, &err.message),
                None => TTSError::ProviderError(err.message),
            });
        }

        let chunk = parsed
            .audio_chunk
            .or_else(|| parsed.result.and_then(|r| r.audio_chunk));
        let Some(chunk) = chunk else {
            continue;
        };
        match BASE64.decode(chunk.data.as_bytes()) {
            Ok(bytes) => {
                audio.extend_from_slice(&bytes);
                chunks += 1;
            }
            Err(e) => warn!(error = %e, "Skipping audio chunk with invalid base64"),
        }
    }

    if chunks == 0 {
        return Err(TTSError::AudioGenerationFailed(
            "Response contained no audio chunks".to_string(),
        ));
    }
    debug!(chunks, audio_bytes = audio.len(), "Decoded streamed audio");
    Ok(audio.freeze())
}

/// Map an HTTP status from SpeechKit onto a [`TTSError`].
pub fn classify_status(status: u16, body: &str) -> TTSError {
    match status {
        400 => TTSError::InvalidConfiguration(format!("Bad request: {body}")),
        401 => TTSError::ConnectionFailed(format!("Authentication failed - check API key: {body}")),
        403 => TTSError::ConnectionFailed(format!(
            "Access forbidden - check folder permissions: {body}"
        )),
        404 => TTSError::InvalidConfiguration(format!("Endpoint not found: {body}")),
        429 => TTSError::ProviderError(format!("Rate limit exceeded: {body}")),
        500..=599 => TTSError::ProviderError(format!("Server error ({status}): {body}")),
        _ => TTSError::ProviderError(format!("TTS API error ({status}): {body}")),
    }
}

// =============================================================================
// Provider
// =============================================================================

pub struct YandexSpeechKit {
    config: SpeechKitConfig,
    client: Client,
    request_counter: AtomicU64,
}

impl YandexSpeechKit {
    pub fn new(config: SpeechKitConfig) -> TTSResult<Self> {
        config.validate().map_err(TTSError::InvalidConfiguration)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| TTSError::ConnectionFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            request_counter: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &SpeechKitConfig {
        &self.config
    }

    fn auth_header(&self) -> String {
        format!("Api-Key {}", self.config.api_key)
    }

    async fn check_status(
        &self,
        request_id: u64,
        response: reqwest::Response,
    ) -> TTSResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(
            request_id = request_id,
            status = %status,
            body = %body,
            "SpeechKit returned error"
        );
        Err(classify_status(status.as_u16(), &body))
    }

    async fn synthesize_v3(&self, request_id: u64, request: &SynthesisRequest) -> TTSResult<Bytes> {
        let body = UtteranceRequest {
            text: request.payload.clone(),
            lang: request.language.code(),
            hints: build_hints(request.voice, request.role, request.speed),
            output_audio_spec: OutputAudioSpec::for_format(
                request.format,
                self.config.sample_rate_hz,
            ),
        };

        let mut builder = self
            .client
            .post(&self.config.v3_url)
            .header("Authorization", self.auth_header())
            .json(&body);
        if let Some(folder_id) = &self.config.folder_id {
            builder = builder.header("x-folder-id", folder_id);
        }

        let response = builder.send().await.map_err(|e| {
            error!(request_id = request_id, error = %e, "SpeechKit v3 request failed");
            TTSError::NetworkError(format!("Request failed: {e}"))
        })?;
        let response = self.check_status(request_id, response).await?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));

        if is_json {
            let text = response.text().await.map_err(|e| {
                TTSError::AudioGenerationFailed(format!("Failed to read response: {e}"))
            })?;
            decode_audio_stream(&text)
        } else {
            self.read_raw(request_id, response).await
        }
    }

    async fn synthesize_v1(&self, request_id: u64, request: &SynthesisRequest) -> TTSResult<Bytes> {
        let format = v1_format(request.format).ok_or_else(|| {
            TTSError::InvalidConfiguration(format!(
                "Audio format '{}' is not available for SSML synthesis",
                request.format
            ))
        })?;

        let mut form: Vec<(&str, String)> = vec![
            ("ssml", request.payload.clone()),
            ("lang", request.language.code().to_string()),
            ("voice", request.voice.as_str().to_string()),
            ("speed", request.speed.to_string()),
            ("format", format.to_string()),
        ];
        if request.role != Role::Neutral {
            form.push(("emotion", request.role.as_str().to_string()));
        }
        if request.format == AudioFormat::Lpcm {
            form.push(("sampleRateHertz", self.config.sample_rate_hz.to_string()));
        }
        if let Some(folder_id) = &self.config.folder_id {
            form.push(("folderId", folder_id.clone()));
        }

        let response = self
            .client
            .post(&self.config.v1_url)
            .header("Authorization", self.auth_header())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(request_id = request_id, error = %e, "SpeechKit v1 request failed");
                TTSError::NetworkError(format!("Request failed: {e}"))
            })?;
        let response = self.check_status(request_id, response).await?;
        self.read_raw(request_id, response).await
    }

    async fn read_raw(&self, request_id: u64, response: reqwest::Response) -> TTSResult<Bytes> {
        let audio = response.bytes().await.map_err(|e| {
            error!(request_id = request_id, error = %e, "Failed to read audio response");
            TTSError::AudioGenerationFailed(format!("Failed to read audio: {e}"))
        })?;
        if audio.is_empty() {
            return Err(TTSError::EmptyAudio);
        }
        Ok(audio)
    }
}

#[async_trait]
impl SpeechSynthesizer for YandexSpeechKit {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
        let text_len = request.payload.chars().count();
        if request.payload.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration("Nothing to synthesize".to_string()));
        }
        if text_len > MAX_TEXT_LENGTH {
            return Err(TTSError::InvalidConfiguration(format!(
                "Too long text: {text_len} characters, maximum is {MAX_TEXT_LENGTH}"
            )));
        }

        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            request_id = request_id,
            text_len = text_len,
            dialect = %request.dialect,
            voice = %request.voice,
            role = %request.role,
            speed = %request.speed,
            format = %request.format,
            "Synthesizing with SpeechKit"
        );

        let audio = match request.dialect {
            Dialect::Inline => self.synthesize_v3(request_id, request).await?,
            Dialect::Legacy => self.synthesize_v1(request_id, request).await?,
        };

        debug!(
            request_id = request_id,
            audio_bytes = audio.len(),
            "Successfully synthesized audio"
        );
        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "yandex"
    }
}

/// Whether an error response reports the text as too long
pub fn is_text_too_long(error: &TTSError) -> bool {
    error.to_string().contains("Too long text")
}
