//! Webhook Flow Tests
//!
//! Drives the full axum router with `oneshot` requests while wiremock plays
//! both the Telegram Bot API and Yandex SpeechKit.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use echosage::core::tts::{SpeechSynthesizer, SynthesisRequest, TTSResult};
use echosage::{AppState, InMemorySettingsStore, ServerConfig, routes};

const TOKEN: &str = "123:TOKEN";
const SECRET: &str = "s3cret";
const V3_PATH: &str = "/tts/v3/utteranceSynthesis";

fn test_config(server: &MockServer) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.telegram_bot_token = Some(TOKEN.to_string());
    config.telegram_api_url = server.uri();
    config.telegram_webhook_secret = Some(SECRET.to_string());
    config.yandex_api_key = Some("test-key".to_string());
    config.yandex_tts_url = format!("{}{V3_PATH}", server.uri());
    config.cache_ttl_seconds = 0;
    config.request_timeout_seconds = 5;
    config
}

async fn mount_telegram(server: &MockServer) {
    for bool_method in ["sendChatAction", "answerCallbackQuery"] {
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/{bool_method}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
            .mount(server)
            .await;
    }
    for message_method in ["sendMessage", "sendVoice", "sendAudio", "editMessageText"] {
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/{message_method}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"message_id": 900, "chat": {"id": 42}, "date": 0}
            })))
            .mount(server)
            .await;
    }
}

async fn app(server: &MockServer) -> Router {
    mount_telegram(server).await;
    let state = AppState::new(test_config(server)).unwrap();
    routes::create_router(state)
}

fn text_update(text: &str) -> Value {
    json!({
        "update_id": 501,
        "message": {
            "message_id": 11,
            "from": {"id": 42, "is_bot": false, "first_name": "Лена"},
            "chat": {"id": 42, "type": "private"},
            "date": 1700000000,
            "text": text
        }
    })
}

fn webhook_request(uri: &str, body: String, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-telegram-bot-api-secret-token", secret);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn requests_to(server: &MockServer, suffix: &str) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().ends_with(suffix))
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    let app = app(&server).await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "ok", "message": "EchoSage bot is running"})
    );
}

#[tokio::test]
async fn test_webhook_requires_secret() {
    let server = MockServer::start().await;
    let app = app(&server).await;
    let body = text_update("Привет").to_string();

    let missing = app
        .clone()
        .oneshot(webhook_request("/webhook", body.clone(), None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .oneshot(webhook_request("/", body, Some("guess")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    assert!(requests_to(&server, "/sendVoice").await.is_empty());
}

#[tokio::test]
async fn test_webhook_text_is_synthesized_and_sent_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(V3_PATH))
        .and(body_partial_json(json!({"text": "Привет, sil<[300]> мир"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "{\"result\":{\"audioChunk\":{\"data\":\"T2dnUw==\"}}}\n",
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&server).await;

    let response = app
        .oneshot(webhook_request(
            "/webhook",
            text_update("Привет, sil<[300]> мир").to_string(),
            Some(SECRET),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"ok": true}));

    let voices = requests_to(&server, "/sendVoice").await;
    assert_eq!(voices.len(), 1);
    assert!(voices[0].contains("OggS"));
    assert!(voices[0].contains("speech.ogg"));
}

#[tokio::test]
async fn test_webhook_reports_markup_error_without_synthesis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(V3_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = app(&server).await;

    let response = app
        .oneshot(webhook_request(
            "/",
            text_update("Стоп sil<[9999]> дальше").to_string(),
            Some(SECRET),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let messages = requests_to(&server, "/sendMessage").await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("sil&lt;[9999]&gt;"));
}

#[tokio::test]
async fn test_webhook_command_and_malformed_update() {
    let server = MockServer::start().await;
    let app = app(&server).await;

    let response = app
        .clone()
        .oneshot(webhook_request(
            "/webhook",
            text_update("/settings").to_string(),
            Some(SECRET),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let messages = requests_to(&server, "/sendMessage").await;
    assert!(messages[0].contains("Текущие настройки"));

    let response = app
        .oneshot(webhook_request("/webhook", "{not json".to_string(), Some(SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_translate_endpoint() {
    let server = MockServer::start().await;
    let app = app(&server).await;

    let ok = app
        .clone()
        .oneshot(webhook_request(
            "/translate",
            json!({"text": "Раз sil<[500]> **два**"}).to_string(),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = json_body(ok).await;
    assert_eq!(body["dialect"], "legacy");
    assert_eq!(body["payload"], "<speak>Раз <break time=\"0.5s\"/> два</speak>");
    assert_eq!(body["warnings"][0]["token"], "**два**");

    let rejected = app
        .clone()
        .oneshot(webhook_request(
            "/translate",
            json!({"text": "а sil<[50]> б", "target": "inline"}).to_string(),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(rejected).await;
    assert_eq!(body["token"], "sil<[50]>");
    assert_eq!(body["position"], 2);

    let bad_dialect = app
        .oneshot(webhook_request(
            "/translate",
            json!({"text": "а", "source": "morse"}).to_string(),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(bad_dialect.status(), StatusCode::BAD_REQUEST);
}

struct SilentSynth;

#[async_trait::async_trait]
impl SpeechSynthesizer for SilentSynth {
    async fn synthesize(&self, _request: &SynthesisRequest) -> TTSResult<bytes::Bytes> {
        Ok(bytes::Bytes::from_static(b"OggS"))
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

#[tokio::test]
async fn test_webhook_without_bot_is_unavailable() {
    let mut config = ServerConfig::default();
    config.telegram_webhook_secret = None;
    let settings = Arc::new(InMemorySettingsStore::new(config.defaults));
    let state = AppState::from_parts(config, settings, Arc::new(SilentSynth), None, None);
    let app = routes::create_router(state);

    let response = app
        .oneshot(webhook_request("/webhook", text_update("Привет").to_string(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn test_state_requires_speechkit_key() {
    let config = ServerConfig::default();
    let err = AppState::new(config).err().unwrap();
    assert!(err.to_string().contains("YANDEX_API_KEY"));
}
