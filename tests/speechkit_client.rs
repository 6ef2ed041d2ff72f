//! SpeechKit Client Tests
//!
//! Exercises the Yandex SpeechKit client against a wiremock server standing
//! in for both the v3 and v1 synthesis endpoints.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use echosage::core::settings::{AudioFormat, Role, Speed, Voice};
use echosage::core::tts::yandex::is_text_too_long;
use echosage::{
    CachedSynthesizer, Dialect, SettingsDefaults, SpeechKitConfig, SpeechSynthesizer,
    SynthesisRequest, TTSError, UserSettings, YandexSpeechKit,
};

const V3_PATH: &str = "/tts/v3/utteranceSynthesis";
const V1_PATH: &str = "/speech/v1/tts:synthesize";

fn client(server: &MockServer, folder_id: Option<&str>) -> YandexSpeechKit {
    let mut config = SpeechKitConfig::new("test-key");
    config.v3_url = format!("{}{V3_PATH}", server.uri());
    config.v1_url = format!("{}{V1_PATH}", server.uri());
    config.folder_id = folder_id.map(str::to_string);
    config.request_timeout_secs = 5;
    YandexSpeechKit::new(config).unwrap()
}

fn settings() -> UserSettings {
    UserSettings::from(SettingsDefaults::default())
}

fn request(payload: &str, dialect: Dialect) -> SynthesisRequest {
    SynthesisRequest::new(payload, dialect, &settings())
}

/// Two base64 chunks: "Ogg" + "S1"
const STREAM_BODY: &str = "{\"result\":{\"audioChunk\":{\"data\":\"T2dn\"}}}\n\
{\"result\":{\"audioChunk\":{\"data\":\"UzE=\"}}}\n";

#[tokio::test]
async fn test_v3_request_shape_and_streamed_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(V3_PATH))
        .and(header("authorization", "Api-Key test-key"))
        .and(body_partial_json(json!({
            "text": "Привет sil<[300]> м+ир",
            "lang": "ru-RU",
            "hints": [{"voice": "jane"}, {"role": "evil"}, {"speed": "1.2"}],
            "outputAudioSpec": {"containerAudio": {"containerAudioType": "MP3"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(STREAM_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let mut s = settings();
    s.voice = Voice::Jane;
    s.role = Role::Evil;
    s.speed = Speed::new(1.2).unwrap();
    s.format = AudioFormat::Mp3;
    let req = SynthesisRequest::new("Привет sil<[300]> м+ир", Dialect::Inline, &s);

    let audio = client(&server, None).synthesize(&req).await.unwrap();
    assert_eq!(&audio[..], b"OggS1");
}

#[tokio::test]
async fn test_v3_sends_folder_header_and_accepts_raw_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(V3_PATH))
        .and(header("x-folder-id", "folder-1"))
        .and(body_partial_json(json!({"hints": [{"voice": "alena"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"RAWOGG".to_vec(), "audio/ogg"))
        .expect(1)
        .mount(&server)
        .await;

    let audio = client(&server, Some("folder-1"))
        .synthesize(&request("Привет", Dialect::Inline))
        .await
        .unwrap();
    assert_eq!(&audio[..], b"RAWOGG");
}

#[tokio::test]
async fn test_v3_inline_error_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(V3_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "{\"error\":{\"message\":\"bad markup\",\"httpCode\":400}}\n",
            "application/json",
        ))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .synthesize(&request("Привет", Dialect::Inline))
        .await
        .unwrap_err();
    assert!(matches!(err, TTSError::InvalidConfiguration(_)), "{err:?}");
}

#[tokio::test]
async fn test_v1_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(V1_PATH))
        .and(header("authorization", "Api-Key test-key"))
        .and(body_string_contains("voice=marina"))
        .and(body_string_contains("emotion=whisper"))
        .and(body_string_contains("format=oggopus"))
        .and(body_string_contains("folderId=folder-1"))
        .and(body_string_contains("lang=ru-RU"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"OggS-v1".to_vec(), "audio/ogg"))
        .expect(1)
        .mount(&server)
        .await;

    let mut s = settings();
    s.voice = Voice::Marina;
    s.role = Role::Whisper;
    let req = SynthesisRequest::new(
        "<speak>Тише <break time=\"0.5s\"/> мыши</speak>",
        Dialect::Legacy,
        &s,
    );
    let audio = client(&server, Some("folder-1")).synthesize(&req).await.unwrap();
    assert_eq!(&audio[..], b"OggS-v1");

    let received = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&received[0].body).into_owned();
    assert!(body.contains("ssml=%3Cspeak%3E"), "{body}");
    assert!(!body.contains("sampleRateHertz"));
}

#[tokio::test]
async fn test_v1_rejects_wav_without_calling_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut s = settings();
    s.format = AudioFormat::Wav;
    let req = SynthesisRequest::new("<speak>Да</speak>", Dialect::Legacy, &s);
    let err = client(&server, None).synthesize(&req).await.unwrap_err();
    assert!(matches!(err, TTSError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_status_classification() {
    let cases = [
        (400, "bad"),
        (401, "unauthenticated"),
        (403, "forbidden"),
        (429, "slow down"),
        (503, "unavailable"),
    ];
    for (status, body) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(V3_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;

        let err = client(&server, None)
            .synthesize(&request("Привет", Dialect::Inline))
            .await
            .unwrap_err();
        let expected_kind = match status {
            400 => matches!(err, TTSError::InvalidConfiguration(_)),
            401 | 403 => matches!(err, TTSError::ConnectionFailed(_)),
            _ => matches!(err, TTSError::ProviderError(_)),
        };
        assert!(expected_kind, "status {status} gave {err:?}");
        assert!(err.to_string().contains(body));
    }
}

#[tokio::test]
async fn test_too_long_text_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let text = "а".repeat(5001);
    let err = client(&server, None)
        .synthesize(&request(&text, Dialect::Inline))
        .await
        .unwrap_err();
    assert!(is_text_too_long(&err));
}

#[tokio::test]
async fn test_network_error() {
    let mut config = SpeechKitConfig::new("test-key");
    config.v3_url = "http://127.0.0.1:9/tts/v3/utteranceSynthesis".to_string();
    config.request_timeout_secs = 2;
    let tts = YandexSpeechKit::new(config).unwrap();

    let err = tts
        .synthesize(&request("Привет", Dialect::Inline))
        .await
        .unwrap_err();
    assert!(matches!(err, TTSError::NetworkError(_)), "{err:?}");
}

#[tokio::test]
async fn test_cache_serves_repeated_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(V3_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(STREAM_BODY, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let cached = CachedSynthesizer::wrap(
        Arc::new(client(&server, None)),
        Duration::from_secs(60),
        100,
    );

    let req = request("Повтор", Dialect::Inline);
    let first = cached.synthesize(&req).await.unwrap();
    let second = cached.synthesize(&req).await.unwrap();
    assert_eq!(first, second);
}
