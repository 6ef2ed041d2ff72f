use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::*;
use crate::core::tts::base::TTSError;

#[test]
fn test_decode_concatenates_chunks() {
    let body = format!(
        "{}\n{}\n\n",
        serde_json::json!({"result": {"audioChunk": {"data": BASE64.encode(b"Ogg")}}}),
        serde_json::json!({"audioChunk": {"data": BASE64.encode(b"S-data")}}),
    );
    let audio = decode_audio_stream(&body).unwrap();
    assert_eq!(&audio[..], b"OggS-data");
}

#[test]
fn test_decode_skips_garbage_lines() {
    let body = format!(
        "not json\n{}\n{}",
        serde_json::json!({"result": {"textChunk": {"text": "x"}}}),
        serde_json::json!({"result": {"audioChunk": {"data": BASE64.encode(b"abc")}}}),
    );
    assert_eq!(&decode_audio_stream(&body).unwrap()[..], b"abc");
}

#[test]
fn test_decode_without_audio_fails() {
    let err = decode_audio_stream("{\"result\": {}}").unwrap_err();
    assert!(matches!(err, TTSError::AudioGenerationFailed(_)));
    assert!(decode_audio_stream("").is_err());
}

#[test]
fn test_decode_inline_error_object() {
    let body = serde_json::json!({
        "error": {"grpcCode": 3, "httpCode": 400, "message": "Too long text", "httpStatus": "Bad Request"}
    })
    .to_string();
    let err = decode_audio_stream(&body).unwrap_err();
    assert!(matches!(err, TTSError::InvalidConfiguration(_)));
    assert!(is_text_too_long(&err));
}

#[test]
fn test_classify_status() {
    assert!(matches!(
        classify_status(400, "bad"),
        TTSError::InvalidConfiguration(_)
    ));
    assert!(matches!(
        classify_status(401, "no"),
        TTSError::ConnectionFailed(_)
    ));
    assert!(matches!(
        classify_status(403, "no"),
        TTSError::ConnectionFailed(_)
    ));
    assert!(matches!(
        classify_status(429, "slow down"),
        TTSError::ProviderError(_)
    ));
    assert!(matches!(
        classify_status(503, "down"),
        TTSError::ProviderError(_)
    ));
}

#[test]
fn test_new_rejects_missing_key() {
    let err = YandexSpeechKit::new(SpeechKitConfig::default()).err().unwrap();
    assert!(matches!(err, TTSError::InvalidConfiguration(_)));
}
