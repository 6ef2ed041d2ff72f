//! Audio cache in front of a synthesizer.
//!
//! Identical requests (same payload, voice, role, speed, format, dialect)
//! are answered from memory until the entry expires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use tracing::debug;

use super::base::{SharedSynthesizer, SpeechSynthesizer, SynthesisRequest, TTSError, TTSResult};

pub struct CachedSynthesizer {
    inner: SharedSynthesizer,
    cache: Cache<String, Bytes>,
}

impl CachedSynthesizer {
    pub fn new(inner: SharedSynthesizer, ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// Wrap `inner` unless caching is disabled (`ttl` of zero)
    pub fn wrap(inner: SharedSynthesizer, ttl: Duration, max_entries: u64) -> SharedSynthesizer {
        if ttl.is_zero() || max_entries == 0 {
            return inner;
        }
        Arc::new(Self::new(inner, ttl, max_entries))
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl SpeechSynthesizer for CachedSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
        let key = request.cache_key();
        let inner = Arc::clone(&self.inner);

        // Concurrent misses for the same key share one upstream call
        let entry = self
            .cache
            .entry(key.clone())
            .or_try_insert_with(async move { inner.synthesize(request).await })
            .await
            .map_err(|e: Arc<TTSError>| (*e).clone())?;

        debug!(
            cache_key = %key,
            hit = !entry.is_fresh(),
            provider = self.inner.name(),
            "Synthesis cache lookup"
        );
        Ok(entry.into_value())
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markup::Dialect;
    use crate::core::settings::{SettingsDefaults, UserSettings};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSynth {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for CountingSynth {
        async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TTSError::ProviderError("down".into()));
            }
            Ok(Bytes::from(request.payload.clone().into_bytes()))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest::new(
            text,
            Dialect::Inline,
            &UserSettings::from(SettingsDefaults::default()),
        )
    }

    #[tokio::test]
    async fn test_repeated_request_hits_cache() {
        let inner = Arc::new(CountingSynth {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cached = CachedSynthesizer::new(inner.clone(), Duration::from_secs(60), 100);

        let a = cached.synthesize(&request("раз")).await.unwrap();
        let b = cached.synthesize(&request("раз")).await.unwrap();
        let c = cached.synthesize(&request("два")).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(&c[..], "два".as_bytes());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = Arc::new(CountingSynth {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cached = CachedSynthesizer::new(inner.clone(), Duration::from_secs(60), 100);

        let err = cached.synthesize(&request("раз")).await.unwrap_err();
        assert_eq!(err, TTSError::ProviderError("down".into()));
        assert!(cached.synthesize(&request("раз")).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let inner: SharedSynthesizer = Arc::new(CountingSynth {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let wrapped = CachedSynthesizer::wrap(inner.clone(), Duration::ZERO, 100);
        assert!(Arc::ptr_eq(&inner, &wrapped));
    }
}
