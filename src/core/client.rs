//! Translation service client and the retrying unit adapter

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::placeholder::{escape_xml, protect, restore, unescape_xml, MARKER};
use crate::core::progress::ProgressSink;

/// External translation service
#[async_trait]
pub trait TranslationService: Send + Sync + Debug {
    /// Translate plain text from `src` to `dest`
    async fn translate(&self, text: &str, src: &str, dest: &str) -> Result<String>;
}

/// Client for the public Google translate endpoint
#[derive(Debug, Clone)]
pub struct GoogleTranslateService {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslateService {
    /// Create a new service client
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(config.max_workers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.api_endpoint.clone(),
        })
    }

    /// Join the translated sentence chunks of a response body
    fn parse_response(json: &serde_json::Value) -> Result<String> {
        let chunks = json
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "No translation in response".to_string(),
            })?;

        let translation: String = chunks
            .iter()
            .filter_map(|chunk| chunk.get(0).and_then(|t| t.as_str()))
            .collect();

        if translation.is_empty() {
            return Err(TranslationError::InvalidResponseError {
                message: "Empty translation in response".to_string(),
            });
        }

        Ok(translation)
    }
}

#[async_trait]
impl TranslationService for GoogleTranslateService {
    async fn translate(&self, text: &str, src: &str, dest: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("dt", "t"),
                ("sl", src),
                ("tl", dest),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslationError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status();

        if status.is_success() {
            let json: serde_json::Value =
                response
                    .json()
                    .await
                    .map_err(|e| TranslationError::InvalidResponseError {
                        message: e.to_string(),
                    })?;
            Self::parse_response(&json)
        } else if status.as_u16() == 429 {
            Err(TranslationError::RateLimitError)
        } else {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            Err(TranslationError::ApiError {
                status: status_code,
                message: error_text,
            })
        }
    }
}

/// Wraps a service with placeholder protection and a fixed-delay retry loop
#[derive(Debug, Clone)]
pub struct RetryingTranslator {
    service: Arc<dyn TranslationService>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl RetryingTranslator {
    /// `max_attempts` counts every call and is clamped to at least 1
    pub fn new(service: Arc<dyn TranslationService>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            service,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Take attempts and delay from configuration
    pub fn from_config(service: Arc<dyn TranslationService>, config: &TranslatorConfig) -> Self {
        Self::new(service, config.max_attempts, config.retry_delay())
    }

    /// Translate one unit of file text, falling back to `raw` on failure
    ///
    /// `raw` is text as it appears in the file (already XML-escaped). The
    /// returned text is escaped and ready to be placed back between tags.
    pub async fn translate_unit(
        &self,
        raw: &str,
        src: &str,
        dest: &str,
        label: &str,
        sink: &ProgressSink,
    ) -> String {
        let protected = protect(raw);
        let clean = unescape_xml(&protected.clean_text);

        if clean.replace(MARKER, "").trim().is_empty() {
            debug!("Nothing to translate in {}", label);
            return raw.to_string();
        }

        let translated = match self.translate_with_retry(&clean, src, dest).await {
            Ok(translated) => translated,
            Err(e) => {
                error!("Translation failed for {}: {}", label, e);
                sink.error(format!("Translation error ({}): {}", label, e));
                return raw.to_string();
            }
        };

        let restored = restore(&escape_xml(&translated), &protected.placeholders);
        if restored.is_mismatch() {
            warn!(
                "Placeholder mismatch in {}: {} of {} restored, {} markers left",
                label, restored.substituted, restored.expected, restored.leftover_markers
            );
            sink.warn(format!(
                "Placeholder mismatch ({}): {} of {} placeholders restored, {} markers unresolved",
                label, restored.substituted, restored.expected, restored.leftover_markers
            ));
        }

        restored.text
    }

    /// Call the service up to `max_attempts` times with a fixed delay between calls
    pub async fn translate_with_retry(&self, text: &str, src: &str, dest: &str) -> Result<String> {
        let mut attempt = 1;

        loop {
            match self.service.translate(text, src, dest).await {
                Ok(translated) => {
                    if attempt > 1 {
                        info!("Successfully translated after {} retries", attempt - 1);
                    }
                    return Ok(translated);
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        "Attempt {}/{} failed: {}, retrying in {:?}",
                        attempt, self.max_attempts, e, self.retry_delay
                    );
                    sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::{EventLevel, ProgressEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails a fixed number of times, then echoes a canned reply
    #[derive(Debug)]
    struct FlakyService {
        failures: usize,
        calls: AtomicUsize,
        reply: String,
        seen: Mutex<Vec<String>>,
    }

    impl FlakyService {
        fn new(failures: usize, reply: &str) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TranslationService for FlakyService {
        async fn translate(&self, text: &str, _src: &str, _dest: &str) -> Result<String> {
            self.seen.lock().unwrap().push(text.to_string());
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(TranslationError::RateLimitError)
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_success() {
        let service = Arc::new(FlakyService::new(2, "성공"));
        let translator = RetryingTranslator::new(service.clone(), 3, Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        let result = translator.translate_with_retry("success", "en", "ko").await;

        assert_eq!(result.unwrap(), "성공");
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
        // two fixed delays, no third
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_keep_original_text() {
        let service = Arc::new(FlakyService::new(4, "never"));
        let translator = RetryingTranslator::new(service.clone(), 3, Duration::from_secs(2));
        let (sink, mut rx) = ProgressSink::channel();

        let text = translator
            .translate_unit("Red Shirt", "en", "ko", "unit 1", &sink)
            .await;

        assert_eq!(text, "Red Shirt");
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| e.level() == Some(EventLevel::Error)));
    }

    #[tokio::test]
    async fn test_placeholders_never_sent_to_service() {
        let service = Arc::new(FlakyService::new(0, "능력: {} 발동됨"));
        let translator = RetryingTranslator::new(service.clone(), 3, Duration::ZERO);

        let text = translator
            .translate_unit("Ability: [AbilityName] triggered", "en", "ko", "unit", &ProgressSink::disabled())
            .await;

        assert_eq!(text, "능력: [AbilityName] 발동됨");
        assert_eq!(service.seen.lock().unwrap()[0], "Ability: {} triggered");
    }

    #[tokio::test]
    async fn test_translation_output_is_escaped() {
        let service = Arc::new(FlakyService::new(0, "빵 & <버터>"));
        let translator = RetryingTranslator::new(service.clone(), 3, Duration::ZERO);

        let text = translator
            .translate_unit("Bread &amp; butter", "en", "ko", "unit", &ProgressSink::disabled())
            .await;

        assert_eq!(text, "빵 &amp; &lt;버터&gt;");
        assert_eq!(service.seen.lock().unwrap()[0], "Bread & butter");
    }

    #[tokio::test]
    async fn test_numeric_references_are_not_double_escaped() {
        let service = Arc::new(FlakyService::new(0, "첫 줄\n둘째 줄"));
        let translator = RetryingTranslator::new(service.clone(), 3, Duration::ZERO);

        let text = translator
            .translate_unit("Line one&#10;Line two", "en", "ko", "unit", &ProgressSink::disabled())
            .await;

        assert_eq!(service.seen.lock().unwrap()[0], "Line one\nLine two");
        assert_eq!(text, "첫 줄\n둘째 줄");
        assert!(!text.contains("&amp;#"));
    }

    #[tokio::test]
    async fn test_marker_mismatch_is_reported() {
        let service = Arc::new(FlakyService::new(0, "마커 없음"));
        let translator = RetryingTranslator::new(service, 3, Duration::ZERO);
        let (sink, mut rx) = ProgressSink::channel();

        let text = translator
            .translate_unit("[A] no marker", "en", "ko", "unit", &sink)
            .await;

        assert_eq!(text, "마커 없음");
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| e.level() == Some(EventLevel::Warning)));
    }

    #[tokio::test]
    async fn test_placeholder_only_text_skips_service() {
        let service = Arc::new(FlakyService::new(0, "unused"));
        let translator = RetryingTranslator::new(service.clone(), 3, Duration::ZERO);

        let text = translator
            .translate_unit("[PAWN_label] ", "en", "ko", "unit", &ProgressSink::disabled())
            .await;

        assert_eq!(text, "[PAWN_label] ");
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_google_response() {
        let json = serde_json::json!([[["빨간 ", "Red ", null], ["셔츠", "Shirt", null]], null, "en"]);
        assert_eq!(GoogleTranslateService::parse_response(&json).unwrap(), "빨간 셔츠");

        let bad = serde_json::json!({"error": "nope"});
        assert!(GoogleTranslateService::parse_response(&bad).is_err());
    }

    #[test]
    fn test_service_creation() {
        let service = GoogleTranslateService::new(&TranslatorConfig::default());
        assert!(service.is_ok());
    }
}
