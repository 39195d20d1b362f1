//! Remote recognition service backend.
//!
//! POSTs canonical WAV bytes to a transcription service and reads a JSON
//! response of the form `{"text": "...", "confidence": 0.9}`. A non-empty
//! `error` field, a non-success status, or a network failure are all
//! transient service errors as far as the engine chain is concerned.

use super::{EngineError, EngineOutcome, RecognizerEngine};
use crate::audio::CanonicalAudio;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Response shape of the recognition service.
#[derive(Debug, Deserialize)]
struct SttResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    error: Option<String>,
}

/// Recognition engine backed by an HTTP transcription service.
pub struct HttpEngine {
    url: String,
    client: reqwest::Client,
}

impl HttpEngine {
    pub fn new(url: String, timeout_secs: u64) -> Self {
        // Builder only fails when the TLS backend cannot initialize; fall
        // back to the default client (no per-request timeout) in that case.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { url, client }
    }
}

#[async_trait]
impl RecognizerEngine for HttpEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn recognize(
        &self,
        audio: &CanonicalAudio,
        language_hint: Option<&str>,
    ) -> Result<EngineOutcome, EngineError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(audio.wav_bytes().to_vec());
        if let Some(lang) = language_hint {
            request = request.query(&[("language", lang)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::new(format!("Recognition service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::new(format!(
                "Recognition service returned {status}: {body}"
            )));
        }

        let parsed: SttResponse = response
            .json()
            .await
            .map_err(|e| EngineError::new(format!("Bad response from recognition service: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(EngineError::new(format!(
                "Recognition service error: {error}"
            )));
        }

        debug!(
            engine = "http",
            text_len = parsed.text.len(),
            confidence = ?parsed.confidence,
            "Recognition service responded"
        );

        if parsed.text.trim().is_empty() {
            Ok(EngineOutcome::NoSpeech)
        } else {
            Ok(EngineOutcome::Text {
                text: parsed.text,
                confidence: parsed.confidence,
            })
        }
    }
}
