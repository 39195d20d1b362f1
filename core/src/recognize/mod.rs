//! Speech recognition over canonical audio.
//!
//! This module provides a trait abstraction for recognition engines and a
//! chain that tries configured engines in priority order. Engines are
//! external collaborators (a local recognizer executable or a remote
//! service); the chain itself never retries — retry policy belongs to the
//! caller re-invoking the whole pipeline.

use crate::audio::CanonicalAudio;
use crate::config::{EngineKind, RecognizerConfig};
use crate::error::{FailureKind, PipelineError, Stage};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

mod command;
mod http;

pub use command::CommandEngine;
pub use http::HttpEngine;

/// Recognized speech with its language tag and optional confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub text: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// What a single engine produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    /// Recognized text, possibly with a confidence score in [0, 1].
    Text {
        text: String,
        confidence: Option<f32>,
    },
    /// The engine ran fine but found no speech in the audio.
    NoSpeech,
}

/// Transient engine failure (service unreachable, tool crashed, ...).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Speech recognition engine.
///
/// Implementations convert canonical audio to text. They must accept only
/// [`CanonicalAudio`] — the type guarantees 16 kHz mono PCM.
#[async_trait]
pub trait RecognizerEngine: Send + Sync {
    /// Engine name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Recognize speech in the audio.
    ///
    /// Returns [`EngineOutcome::NoSpeech`] when the engine is healthy but
    /// hears nothing; `Err` only for transient service problems.
    async fn recognize(
        &self,
        audio: &CanonicalAudio,
        language_hint: Option<&str>,
    ) -> Result<EngineOutcome, EngineError>;
}

/// Priority-ordered chain of recognition engines.
pub struct Recognizer {
    engines: Vec<Box<dyn RecognizerEngine>>,
    min_confidence: f32,
}

impl Recognizer {
    /// Build a chain from explicit engines.
    pub fn new(engines: Vec<Box<dyn RecognizerEngine>>, min_confidence: f32) -> Self {
        Self {
            engines,
            min_confidence,
        }
    }

    /// Build the configured engine set, in the configured priority order.
    pub fn from_config(config: &RecognizerConfig) -> Self {
        let engines = config
            .engines
            .iter()
            .map(|kind| match kind {
                EngineKind::Command => Box::new(CommandEngine::new(
                    config.command.clone(),
                    config.command_args.clone(),
                    config.timeout_secs,
                )) as Box<dyn RecognizerEngine>,
                EngineKind::Http => Box::new(HttpEngine::new(
                    config.http_url.clone(),
                    config.timeout_secs,
                )) as Box<dyn RecognizerEngine>,
            })
            .collect();
        Self::new(engines, config.min_confidence)
    }

    /// Names of the configured engines, in priority order.
    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Try each engine in order; the first non-empty transcript at or above
    /// the confidence threshold wins. No internal retries.
    pub async fn recognize(
        &self,
        audio: &CanonicalAudio,
        language_hint: Option<&str>,
    ) -> Result<Transcript, PipelineError> {
        if self.engines.is_empty() {
            return Err(PipelineError::new(
                Stage::Recognizing,
                FailureKind::RecognitionServiceError,
                "No recognition engines configured",
            ));
        }

        let mut last_service_error: Option<(String, EngineError)> = None;

        for engine in &self.engines {
            debug!(
                engine = engine.name(),
                duration_secs = audio.duration_secs(),
                "Trying recognition engine"
            );

            match engine.recognize(audio, language_hint).await {
                Ok(EngineOutcome::Text { text, confidence }) => {
                    let text = text.trim();
                    if text.is_empty() {
                        debug!(engine = engine.name(), "Engine returned empty text");
                        continue;
                    }
                    if let Some(c) = confidence
                        && c < self.min_confidence
                    {
                        debug!(
                            engine = engine.name(),
                            confidence = c,
                            threshold = self.min_confidence,
                            "Transcript below confidence threshold"
                        );
                        continue;
                    }
                    return Ok(Transcript {
                        text: text.to_string(),
                        language: language_hint.unwrap_or("und").to_string(),
                        confidence,
                    });
                }
                Ok(EngineOutcome::NoSpeech) => {
                    debug!(engine = engine.name(), "Engine found no speech");
                }
                Err(e) => {
                    warn!(engine = engine.name(), error = %e, "Recognition engine failed");
                    last_service_error = Some((engine.name().to_string(), e));
                }
            }
        }

        match last_service_error {
            Some((name, e)) => Err(PipelineError::new(
                Stage::Recognizing,
                FailureKind::RecognitionServiceError,
                format!("{name}: {e}"),
            )),
            None => Err(PipelineError::new(
                Stage::Recognizing,
                FailureKind::UnintelligibleAudio,
                "No configured engine found speech in the audio",
            )),
        }
    }
}

#[cfg(test)]
#[path = "recognize_test.rs"]
mod tests;
