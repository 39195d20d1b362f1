//! Pipeline error taxonomy.
//!
//! Every failure carries the stage it originated from, a machine-readable
//! kind, and a human-readable diagnostic. Failures are per-invocation and
//! never fatal to the process; translating kinds into end-user messages
//! is the caller's job.

use serde::Serialize;
use thiserror::Error;

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Probing,
    Converting,
    Recognizing,
    Glossing,
    Resolving,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Probing => "probing",
            Stage::Converting => "converting",
            Stage::Recognizing => "recognizing",
            Stage::Glossing => "glossing",
            Stage::Resolving => "resolving",
        };
        f.write_str(name)
    }
}

/// Failure classification, independent of any type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Input container/codec cannot be handled at all.
    UnsupportedFormat,
    /// External transcoding tool could not be located or started.
    TranscodeUnavailable,
    /// External transcoding tool ran but failed or produced bad output.
    TranscodeFailed,
    /// No configured engine found speech in the audio.
    UnintelligibleAudio,
    /// A recognition engine errored transiently and nothing else succeeded.
    RecognitionServiceError,
    /// A stage exceeded its wall-clock budget (or was cancelled).
    Timeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::UnsupportedFormat => "unsupported_format",
            FailureKind::TranscodeUnavailable => "transcode_unavailable",
            FailureKind::TranscodeFailed => "transcode_failed",
            FailureKind::UnintelligibleAudio => "unintelligible_audio",
            FailureKind::RecognitionServiceError => "recognition_service_error",
            FailureKind::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// A pipeline failure: originating stage, kind, and diagnostic text.
///
/// For [`FailureKind::TranscodeFailed`] the diagnostic contains the external
/// tool's raw stderr verbatim. That is a contract for debuggability, not
/// incidental logging.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{stage}/{kind}: {diagnostic}")]
pub struct PipelineError {
    pub stage: Stage,
    pub kind: FailureKind,
    pub diagnostic: String,
}

impl PipelineError {
    pub fn new(stage: Stage, kind: FailureKind, diagnostic: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            diagnostic: diagnostic.into(),
        }
    }

    /// Timeout at the given stage after `secs` seconds.
    pub fn timeout(stage: Stage, secs: u64) -> Self {
        Self::new(
            stage,
            FailureKind::Timeout,
            format!("{stage} stage exceeded its {secs}s budget"),
        )
    }

    /// Cancellation surfaced at the given stage.
    pub fn cancelled(stage: Stage) -> Self {
        Self::new(stage, FailureKind::Timeout, format!("{stage} stage cancelled"))
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
