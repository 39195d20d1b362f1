//! Pipeline orchestrator.
//!
//! Sequences the stages strictly forward — probe, convert, recognize,
//! gloss, resolve — with a per-stage wall-clock budget and no recovery
//! across stage boundaries: a stage failure surfaces immediately as the
//! pipeline result. Retrying means re-invoking the whole pipeline with the
//! same input, which is the caller's decision.

use crate::audio::AudioBlob;
use crate::catalog::{SegmentCatalog, SegmentPlan, SegmentResolver, VariantPreference};
use crate::config::Config;
use crate::error::{FailureKind, PipelineError, Stage};
use crate::gloss::{self, GlossMapper, GlossSequence, Lexicon};
use crate::probe;
use crate::recognize::{Recognizer, Transcript};
use crate::transcode::Transcoder;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Successful pipeline output.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub transcript: Transcript,
    pub gloss: GlossSequence,
    pub plan: SegmentPlan,
    /// True when the utterance was a bare expression of gratitude; gloss
    /// and plan are empty in that case.
    pub gratitude: bool,
    /// Total processing time in milliseconds.
    pub elapsed_ms: u64,
}

/// Result of one pipeline invocation.
pub type PipelineResult = Result<PipelineOutput, PipelineError>;

/// Orchestrator state; transitions are strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Received,
    Probing,
    Converting,
    Recognizing,
    Glossing,
    Resolving,
    Completed,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            State::Received => "received",
            State::Probing => "probing",
            State::Converting => "converting",
            State::Recognizing => "recognizing",
            State::Glossing => "glossing",
            State::Resolving => "resolving",
            State::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// The speech-to-segments pipeline.
///
/// Built once at startup and shared across invocations; the only state
/// shared between concurrent runs is the read-only lexicon and catalog
/// plus the transcoder's concurrency semaphore.
pub struct Pipeline {
    transcoder: Transcoder,
    recognizer: Recognizer,
    mapper: GlossMapper,
    resolver: SegmentResolver,
    stage_timeout: Duration,
    converting_timeout: Duration,
    recognizing_timeout: Duration,
}

impl Pipeline {
    /// Build a pipeline from configuration plus pre-loaded collaborators.
    pub fn new(config: &Config, lexicon: Arc<Lexicon>, catalog: Arc<dyn SegmentCatalog>) -> Self {
        let recognizer = Recognizer::from_config(&config.recognizer);
        Self::with_recognizer(config, lexicon, catalog, recognizer)
    }

    /// Build a pipeline with an explicit recognizer (used by tests to
    /// inject fake engines).
    pub fn with_recognizer(
        config: &Config,
        lexicon: Arc<Lexicon>,
        catalog: Arc<dyn SegmentCatalog>,
        recognizer: Recognizer,
    ) -> Self {
        let stage_timeout = Duration::from_secs(config.pipeline.stage_timeout_secs);
        Self {
            transcoder: Transcoder::new(config.transcoder.clone()),
            recognizer,
            mapper: GlossMapper::new(lexicon),
            resolver: SegmentResolver::new(
                catalog,
                VariantPreference::from_config(&config.catalog.variant_preference),
            ),
            stage_timeout,
            // The converting budget covers time queued on the concurrency
            // semaphore on top of the tool's own clock.
            converting_timeout: Duration::from_secs(
                config.transcoder.timeout_secs + config.pipeline.stage_timeout_secs,
            ),
            recognizing_timeout: Duration::from_secs(config.recognizer.timeout_secs),
        }
    }

    /// Build a pipeline entirely from configuration, loading the lexicon
    /// and catalog files it references (builtin lexicon / empty catalog
    /// when unset).
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let lexicon = match &config.gloss.lexicon_path {
            Some(path) => Lexicon::load(path)?,
            None => Lexicon::builtin(),
        };
        let catalog = match &config.catalog.path {
            Some(path) => crate::catalog::JsonCatalog::load(path)?,
            None => crate::catalog::JsonCatalog::empty(),
        };
        Ok(Self::new(config, Arc::new(lexicon), Arc::new(catalog)))
    }

    /// Sole entry point for callers: run the pipeline over uploaded bytes.
    ///
    /// `content_type_hint` and `language_hint` may be empty. The
    /// cancellation token terminates any in-flight child process promptly.
    pub async fn run(
        &self,
        blob: AudioBlob,
        language_hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let started = Instant::now();
        let mut state = State::Received;

        if blob.is_empty() {
            return Err(PipelineError::new(
                Stage::Probing,
                FailureKind::UnsupportedFormat,
                "Empty audio upload",
            ));
        }

        // Probing never fails; the stage wrapper still bounds it.
        self.advance(&mut state, State::Probing);
        let tag = run_stage(Stage::Probing, self.stage_timeout, cancel, async {
            Ok(probe::classify(blob.bytes(), blob.mime_hint()))
        })
        .await?;
        info!(format = %tag.describe(), bytes = blob.len(), "Classified upload");

        self.advance(&mut state, State::Converting);
        let audio = run_stage(
            Stage::Converting,
            self.converting_timeout,
            cancel,
            self.transcoder.normalize(&blob, &tag, cancel),
        )
        .await?;

        self.advance(&mut state, State::Recognizing);
        let transcript = run_stage(
            Stage::Recognizing,
            self.recognizing_timeout,
            cancel,
            self.recognizer.recognize(&audio, language_hint),
        )
        .await?;
        info!(text = %transcript.text, confidence = ?transcript.confidence, "Recognized speech");

        // Gratitude short-circuit: no gloss, no plan, still a success.
        if gloss::is_gratitude(&transcript.text) {
            self.advance(&mut state, State::Completed);
            info!("Gratitude utterance, skipping gloss and resolution");
            return Ok(PipelineOutput {
                transcript,
                gloss: GlossSequence::new(),
                plan: SegmentPlan::new(),
                gratitude: true,
                elapsed_ms: elapsed_ms(started),
            });
        }

        self.advance(&mut state, State::Glossing);
        let gloss = run_stage(Stage::Glossing, self.stage_timeout, cancel, async {
            Ok(self.mapper.map(&transcript))
        })
        .await?;

        self.advance(&mut state, State::Resolving);
        let plan = run_stage(Stage::Resolving, self.stage_timeout, cancel, async {
            Ok(self.resolver.resolve(&gloss).await)
        })
        .await?;

        self.advance(&mut state, State::Completed);
        let elapsed_ms = elapsed_ms(started);
        info!(
            glosses = gloss.len(),
            resolved = plan.iter().filter(|r| r.is_resolved()).count(),
            elapsed_ms,
            "Pipeline completed"
        );

        Ok(PipelineOutput {
            transcript,
            gloss,
            plan,
            gratitude: false,
            elapsed_ms,
        })
    }

    /// Convenience wrapper taking raw parts instead of an [`AudioBlob`].
    pub async fn run_bytes(
        &self,
        bytes: Vec<u8>,
        content_type_hint: &str,
        language_hint: &str,
    ) -> PipelineResult {
        let blob = AudioBlob::new(bytes, content_type_hint);
        let hint = if language_hint.is_empty() {
            None
        } else {
            Some(language_hint)
        };
        self.run(blob, hint, &CancellationToken::new()).await
    }

    fn advance(&self, state: &mut State, next: State) {
        debug!(from = %state, to = %next, "Pipeline transition");
        *state = next;
    }
}

/// Wrap one stage call with the cancellation token and its wall-clock
/// budget. Exceeding the budget fails the pipeline with a `Timeout`
/// annotated with the stage name.
async fn run_stage<T>(
    stage: Stage,
    budget: Duration,
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    tokio::select! {
        // Cancellation wins over a simultaneously-ready stage result.
        biased;
        _ = cancel.cancelled() => Err(PipelineError::cancelled(stage)),
        res = tokio::time::timeout(budget, fut) => match res {
            Err(_) => Err(PipelineError::timeout(stage, budget.as_secs())),
            Ok(r) => r,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
