//! Audio normalization through an external transcoding tool.
//!
//! Anything that is not already canonical 16 kHz mono PCM WAV is piped
//! through a scoped child process (ffmpeg by default): raw bytes on stdin,
//! canonical WAV on stdout, stderr captured for diagnostics. The child is
//! bounded by a wall-clock timeout and a concurrency semaphore, and is
//! killed on every exit path — timeout, cancellation, or drop.

use crate::audio::{AudioBlob, CanonicalAudio};
use crate::config::TranscoderConfig;
use crate::error::{FailureKind, PipelineError, Stage};
use crate::probe::FormatTag;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Normalizes uploaded audio to [`CanonicalAudio`] via an external tool.
///
/// Cheap to share: holds only configuration and the semaphore bounding
/// simultaneous child processes.
pub struct Transcoder {
    config: TranscoderConfig,
    permits: Arc<Semaphore>,
}

impl Transcoder {
    pub fn new(config: TranscoderConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self { config, permits }
    }

    /// Produce canonical audio from a classified blob.
    ///
    /// Canonical WAV input passes through (still validated). Everything
    /// else runs the external tool. On failure no partial buffer is ever
    /// returned, and for a tool failure the diagnostic carries the tool's
    /// stderr verbatim.
    pub async fn normalize(
        &self,
        blob: &AudioBlob,
        tag: &FormatTag,
        cancel: &CancellationToken,
    ) -> Result<CanonicalAudio, PipelineError> {
        if tag.is_canonical_wav() {
            debug!("Input already canonical, skipping transcode");
            return CanonicalAudio::from_wav_bytes(blob.bytes().to_vec()).map_err(|e| {
                PipelineError::new(
                    Stage::Converting,
                    FailureKind::TranscodeFailed,
                    format!("Input claimed canonical WAV but failed validation: {e:#}"),
                )
            });
        }

        // Queue behind the concurrency bound rather than spawning unbounded
        // children under load.
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::cancelled(Stage::Converting)),
            permit = self.permits.clone().acquire_owned() => {
                permit.map_err(|_| PipelineError::new(
                    Stage::Converting,
                    FailureKind::TranscodeFailed,
                    "Transcoder semaphore closed",
                ))?
            }
        };

        info!(
            tool = %self.config.command,
            input = %tag.describe(),
            bytes = blob.len(),
            "Transcoding to canonical format"
        );

        let output = self.run_tool(blob.bytes(), cancel).await?;

        CanonicalAudio::from_wav_bytes(output).map_err(|e| {
            PipelineError::new(
                Stage::Converting,
                FailureKind::TranscodeFailed,
                format!(
                    "`{}` exited successfully but produced non-canonical output: {e:#}",
                    self.config.command
                ),
            )
        })
    }

    /// Run the external tool over `input`, returning its stdout bytes.
    async fn run_tool(
        &self,
        input: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, PipelineError> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PipelineError::new(
                    Stage::Converting,
                    FailureKind::TranscodeUnavailable,
                    format!(
                        "Could not start `{}`: {e}. Install the tool or point \
                         [transcoder].command at it.",
                        self.config.command
                    ),
                )
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            internal_tool_error(&self.config.command, "child stdin was not captured")
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            internal_tool_error(&self.config.command, "child stdout was not captured")
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            internal_tool_error(&self.config.command, "child stderr was not captured")
        })?;

        // Drain both output pipes eagerly so a chatty tool cannot deadlock
        // against a full pipe buffer.
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf).await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        enum WaitOutcome {
            Cancelled,
            TimedOut,
            Done(std::io::Result<std::process::ExitStatus>),
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let input = input.to_vec();
        let outcome = {
            let feed_and_wait = async {
                let (_, status) = tokio::join!(
                    async move {
                        // EPIPE here just means the tool exited early; its
                        // exit status carries the real story.
                        let _ = stdin.write_all(&input).await;
                        let _ = stdin.shutdown().await;
                        drop(stdin);
                    },
                    child.wait(),
                );
                status
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => WaitOutcome::Cancelled,
                res = tokio::time::timeout(timeout, feed_and_wait) => match res {
                    Err(_) => WaitOutcome::TimedOut,
                    Ok(status) => WaitOutcome::Done(status),
                }
            }
        };

        let status = match outcome {
            WaitOutcome::Cancelled => {
                warn!(tool = %self.config.command, "Cancellation received, killing transcoder child");
                let _ = child.kill().await;
                return Err(PipelineError::cancelled(Stage::Converting));
            }
            WaitOutcome::TimedOut => {
                warn!(
                    tool = %self.config.command,
                    timeout_secs = self.config.timeout_secs,
                    "Transcoder child timed out, killing it"
                );
                let _ = child.kill().await;
                let stderr = stderr_task.await.unwrap_or_default();
                return Err(PipelineError::new(
                    Stage::Converting,
                    FailureKind::TranscodeFailed,
                    format!(
                        "`{}` timed out after {}s; stderr: {}",
                        self.config.command,
                        self.config.timeout_secs,
                        String::from_utf8_lossy(&stderr),
                    ),
                ));
            }
            WaitOutcome::Done(status) => status.map_err(|e| {
                internal_tool_error(&self.config.command, &format!("wait failed: {e}"))
            })?,
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            // Hard contract: the tool's raw stderr goes back to the caller
            // unmodified so failures are debuggable from the result alone.
            return Err(PipelineError::new(
                Stage::Converting,
                FailureKind::TranscodeFailed,
                format!(
                    "`{}` exited with {status}: {}",
                    self.config.command,
                    String::from_utf8_lossy(&stderr),
                ),
            ));
        }

        debug!(
            tool = %self.config.command,
            output_bytes = stdout.len(),
            "Transcode complete"
        );
        Ok(stdout)
    }
}

fn internal_tool_error(command: &str, detail: &str) -> PipelineError {
    PipelineError::new(
        Stage::Converting,
        FailureKind::TranscodeFailed,
        format!("`{command}`: {detail}"),
    )
}

#[cfg(test)]
#[path = "transcode_test.rs"]
mod tests;
