//! Local recognizer executable backend.
//!
//! Runs a speech-to-text CLI (whisper.cpp's `whisper-cli`, vosk wrappers,
//! anything with the same shape) per request: canonical WAV on stdin,
//! transcript on stdout, diagnostics on stderr. A language hint is passed
//! as a trailing `--language <tag>` pair.

use super::{EngineError, EngineOutcome, RecognizerEngine};
use crate::audio::CanonicalAudio;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Recognition engine backed by a local executable.
pub struct CommandEngine {
    command: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl CommandEngine {
    pub fn new(command: String, args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            command,
            args,
            timeout_secs,
        }
    }
}

#[async_trait]
impl RecognizerEngine for CommandEngine {
    fn name(&self) -> &str {
        "command"
    }

    async fn recognize(
        &self,
        audio: &CanonicalAudio,
        language_hint: Option<&str>,
    ) -> Result<EngineOutcome, EngineError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        if let Some(lang) = language_hint {
            cmd.arg("--language").arg(lang);
        }

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::new(format!("Could not start `{}`: {e}", self.command)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::new("child stdin was not captured"))?;

        let wav = audio.wav_bytes().to_vec();
        let feed_and_collect = async {
            let (_, output) = tokio::join!(
                async move {
                    let _ = stdin.write_all(&wav).await;
                    let _ = stdin.shutdown().await;
                    drop(stdin);
                },
                child.wait_with_output(),
            );
            output
        };

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), feed_and_collect)
            .await
            .map_err(|_| {
                EngineError::new(format!(
                    "`{}` timed out after {}s",
                    self.command, self.timeout_secs
                ))
            })?
            .map_err(|e| EngineError::new(format!("`{}` failed: {e}", self.command)))?;

        if !output.status.success() {
            return Err(EngineError::new(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr),
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(engine = "command", text_len = text.len(), "Recognizer CLI finished");

        if text.is_empty() {
            Ok(EngineOutcome::NoSpeech)
        } else {
            // A CLI reports no confidence score; the chain treats that as
            // passing the threshold.
            Ok(EngineOutcome::Text {
                text,
                confidence: None,
            })
        }
    }
}
