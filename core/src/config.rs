//! Configuration management for the sign-bridge pipeline.
//!
//! Handles loading, saving, and providing defaults for the pipeline
//! configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration struct for the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub transcoder: TranscoderConfig,
    pub recognizer: RecognizerConfig,
    pub gloss: GlossConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

/// Orchestrator-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Wall-clock budget for the cheap in-process stages (probing,
    /// glossing, resolving). The transcoder and recognizer carry their
    /// own budgets.
    pub stage_timeout_secs: u64,
}

/// Configuration for the external transcoding tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    /// Tool executable name or path.
    pub command: String,
    /// Arguments; the tool must read source audio from stdin and write
    /// 16 kHz mono 16-bit PCM WAV to stdout.
    pub args: Vec<String>,
    /// Wall-clock budget for one tool invocation, in seconds.
    pub timeout_secs: u64,
    /// Maximum simultaneous tool processes; further requests queue.
    pub max_concurrent: usize,
}

/// Recognition engine kinds that can appear in the priority list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Local recognizer executable, WAV on stdin, transcript on stdout.
    Command,
    /// Remote recognition service, WAV POSTed over HTTP.
    Http,
}

/// Configuration for speech recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Engines to try, in priority order. First non-empty transcript above
    /// the confidence threshold wins.
    pub engines: Vec<EngineKind>,
    /// Minimum confidence for a transcript to be accepted. Engines that
    /// report no confidence pass unconditionally.
    pub min_confidence: f32,
    /// Wall-clock budget for the recognition stage, in seconds.
    pub timeout_secs: u64,
    /// Executable for the command engine.
    pub command: String,
    /// Extra arguments for the command engine.
    pub command_args: Vec<String>,
    /// Endpoint for the HTTP engine.
    pub http_url: String,
}

/// Configuration for gloss mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossConfig {
    /// Path to a JSON lexicon file. The built-in lexicon is used when
    /// unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexicon_path: Option<PathBuf>,
}

/// Configuration for the video-segment catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to a JSON catalog file. An empty catalog is used when unset
    /// (every token resolves to Unresolved).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Tie-break policy when a gloss has several segment variants:
    /// "first", or a region code to prefer.
    pub variant_preference: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: LogLevel,
}

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to a tracing filter directive string for the core crate.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "sign_bridge_core=error",
            LogLevel::Warn => "sign_bridge_core=warn",
            LogLevel::Info => "sign_bridge_core=info",
            LogLevel::Debug => "sign_bridge_core=debug",
            LogLevel::Trace => "sign_bridge_core=trace",
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: 10,
        }
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            command: "ffmpeg".to_string(),
            args: default_transcoder_args(),
            timeout_secs: 30,
            max_concurrent: 4,
        }
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            engines: vec![EngineKind::Command],
            min_confidence: 0.4,
            timeout_secs: 60,
            command: "whisper-cli".to_string(),
            command_args: Vec::new(),
            http_url: "http://127.0.0.1:8090/transcribe".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            variant_preference: "first".to_string(),
        }
    }
}

/// ffmpeg invocation reading any container from stdin and writing
/// canonical WAV to stdout.
fn default_transcoder_args() -> Vec<String> {
    [
        "-hide_banner",
        "-loglevel",
        "error",
        "-i",
        "pipe:0",
        "-ar",
        "16000",
        "-ac",
        "1",
        "-acodec",
        "pcm_s16le",
        "-f",
        "wav",
        "pipe:1",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Returns the default config directory path.
    /// `~/.config/signbridge/` (or `$XDG_CONFIG_HOME/signbridge/`)
    pub fn config_dir() -> Result<PathBuf> {
        crate::dirs::config_dir()
    }

    /// Returns the default config file path.
    /// `~/.config/signbridge/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Returns the default data directory path.
    /// `~/.local/share/signbridge/` (or `$XDG_DATA_HOME/signbridge/`)
    pub fn data_dir() -> Result<PathBuf> {
        crate::dirs::data_dir()
    }

    /// Load configuration from the default path.
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file as TOML")
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
