//! CLI entry points for sign-bridge.
//!
//! Thin wrapper over the pipeline core: load config, run the pipeline on a
//! local audio file, print the structured result as JSON. Translating
//! failure kinds into end-user copy stays out of the core by design; here
//! they are printed as-is for operators.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sign_bridge_core::config::Config;
use sign_bridge_core::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Application-specific environment variable for log filtering (overrides config).
const LOG_ENV_VAR: &str = "SIGNBRIDGE_LOG";

#[derive(Parser)]
#[command(name = "signbridge")]
#[command(about = "sign-bridge - speech to sign-language segment plans")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to the XDG location).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate an audio file into a sign-language segment plan
    Translate {
        /// Audio file of any browser-native container/codec
        file: PathBuf,
        /// Spoken-language hint, e.g. "en" or "hi"
        #[arg(long)]
        language: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

/// CLI entry point: parse arguments, configure logging, dispatch.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };

    // SIGNBRIDGE_LOG env var overrides config file level
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(config.logging.level.as_directive().parse()?)
        .from_env()?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Translate { file, language } => translate(&config, &file, language).await,
        Commands::Config => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render config as TOML")?;
            println!("{rendered}");
            Ok(())
        }
    }
}

async fn translate(config: &Config, file: &Path, language: Option<String>) -> Result<()> {
    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read audio file: {}", file.display()))?;
    debug!(file = %file.display(), bytes = bytes.len(), "Read audio file");

    let pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;
    let result = pipeline
        .run_bytes(
            bytes,
            mime_hint_from_path(file).unwrap_or_default(),
            language.as_deref().unwrap_or_default(),
        )
        .await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err)?);
            anyhow::bail!("Pipeline failed: {err}")
        }
    }
}

/// Guess a MIME hint from the file extension. The probe only uses this as
/// a fallback when header sniffing is inconclusive.
fn mime_hint_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "wav" => Some("audio/wav"),
        "flac" => Some("audio/flac"),
        "aiff" | "aif" => Some("audio/aiff"),
        "webm" => Some("audio/webm"),
        "ogg" | "oga" | "opus" => Some("audio/ogg"),
        "mp3" => Some("audio/mpeg"),
        "m4a" | "mp4" => Some("audio/mp4"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_hint_from_path() {
        assert_eq!(
            mime_hint_from_path(Path::new("clip.webm")),
            Some("audio/webm")
        );
        assert_eq!(
            mime_hint_from_path(Path::new("clip.WAV")),
            Some("audio/wav")
        );
        assert_eq!(mime_hint_from_path(Path::new("clip")), None);
        assert_eq!(mime_hint_from_path(Path::new("clip.xyz")), None);
    }
}
