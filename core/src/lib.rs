//! sign-bridge pipeline core.
//!
//! Turns a spoken-audio upload into an ordered plan of sign-language video
//! segments:
//!
//! 1. [`probe`] classifies the container from header bytes.
//! 2. [`transcode`] normalizes anything non-canonical to 16 kHz mono PCM
//!    WAV through an external tool.
//! 3. [`recognize`] transcribes the canonical audio via configured engines.
//! 4. [`gloss`] maps the transcript to a sign-language gloss sequence.
//! 5. [`catalog`] resolves each gloss to a video segment reference.
//!
//! [`pipeline::Pipeline`] sequences the stages with per-stage timeouts and
//! a closed error taxonomy ([`error::PipelineError`]); HTTP serving and
//! persistence are the caller's business.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod dirs;
pub mod error;
pub mod gloss;
pub mod pipeline;
pub mod probe;
pub mod recognize;
pub mod transcode;

pub use audio::AudioBlob;
pub use error::{FailureKind, PipelineError, Stage};
pub use pipeline::{Pipeline, PipelineOutput, PipelineResult};
