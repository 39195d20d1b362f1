//! Audio buffer types for the pipeline.
//!
//! Defines the raw upload wrapper ([`AudioBlob`]) and the canonical format
//! every recognizer consumes ([`CanonicalAudio`]): 16 kHz, mono, 16-bit PCM
//! WAV. Canonical audio can only be built through a validating constructor,
//! so anything downstream of the transcoder can rely on the format by type.

use anyhow::{Context, Result, bail};
use std::io::Cursor;

/// Sample rate required by the recognition engines.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Channel count of canonical audio.
pub const TARGET_CHANNELS: u16 = 1;

/// Bit depth of canonical audio.
pub const TARGET_BITS_PER_SAMPLE: u16 = 16;

/// Raw uploaded audio bytes plus the caller's MIME hint.
///
/// Immutable once received; owned by exactly one pipeline invocation and
/// discarded when it finishes.
#[derive(Debug, Clone)]
pub struct AudioBlob {
    bytes: Vec<u8>,
    mime_hint: Option<String>,
}

impl AudioBlob {
    /// Wrap uploaded bytes with a declared content type.
    pub fn new(bytes: Vec<u8>, mime_hint: impl Into<String>) -> Self {
        let hint = mime_hint.into();
        Self {
            bytes,
            mime_hint: if hint.is_empty() { None } else { Some(hint) },
        }
    }

    /// Wrap uploaded bytes without any content-type hint.
    pub fn without_hint(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_hint: None,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime_hint(&self) -> Option<&str> {
        self.mime_hint.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// WAV bytes validated to be 16 kHz, mono, 16-bit PCM.
///
/// The only constructor is [`CanonicalAudio::from_wav_bytes`], which
/// re-parses the header and rejects anything non-canonical.
#[derive(Debug, Clone)]
pub struct CanonicalAudio {
    wav_bytes: Vec<u8>,
    sample_count: usize,
}

impl CanonicalAudio {
    /// Validate WAV bytes as canonical audio.
    ///
    /// Rejects non-WAV data, wrong sample rates, channel counts, bit depths
    /// and non-integer sample formats.
    pub fn from_wav_bytes(wav_bytes: Vec<u8>) -> Result<Self> {
        let reader =
            hound::WavReader::new(Cursor::new(&wav_bytes)).context("Not a readable WAV stream")?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int {
            bail!("Expected integer PCM samples, got {:?}", spec.sample_format);
        }
        if spec.sample_rate != TARGET_SAMPLE_RATE {
            bail!(
                "Expected {TARGET_SAMPLE_RATE}Hz audio, got {}Hz",
                spec.sample_rate
            );
        }
        if spec.channels != TARGET_CHANNELS {
            bail!("Expected mono audio, got {} channels", spec.channels);
        }
        if spec.bits_per_sample != TARGET_BITS_PER_SAMPLE {
            bail!(
                "Expected {TARGET_BITS_PER_SAMPLE}-bit samples, got {}-bit",
                spec.bits_per_sample
            );
        }

        let sample_count = reader.len() as usize;
        Ok(Self {
            wav_bytes,
            sample_count,
        })
    }

    /// The validated WAV bytes, header included.
    pub fn wav_bytes(&self) -> &[u8] {
        &self.wav_bytes
    }

    /// Number of mono samples in the buffer.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Duration of the buffer in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.sample_count as f32 / TARGET_SAMPLE_RATE as f32
    }

    /// Decode the payload into f32 samples in [-1.0, 1.0].
    pub fn samples(&self) -> Result<Vec<f32>> {
        let mut reader = hound::WavReader::new(Cursor::new(&self.wav_bytes))
            .context("Not a readable WAV stream")?;
        reader
            .samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
            .collect::<Result<Vec<f32>, _>>()
            .context("Failed to decode PCM samples")
    }
}

#[cfg(test)]
#[path = "audio_test.rs"]
mod tests;
