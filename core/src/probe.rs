//! Container format detection from header bytes.
//!
//! Classification is total: anything unrecognized becomes
//! [`FormatTag::Other`] with a best-effort codec hint instead of an error.
//! Only the header region is inspected; payloads are never decoded here.

use crate::audio::{TARGET_BITS_PER_SAMPLE, TARGET_CHANNELS, TARGET_SAMPLE_RATE};

/// Detected container format of an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatTag {
    /// RIFF/WAVE container holding uncompressed PCM.
    WavPcm {
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    },
    Flac,
    Aiff,
    /// Anything else, with a codec hint when one could be sniffed.
    Other { codec_hint: Option<String> },
}

impl FormatTag {
    /// True when the blob is already in the canonical recognition format
    /// and can skip transcoding entirely.
    pub fn is_canonical_wav(&self) -> bool {
        matches!(
            self,
            FormatTag::WavPcm {
                sample_rate: TARGET_SAMPLE_RATE,
                channels: TARGET_CHANNELS,
                bits_per_sample: TARGET_BITS_PER_SAMPLE,
            }
        )
    }

    /// Short name used in logs and diagnostics.
    pub fn describe(&self) -> String {
        match self {
            FormatTag::WavPcm {
                sample_rate,
                channels,
                bits_per_sample,
            } => format!("wav/pcm {sample_rate}Hz {channels}ch {bits_per_sample}bit"),
            FormatTag::Flac => "flac".to_string(),
            FormatTag::Aiff => "aiff".to_string(),
            FormatTag::Other { codec_hint } => match codec_hint {
                Some(hint) => format!("other ({hint})"),
                None => "other (unknown)".to_string(),
            },
        }
    }
}

/// Classify raw audio bytes by container markers, falling back to the
/// caller's MIME hint for the codec hint. Never fails.
pub fn classify(bytes: &[u8], mime_hint: Option<&str>) -> FormatTag {
    if let Some(tag) = sniff_riff_wave(bytes) {
        return tag;
    }
    if bytes.starts_with(b"fLaC") {
        return FormatTag::Flac;
    }
    if bytes.len() >= 12 && bytes.starts_with(b"FORM") && &bytes[8..12] == b"AIFF" {
        return FormatTag::Aiff;
    }

    FormatTag::Other {
        codec_hint: sniff_codec_hint(bytes).or_else(|| hint_from_mime(mime_hint)),
    }
}

/// Parse a RIFF/WAVE header and its fmt chunk. Returns None when the bytes
/// are not a WAVE container; non-PCM WAVE resolves to `Other`.
fn sniff_riff_wave(bytes: &[u8]) -> Option<FormatTag> {
    if bytes.len() < 12 || !bytes.starts_with(b"RIFF") || &bytes[8..12] != b"WAVE" {
        return None;
    }

    // Walk chunks looking for "fmt ". Bounded by the header region; a
    // truncated or fmt-less WAVE falls through to Other.
    let mut offset = 12usize;
    while offset + 8 <= bytes.len() {
        let chunk_id = &bytes[offset..offset + 4];
        let chunk_size =
            u32::from_le_bytes([bytes[offset + 4], bytes[offset + 5], bytes[offset + 6], bytes[offset + 7]])
                as usize;
        let body = offset + 8;

        if chunk_id == b"fmt " && body + 16 <= bytes.len() {
            let audio_format = u16::from_le_bytes([bytes[body], bytes[body + 1]]);
            let channels = u16::from_le_bytes([bytes[body + 2], bytes[body + 3]]);
            let sample_rate = u32::from_le_bytes([
                bytes[body + 4],
                bytes[body + 5],
                bytes[body + 6],
                bytes[body + 7],
            ]);
            let bits_per_sample = u16::from_le_bytes([bytes[body + 14], bytes[body + 15]]);

            // 1 = integer PCM; anything else (float, ADPCM, extensible...)
            // goes through the transcoder.
            if audio_format == 1 {
                return Some(FormatTag::WavPcm {
                    sample_rate,
                    channels,
                    bits_per_sample,
                });
            }
            return Some(FormatTag::Other {
                codec_hint: Some(format!("wave/format-{audio_format}")),
            });
        }

        // Chunks are word-aligned.
        offset = body + chunk_size + (chunk_size & 1);
    }

    Some(FormatTag::Other {
        codec_hint: Some("wave/truncated".to_string()),
    })
}

/// Best-effort codec hint for non-WAV containers browsers commonly produce.
fn sniff_codec_hint(bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("webm".to_string());
    }
    if bytes.starts_with(b"OggS") {
        let head = &bytes[..bytes.len().min(128)];
        if contains(head, b"OpusHead") {
            return Some("ogg/opus".to_string());
        }
        return Some("ogg".to_string());
    }
    if bytes.starts_with(b"ID3") {
        return Some("mp3".to_string());
    }
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0 {
        return Some("mp3".to_string());
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return Some("mp4".to_string());
    }
    if bytes.len() >= 12 && bytes.starts_with(b"FORM") && &bytes[8..12] == b"AIFC" {
        return Some("aifc".to_string());
    }
    None
}

fn hint_from_mime(mime_hint: Option<&str>) -> Option<String> {
    let mime = mime_hint?.trim();
    if mime.is_empty() {
        return None;
    }
    // "audio/webm;codecs=opus" -> "webm;codecs=opus" -> "webm"
    let subtype = mime.split('/').next_back().unwrap_or(mime);
    let subtype = subtype.split(';').next().unwrap_or(subtype).trim();
    if subtype.is_empty() {
        None
    } else {
        Some(subtype.to_string())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod tests;
