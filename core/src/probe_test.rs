use super::*;
use std::io::Cursor;

fn wav_bytes(sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..64 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[test]
fn test_classify_canonical_wav() {
    let tag = classify(&wav_bytes(16_000, 1), None);
    assert_eq!(
        tag,
        FormatTag::WavPcm {
            sample_rate: 16_000,
            channels: 1,
            bits_per_sample: 16,
        }
    );
    assert!(tag.is_canonical_wav());
}

#[test]
fn test_classify_non_canonical_wav() {
    let tag = classify(&wav_bytes(44_100, 2), None);
    assert_eq!(
        tag,
        FormatTag::WavPcm {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
        }
    );
    assert!(!tag.is_canonical_wav());
}

#[test]
fn test_classify_flac_and_aiff() {
    assert_eq!(classify(b"fLaC\x00\x00\x00\x22", None), FormatTag::Flac);

    let mut aiff = Vec::from(&b"FORM"[..]);
    aiff.extend_from_slice(&[0, 0, 0, 32]);
    aiff.extend_from_slice(b"AIFF");
    assert_eq!(classify(&aiff, None), FormatTag::Aiff);
}

#[test]
fn test_classify_webm_by_ebml_magic() {
    let tag = classify(&[0x1A, 0x45, 0xDF, 0xA3, 0x01, 0x02], None);
    assert_eq!(
        tag,
        FormatTag::Other {
            codec_hint: Some("webm".to_string())
        }
    );
}

#[test]
fn test_classify_ogg_opus() {
    let mut ogg = Vec::from(&b"OggS\x00\x02"[..]);
    ogg.extend_from_slice(&[0u8; 24]);
    ogg.extend_from_slice(b"OpusHead");
    assert_eq!(
        classify(&ogg, None),
        FormatTag::Other {
            codec_hint: Some("ogg/opus".to_string())
        }
    );
}

#[test]
fn test_classify_mp3_sync_word() {
    assert_eq!(
        classify(&[0xFF, 0xFB, 0x90, 0x00], None),
        FormatTag::Other {
            codec_hint: Some("mp3".to_string())
        }
    );
}

#[test]
fn test_mime_hint_fallback_for_unknown_bytes() {
    let tag = classify(b"????????", Some("audio/webm;codecs=opus"));
    assert_eq!(
        tag,
        FormatTag::Other {
            codec_hint: Some("webm".to_string())
        }
    );

    let tag = classify(b"????????", None);
    assert_eq!(tag, FormatTag::Other { codec_hint: None });
}

#[test]
fn test_classify_never_panics_on_tiny_input() {
    assert!(matches!(classify(&[], None), FormatTag::Other { .. }));
    assert!(matches!(classify(&[0x52], None), FormatTag::Other { .. }));
    assert!(matches!(
        classify(b"RIFF\x04\x00\x00\x00WAVE", None),
        FormatTag::Other { .. }
    ));
}

#[test]
fn test_non_pcm_wave_is_other() {
    // Hand-build a WAVE with an IEEE-float fmt chunk (format code 3).
    let mut bytes = Vec::from(&b"RIFF"[..]);
    bytes.extend_from_slice(&[0u8; 4]);
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&3u16.to_le_bytes()); // IEEE float
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&16_000u32.to_le_bytes());
    bytes.extend_from_slice(&64_000u32.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&32u16.to_le_bytes());

    assert_eq!(
        classify(&bytes, None),
        FormatTag::Other {
            codec_hint: Some("wave/format-3".to_string())
        }
    );
}
