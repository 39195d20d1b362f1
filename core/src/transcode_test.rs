use super::*;
use crate::probe;
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn canonical_wav_bytes(samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn tool_config(command: impl Into<String>, timeout_secs: u64) -> TranscoderConfig {
    TranscoderConfig {
        command: command.into(),
        args: Vec::new(),
        timeout_secs,
        max_concurrent: 2,
    }
}

fn webm_blob() -> (AudioBlob, FormatTag) {
    let blob = AudioBlob::new(vec![0x1A, 0x45, 0xDF, 0xA3, 0x42, 0x86], "audio/webm");
    let tag = probe::classify(blob.bytes(), blob.mime_hint());
    (blob, tag)
}

#[tokio::test]
async fn test_canonical_wav_passes_through_without_tool() {
    let bytes = canonical_wav_bytes(&[0, 50, -50, 0]);
    let blob = AudioBlob::new(bytes, "audio/wav");
    let tag = probe::classify(blob.bytes(), blob.mime_hint());

    // Command that would fail instantly if ever invoked.
    let transcoder = Transcoder::new(tool_config("/nonexistent/tool", 5));
    let audio = transcoder
        .normalize(&blob, &tag, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(audio.sample_count(), 4);
}

#[tokio::test]
async fn test_tool_output_becomes_canonical_audio() {
    let dir = tempfile::tempdir().unwrap();
    let wav_path = dir.path().join("out.wav");
    std::fs::write(&wav_path, canonical_wav_bytes(&[1; 160])).unwrap();
    let script = write_script(
        dir.path(),
        "fake-ffmpeg",
        &format!("cat >/dev/null\nexec cat \"{}\"", wav_path.display()),
    );

    let (blob, tag) = webm_blob();
    let transcoder = Transcoder::new(tool_config(script.to_string_lossy(), 5));
    let audio = transcoder
        .normalize(&blob, &tag, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(audio.sample_count(), 160);
}

#[tokio::test]
async fn test_missing_tool_is_transcode_unavailable() {
    let (blob, tag) = webm_blob();
    let transcoder = Transcoder::new(tool_config("/definitely/not/installed/ffmpeg", 5));
    let err = transcoder
        .normalize(&blob, &tag, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Converting);
    assert_eq!(err.kind, FailureKind::TranscodeUnavailable);
    assert!(err.diagnostic.contains("Install the tool"));
}

#[tokio::test]
async fn test_nonzero_exit_carries_raw_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "broken-tool",
        "cat >/dev/null\necho 'pipe:0: Invalid data found when processing input' >&2\nexit 1",
    );

    let (blob, tag) = webm_blob();
    let transcoder = Transcoder::new(tool_config(script.to_string_lossy(), 5));
    let err = transcoder
        .normalize(&blob, &tag, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::TranscodeFailed);
    assert!(!err.diagnostic.is_empty());
    assert!(
        err.diagnostic
            .contains("pipe:0: Invalid data found when processing input"),
        "stderr must be passed through verbatim, got: {}",
        err.diagnostic
    );
}

#[tokio::test]
async fn test_hanging_tool_times_out_and_dies() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "hanging-tool", "echo warming up >&2\nsleep 60");

    let (blob, tag) = webm_blob();
    let transcoder = Transcoder::new(tool_config(script.to_string_lossy(), 1));

    let start = std::time::Instant::now();
    let err = transcoder
        .normalize(&blob, &tag, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(start.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(err.kind, FailureKind::TranscodeFailed);
    assert!(err.diagnostic.contains("timed out"));
    assert!(err.diagnostic.contains("warming up"));
}

#[tokio::test]
async fn test_cancellation_kills_in_flight_tool() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "slow-tool", "sleep 60");

    let (blob, tag) = webm_blob();
    let transcoder = Transcoder::new(tool_config(script.to_string_lossy(), 30));

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        cancel_clone.cancel();
    });

    let start = std::time::Instant::now();
    let err = transcoder.normalize(&blob, &tag, &cancel).await.unwrap_err();
    assert!(start.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(err.diagnostic.contains("cancelled"));
}

#[tokio::test]
async fn test_lying_tool_never_yields_corrupt_audio() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "lying-tool",
        "cat >/dev/null\nprintf 'this is not a wav file'",
    );

    let (blob, tag) = webm_blob();
    let transcoder = Transcoder::new(tool_config(script.to_string_lossy(), 5));
    let err = transcoder
        .normalize(&blob, &tag, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::TranscodeFailed);
    assert!(err.diagnostic.contains("non-canonical"));
}

#[tokio::test]
async fn test_tool_resampling_validation_rejects_wrong_rate() {
    // Tool emits a well-formed WAV at the wrong rate: still a failure.
    let dir = tempfile::tempdir().unwrap();
    let wav_path = dir.path().join("wrong.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();
    }
    std::fs::write(&wav_path, cursor.into_inner()).unwrap();
    let script = write_script(
        dir.path(),
        "wrong-rate-tool",
        &format!("cat >/dev/null\nexec cat \"{}\"", wav_path.display()),
    );

    let (blob, tag) = webm_blob();
    let transcoder = Transcoder::new(tool_config(script.to_string_lossy(), 5));
    let err = transcoder
        .normalize(&blob, &tag, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::TranscodeFailed);
    assert!(err.diagnostic.contains("8000"));
}
