// tests/pipeline_e2e.rs
//! End-to-end pipeline tests against a fake extraction tool
//!
//! This file tests:
//! 1. The full run: probe → extract → stub transcription → golden SRT
//! 2. Stage, progress and log event sequences
//! 3. The single-run guard and both cancellation outcomes
//! 4. Temp audio cleanup on success, cancellation and failure paths
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use subgen::pipeline::{MemoryEvents, Pipeline, PipelineStage, RunOutcome, RunRequest};
use subgen::stt::transcriber::MockTranscriber;
use subgen::{SubgenError, Transcriber};

/// Write an executable shell script standing in for the extraction tool.
///
/// Probe calls (`-i <input>`, two arguments) print `banner` to stderr and
/// exit non-zero like the real tool does without an output file. Extraction
/// calls run `body`, which finds the output WAV path in `$9`.
fn write_fake_tool(dir: &Path, banner: &str, body: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    let script = format!(
        "#!/bin/sh\nif [ \"$#\" -eq 2 ]; then\n  echo \"{banner}\" >&2\n  exit 1\nfi\n{body}\n"
    );
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Write `seconds` of 16 kHz mono 16-bit silence as a WAV file.
fn write_wav(path: &Path, seconds: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(seconds * 16_000) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Engine yielding the two segments the golden SRT is built from.
fn stub_engine() -> Arc<dyn Transcriber> {
    Arc::new(
        MockTranscriber::new("stub")
            .with_segment(0, 3_000, "hello")
            .with_segment(3_000, 7_000, "world"),
    )
}

#[tokio::test]
async fn test_full_run_writes_golden_srt() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("clip.mp4");
    std::fs::write(&media, b"not really a video").unwrap();
    let wav = dir.path().join("track.wav");
    write_wav(&wav, 10);
    let recorded = dir.path().join("extract-args");
    let tool = write_fake_tool(
        dir.path(),
        "Duration: 00:00:10.00, start: 0.000000, bitrate: 256 kb/s",
        &format!("echo \"$9\" > {}\ncp {} \"$9\"", recorded.display(), wav.display()),
    );

    let events = Arc::new(MemoryEvents::new());
    let output = dir.path().join("clip.srt");
    let pipeline = Pipeline::new()
        .with_events(events.clone())
        .with_engine(stub_engine())
        .with_extractor_path(&tool);

    let mut request = RunRequest::new(&media);
    request.output = Some(output.clone());

    match pipeline.run(request).await.unwrap() {
        RunOutcome::Completed {
            segments,
            subtitle_path,
        } => {
            assert_eq!(subtitle_path, output);
            assert_eq!(segments.len(), 2);
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    let srt = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:03,000\nhello\n\n2\n00:00:03,000 --> 00:00:07,000\nworld\n\n"
    );

    assert_eq!(
        events.stages(),
        vec![
            PipelineStage::ValidatingInputs,
            PipelineStage::EnsuringAssets,
            PipelineStage::Probing,
            PipelineStage::Extracting,
            PipelineStage::Transcribing,
            PipelineStage::Assembling,
            PipelineStage::Done,
        ]
    );
    assert_eq!(
        events.progress(),
        vec![
            (PipelineStage::Transcribing, 30),
            (PipelineStage::Transcribing, 70),
            (PipelineStage::Transcribing, 100),
        ]
    );
    let logs = events.logs();
    assert!(
        logs.iter().any(|l| l == "Media duration: 00:00:10,000"),
        "missing duration log in {logs:?}"
    );
    assert!(
        logs.iter()
            .any(|l| l == "[00:00:00,000 --> 00:00:03,000] hello"),
        "missing segment log in {logs:?}"
    );

    // The temp WAV handed to the tool is gone after the run.
    let temp_audio = std::fs::read_to_string(&recorded).unwrap();
    let temp_audio = temp_audio.trim();
    assert!(
        temp_audio.contains("subgen-audio-"),
        "unexpected temp path: {temp_audio}"
    );
    assert!(
        !Path::new(temp_audio).exists(),
        "temp audio not removed: {temp_audio}"
    );
}

#[tokio::test]
async fn test_default_output_is_sibling_srt() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("talk.mkv");
    std::fs::write(&media, b"container").unwrap();
    let wav = dir.path().join("track.wav");
    write_wav(&wav, 10);
    let tool = write_fake_tool(
        dir.path(),
        "Duration: 00:00:10.00, start: 0.000000, bitrate: 256 kb/s",
        &format!("cp {} \"$9\"", wav.display()),
    );

    let pipeline = Pipeline::new()
        .with_engine(stub_engine())
        .with_extractor_path(&tool);

    match pipeline.run(RunRequest::new(&media)).await.unwrap() {
        RunOutcome::Completed { subtitle_path, .. } => {
            assert_eq!(subtitle_path, dir.path().join("talk.srt"));
            assert!(subtitle_path.is_file());
        }
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_duration_disables_progress() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("stream.ts");
    std::fs::write(&media, b"live capture").unwrap();
    let wav = dir.path().join("track.wav");
    write_wav(&wav, 2);
    let tool = write_fake_tool(
        dir.path(),
        "Duration: N/A, start: 0.000000, bitrate: N/A",
        &format!("cp {} \"$9\"", wav.display()),
    );

    let events = Arc::new(MemoryEvents::new());
    let pipeline = Pipeline::new()
        .with_events(events.clone())
        .with_engine(stub_engine())
        .with_extractor_path(&tool);

    match pipeline.run(RunRequest::new(&media)).await.unwrap() {
        RunOutcome::Completed { segments, .. } => assert_eq!(segments.len(), 2),
        other => panic!("expected Completed, got {other:?}"),
    }

    // Segments still flow, but nothing can be expressed as a percentage.
    assert_eq!(events.progress(), vec![]);
    assert!(
        events
            .logs()
            .iter()
            .any(|l| l.contains("progress reporting disabled")),
        "missing degraded-probe log in {:?}",
        events.logs()
    );
}

#[tokio::test]
async fn test_second_run_while_busy_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("clip.mp4");
    std::fs::write(&media, b"media").unwrap();
    let recorded = dir.path().join("extract-args");
    let tool = write_fake_tool(
        dir.path(),
        "Duration: 00:00:10.00, start: 0.000000, bitrate: 256 kb/s",
        &format!("echo \"$9\" > {}\nsleep 30", recorded.display()),
    );

    let pipeline = Arc::new(
        Pipeline::new()
            .with_engine(stub_engine())
            .with_extractor_path(&tool),
    );

    let runner = Arc::clone(&pipeline);
    let first_media = media.clone();
    let first = tokio::spawn(async move { runner.run(RunRequest::new(&first_media)).await });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !pipeline.is_busy() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "first run never started"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    match pipeline.run(RunRequest::new(&media)).await {
        Err(SubgenError::PipelineBusy) => {}
        other => panic!("expected PipelineBusy, got {other:?}"),
    }

    pipeline.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .expect("first run did not react to cancel")
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Cancelled { .. }));
    assert!(!pipeline.is_busy());
}

#[tokio::test]
async fn test_cancel_during_extraction_cleans_up_temp_audio() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("clip.mp4");
    std::fs::write(&media, b"media").unwrap();
    let recorded = dir.path().join("extract-args");
    let tool = write_fake_tool(
        dir.path(),
        "Duration: 00:00:10.00, start: 0.000000, bitrate: 256 kb/s",
        &format!("echo \"$9\" > {}\nsleep 30", recorded.display()),
    );

    let events = Arc::new(MemoryEvents::new());
    let pipeline = Arc::new(
        Pipeline::new()
            .with_events(events.clone())
            .with_engine(stub_engine())
            .with_extractor_path(&tool),
    );

    let runner = Arc::clone(&pipeline);
    let run_media = media.clone();
    let task = tokio::spawn(async move { runner.run(RunRequest::new(&run_media)).await });

    // Wait until the tool is mid-extraction, then cancel.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !recorded.exists() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "extraction never started"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    pipeline.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("run did not react to cancel")
        .unwrap()
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Cancelled {
            segments: Vec::new()
        }
    );

    let temp_audio = std::fs::read_to_string(&recorded).unwrap();
    let temp_audio = temp_audio.trim();
    assert!(
        temp_audio.contains("subgen-audio-"),
        "unexpected temp path: {temp_audio}"
    );
    assert!(
        !Path::new(temp_audio).exists(),
        "temp audio not removed: {temp_audio}"
    );

    assert_eq!(events.stages().last(), Some(&PipelineStage::Cancelled));
    assert!(!pipeline.is_busy());
    assert!(!media.with_extension("srt").exists(), "no subtitle on cancel");
}

#[tokio::test]
async fn test_extraction_failure_surfaces_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("clip.mp4");
    std::fs::write(&media, b"media").unwrap();
    let recorded = dir.path().join("extract-args");
    let tool = write_fake_tool(
        dir.path(),
        "Duration: 00:00:10.00, start: 0.000000, bitrate: 256 kb/s",
        &format!(
            "echo \"$9\" > {}\necho \"moov atom not found\" >&2\nexit 187",
            recorded.display()
        ),
    );

    let events = Arc::new(MemoryEvents::new());
    let pipeline = Pipeline::new()
        .with_events(events.clone())
        .with_engine(stub_engine())
        .with_extractor_path(&tool);

    match pipeline.run(RunRequest::new(&media)).await {
        Err(SubgenError::ToolFailed {
            tool,
            code,
            diagnostics,
        }) => {
            assert_eq!(tool, "fake-ffmpeg");
            assert_eq!(code, 187);
            assert!(
                diagnostics.contains("moov atom not found"),
                "diagnostics lost: {diagnostics}"
            );
        }
        other => panic!("expected ToolFailed, got {other:?}"),
    }

    assert_eq!(events.stages().last(), Some(&PipelineStage::Failed));
    assert!(!pipeline.is_busy());

    // Cleanup still ran for the failure path.
    let temp_audio = std::fs::read_to_string(&recorded).unwrap();
    assert!(!Path::new(temp_audio.trim()).exists());
}

#[tokio::test]
async fn test_engine_failure_surfaces_as_inference_error() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("clip.mp4");
    std::fs::write(&media, b"media").unwrap();
    let wav = dir.path().join("track.wav");
    write_wav(&wav, 2);
    let tool = write_fake_tool(
        dir.path(),
        "Duration: 00:00:02.00, start: 0.000000, bitrate: 256 kb/s",
        &format!("cp {} \"$9\"", wav.display()),
    );

    let failing: Arc<dyn Transcriber> = Arc::new(MockTranscriber::new("stub").with_failure());
    let events = Arc::new(MemoryEvents::new());
    let pipeline = Pipeline::new()
        .with_events(events.clone())
        .with_engine(failing)
        .with_extractor_path(&tool);

    assert!(matches!(
        pipeline.run(RunRequest::new(&media)).await,
        Err(SubgenError::TranscriptionInferenceFailed { .. })
    ));
    assert_eq!(events.stages().last(), Some(&PipelineStage::Failed));
    assert!(!media.with_extension("srt").exists());
}
