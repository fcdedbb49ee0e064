//! Transcription driver: streams engine output into indexed subtitle
//! segments with progress against the known media duration.

use crate::error::{Result, SubgenError};
use crate::stt::transcriber::{TranscribeOptions, Transcriber, TranscriptSegment};
use crate::subtitle::SubtitleSegment;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Result of driving one transcription stream to its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptOutcome {
    /// Segments in arrival order, indexed from 1.
    pub segments: Vec<SubtitleSegment>,
    /// False when cancellation cut the stream short.
    pub completed: bool,
}

/// Percentage of the total covered by a segment ending at `end`.
fn progress_percent(end: Duration, total: Duration) -> u8 {
    let ratio = end.as_millis() as f64 / total.as_millis() as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Run the engine over `samples` and consume its segment stream.
///
/// Each arriving segment gets the next 1-based index and trimmed text.
/// When `total_duration` is non-zero, a progress percentage is emitted per
/// segment and forced to 100 once the stream is exhausted; a zero duration
/// suppresses progress entirely. Cancellation stops the engine after the
/// segment in flight and yields a partial, non-completed outcome.
pub async fn transcribe_stream(
    engine: Arc<dyn Transcriber>,
    samples: Vec<i16>,
    options: TranscribeOptions,
    total_duration: Duration,
    cancel: &CancellationToken,
    mut on_segment: impl FnMut(&SubtitleSegment),
    mut on_progress: impl FnMut(u8),
) -> Result<TranscriptOutcome> {
    let stop = Arc::new(AtomicBool::new(false));
    let (tx, mut rx) = mpsc::unbounded_channel::<TranscriptSegment>();

    // Inference is CPU-bound and blocking; it runs off the async runtime
    // and streams segments back over the channel. Dropping the sender when
    // the engine returns is what ends the consumer loop below.
    let engine_stop = Arc::clone(&stop);
    let engine_task = tokio::task::spawn_blocking(move || {
        let mut forward = move |segment: TranscriptSegment| {
            if engine_stop.load(Ordering::SeqCst) {
                return false;
            }
            tx.send(segment).is_ok()
        };
        engine.transcribe(&samples, &options, &mut forward)
    });

    let mut segments: Vec<SubtitleSegment> = Vec::new();
    let mut completed = true;

    loop {
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                stop.store(true, Ordering::SeqCst);
                completed = false;
                break;
            }
            received = rx.recv() => received,
        };
        let Some(transcript) = received else {
            break;
        };

        let index = segments.len() as u32 + 1;
        let segment = SubtitleSegment::new(
            index,
            transcript.start,
            transcript.end,
            transcript.text.trim(),
        );
        on_segment(&segment);
        if !total_duration.is_zero() {
            on_progress(progress_percent(segment.end, total_duration));
        }
        segments.push(segment);
    }

    // The engine observes the stop flag on its next segment, so this join
    // is bounded by one segment of latency after cancellation.
    let engine_result = engine_task.await;
    if completed {
        match engine_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(join_error) => {
                return Err(SubgenError::TranscriptionInferenceFailed {
                    message: format!("Transcription task failed: {join_error}"),
                });
            }
        }
        if !total_duration.is_zero() {
            on_progress(100);
        }
    }

    Ok(TranscriptOutcome {
        segments,
        completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::transcriber::MockTranscriber;

    async fn drive(
        engine: impl Transcriber + 'static,
        total_duration: Duration,
        cancel: &CancellationToken,
    ) -> (Result<TranscriptOutcome>, Vec<u8>) {
        let mut progress = Vec::new();
        let result = transcribe_stream(
            Arc::new(engine),
            vec![0i16; 160],
            TranscribeOptions::default(),
            total_duration,
            cancel,
            |_| {},
            |percent| progress.push(percent),
        )
        .await;
        (result, progress)
    }

    #[tokio::test]
    async fn test_segments_indexed_from_one_with_progress() {
        let engine = MockTranscriber::new("test")
            .with_segment(0, 3000, "hello")
            .with_segment(3000, 7000, "world");
        let cancel = CancellationToken::new();

        let (result, progress) = drive(engine, Duration::from_secs(10), &cancel).await;
        let outcome = result.unwrap();

        assert!(outcome.completed);
        assert_eq!(outcome.segments.len(), 2);
        assert_eq!(outcome.segments[0].index, 1);
        assert_eq!(outcome.segments[0].text, "hello");
        assert_eq!(outcome.segments[1].index, 2);
        assert_eq!(outcome.segments[1].end, Duration::from_secs(7));
        assert_eq!(progress, vec![30, 70, 100]);
    }

    #[tokio::test]
    async fn test_text_is_trimmed() {
        let engine = MockTranscriber::new("test").with_segment(0, 1000, "  padded text \n");
        let cancel = CancellationToken::new();

        let (result, _) = drive(engine, Duration::from_secs(1), &cancel).await;

        assert_eq!(result.unwrap().segments[0].text, "padded text");
    }

    #[tokio::test]
    async fn test_zero_duration_suppresses_progress() {
        let engine = MockTranscriber::new("test")
            .with_segment(0, 2000, "a")
            .with_segment(2000, 4000, "b");
        let cancel = CancellationToken::new();

        let (result, progress) = drive(engine, Duration::ZERO, &cancel).await;
        let outcome = result.unwrap();

        assert!(outcome.completed);
        assert_eq!(outcome.segments.len(), 2);
        assert!(progress.is_empty(), "no progress events for unknown duration");
    }

    #[tokio::test]
    async fn test_progress_clamped_when_segment_overruns_total() {
        let engine = MockTranscriber::new("test").with_segment(0, 15_000, "overrun");
        let cancel = CancellationToken::new();

        let (result, progress) = drive(engine, Duration::from_secs(10), &cancel).await;

        assert!(result.unwrap().completed);
        assert_eq!(progress, vec![100, 100]);
    }

    #[tokio::test]
    async fn test_empty_stream_forces_final_progress() {
        let engine = MockTranscriber::new("test");
        let cancel = CancellationToken::new();

        let (result, progress) = drive(engine, Duration::from_secs(5), &cancel).await;
        let outcome = result.unwrap();

        assert!(outcome.completed);
        assert!(outcome.segments.is_empty());
        assert_eq!(progress, vec![100]);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let engine = MockTranscriber::new("test").with_failure();
        let cancel = CancellationToken::new();

        let (result, progress) = drive(engine, Duration::from_secs(5), &cancel).await;

        assert!(matches!(
            result,
            Err(SubgenError::TranscriptionInferenceFailed { .. })
        ));
        assert!(progress.is_empty(), "no forced 100 on failure");
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_yields_empty_partial() {
        let engine = MockTranscriber::new("test").with_segment(0, 1000, "never seen");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (result, progress) = drive(engine, Duration::from_secs(5), &cancel).await;
        let outcome = result.unwrap();

        assert!(!outcome.completed);
        assert!(outcome.segments.is_empty());
        assert!(progress.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_keeps_partial_transcript() {
        let engine = MockTranscriber::new("test")
            .with_segment(0, 1000, "one")
            .with_segment(1000, 2000, "two")
            .with_segment(2000, 3000, "three");
        let cancel = CancellationToken::new();

        let mut progress = Vec::new();
        let token = cancel.clone();
        let result = transcribe_stream(
            Arc::new(engine),
            vec![0i16; 160],
            TranscribeOptions::default(),
            Duration::from_secs(10),
            &cancel,
            // Cancelling inside the callback is observed before the next
            // segment is consumed, so exactly one segment survives.
            move |segment| {
                if segment.index == 1 {
                    token.cancel();
                }
            },
            |percent| progress.push(percent),
        )
        .await;
        let outcome = result.unwrap();

        assert!(!outcome.completed);
        assert_eq!(outcome.segments.len(), 1);
        assert_eq!(outcome.segments[0].text, "one");
        assert_eq!(progress, vec![10], "no forced 100 after cancellation");
    }
}
