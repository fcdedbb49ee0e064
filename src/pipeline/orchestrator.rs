//! Transcription run orchestration.
//!
//! Drives one media file through validation, tool readiness, duration
//! probing, audio extraction, inference and SRT assembly. The whole run
//! shares one cancellation scope, and the temporary audio file is removed
//! on every exit path.

use crate::assets::{catalog, store, tool};
use crate::defaults;
use crate::error::{Result, SubgenError};
use crate::media::{extract, probe, wav};
use crate::pipeline::driver;
use crate::pipeline::events::{NullEvents, PipelineEvents};
use crate::pipeline::stage::PipelineStage;
use crate::stt::transcriber::{TranscribeOptions, Transcriber};
use crate::stt::whisper::WhisperTranscriber;
use crate::subtitle::SubtitleSegment;
use crate::subtitle::srt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// One transcription run: what to transcribe, with which model, to where.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Video or audio file to transcribe.
    pub input: PathBuf,
    /// Subtitle destination; defaults to the input path with `.srt`.
    pub output: Option<PathBuf>,
    /// Catalog model name (aliases allowed).
    pub model: String,
    /// Per-run inference options.
    pub options: TranscribeOptions,
}

impl RunRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            model: defaults::DEFAULT_MODEL.to_string(),
            options: TranscribeOptions::default(),
        }
    }
}

/// How a run ended, short of failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage finished; subtitles were written.
    Completed {
        segments: Vec<SubtitleSegment>,
        subtitle_path: PathBuf,
    },
    /// The run was cancelled; the partial transcript is retained and
    /// nothing was written.
    Cancelled { segments: Vec<SubtitleSegment> },
}

/// Subtitle pipeline: input media → extraction tool → inference → SRT.
///
/// At most one run is active at a time; a second `run` call while busy
/// fails with [`SubgenError::PipelineBusy`]. `cancel` aborts the active
/// run from any task.
pub struct Pipeline {
    events: Arc<dyn PipelineEvents>,
    engine: Option<Arc<dyn Transcriber>>,
    models_dir: PathBuf,
    tools_dir: PathBuf,
    extractor_path: Option<PathBuf>,
    busy: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("models_dir", &self.models_dir)
            .field("tools_dir", &self.tools_dir)
            .field("extractor_path", &self.extractor_path)
            .field("busy", &self.busy.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Resets the busy flag and cancel slot even when the run future is
/// dropped mid-stage.
struct RunGuard<'a>(&'a Pipeline);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.0.cancel_slot() = None;
        self.0.busy.store(false, Ordering::SeqCst);
    }
}

impl Pipeline {
    /// Creates a pipeline with silent events and default asset directories.
    pub fn new() -> Self {
        Self {
            events: Arc::new(NullEvents),
            engine: None,
            models_dir: store::models_dir(),
            tools_dir: store::tools_dir(),
            extractor_path: None,
            busy: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    /// Sets the consumer that receives log, progress and stage events.
    pub fn with_events(mut self, events: Arc<dyn PipelineEvents>) -> Self {
        self.events = events;
        self
    }

    /// Injects a transcription engine, bypassing model resolution
    /// (used by tests and embedders with their own engine).
    pub fn with_engine(mut self, engine: Arc<dyn Transcriber>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Overrides the directory model files are resolved from.
    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    /// Overrides the directory a downloaded extraction tool lands in.
    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = dir.into();
        self
    }

    /// Uses a specific extraction tool binary instead of discovery.
    pub fn with_extractor_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.extractor_path = Some(path.into());
        self
    }

    /// Cancel the active run, if any. Safe to call from any task; a no-op
    /// when idle.
    pub fn cancel(&self) {
        if let Some(token) = self.cancel_slot().as_ref() {
            token.cancel();
        }
    }

    /// True while a run is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn cancel_slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the full pipeline for one request.
    ///
    /// Returns `Ok(RunOutcome::Cancelled { .. })` when the run was cancelled
    /// at any stage; errors are real failures. Either way the pipeline is
    /// idle and restartable afterwards.
    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SubgenError::PipelineBusy);
        }
        let guard = RunGuard(self);

        let cancel = CancellationToken::new();
        *self.cancel_slot() = Some(cancel.clone());

        let result = self.run_inner(&request, &cancel).await;
        drop(guard);

        let result = match result {
            Err(SubgenError::Cancelled) => Ok(RunOutcome::Cancelled {
                segments: Vec::new(),
            }),
            other => other,
        };

        match &result {
            Ok(RunOutcome::Completed { .. }) => {
                self.events.on_stage_change(PipelineStage::Done);
            }
            Ok(RunOutcome::Cancelled { .. }) => {
                self.events.on_stage_change(PipelineStage::Cancelled);
            }
            Err(_) => {
                self.events.on_stage_change(PipelineStage::Failed);
            }
        }

        result
    }

    async fn run_inner(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let events = &self.events;

        events.on_stage_change(PipelineStage::ValidatingInputs);
        let model_path = self.validate(request)?;

        events.on_stage_change(PipelineStage::EnsuringAssets);
        let extractor = {
            let mut on_log = |line: String| events.on_log(&line);
            let mut on_percent = |percent| events.on_progress(PipelineStage::EnsuringAssets, percent);
            tool::ensure_extractor(
                self.extractor_path.as_deref(),
                &self.tools_dir,
                cancel,
                &mut on_log,
                &mut on_percent,
            )
            .await?
        };

        events.on_stage_change(PipelineStage::Probing);
        let total_duration = probe::probe_duration(&extractor, &request.input).await;
        if total_duration.is_zero() {
            events.on_log("Could not determine media duration; progress reporting disabled");
        } else {
            events.on_log(&format!(
                "Media duration: {}",
                srt::format_timecode(total_duration)
            ));
        }
        if cancel.is_cancelled() {
            return Err(SubgenError::Cancelled);
        }

        events.on_stage_change(PipelineStage::Extracting);
        // TempPath removes the file on drop, which covers the error,
        // cancellation and success paths alike.
        let temp_audio = tempfile::Builder::new()
            .prefix("subgen-audio-")
            .suffix(".wav")
            .tempfile()?
            .into_temp_path();
        extract::extract_audio(&extractor, &request.input, &temp_audio, cancel).await?;

        let audio_path = temp_audio.to_path_buf();
        let samples = tokio::task::spawn_blocking(move || wav::read_pcm16(&audio_path))
            .await
            .map_err(|e| SubgenError::Other(format!("Audio read task failed: {e}")))??;
        events.on_log(&format!(
            "Extracted {:.1} s of audio",
            samples.len() as f64 / defaults::SAMPLE_RATE as f64
        ));
        if cancel.is_cancelled() {
            return Err(SubgenError::Cancelled);
        }

        events.on_stage_change(PipelineStage::Transcribing);
        let engine = match &self.engine {
            Some(engine) => Arc::clone(engine),
            None => self.load_engine(model_path).await?,
        };
        events.on_log(&format!("Transcribing with model {}", engine.model_name()));

        let outcome = driver::transcribe_stream(
            engine,
            samples,
            request.options.clone(),
            total_duration,
            cancel,
            |segment| {
                events.on_log(&format!(
                    "[{} --> {}] {}",
                    srt::format_timecode(segment.start),
                    srt::format_timecode(segment.end),
                    segment.text
                ));
            },
            |percent| events.on_progress(PipelineStage::Transcribing, percent),
        )
        .await?;

        if !outcome.completed {
            return Ok(RunOutcome::Cancelled {
                segments: outcome.segments,
            });
        }

        events.on_stage_change(PipelineStage::Assembling);
        let subtitle_path = request
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&request.input));
        let srt_text = srt::serialize(&outcome.segments);
        tokio::fs::write(&subtitle_path, &srt_text).await?;
        events.on_log(&format!(
            "Wrote {} segment(s) to {}",
            outcome.segments.len(),
            subtitle_path.display()
        ));

        Ok(RunOutcome::Completed {
            segments: outcome.segments,
            subtitle_path,
        })
    }

    /// Input checks that fail the run before anything is spawned.
    /// Returns the model file to load, or None when an engine was injected.
    fn validate(&self, request: &RunRequest) -> Result<Option<PathBuf>> {
        if !request.input.is_file() {
            return Err(SubgenError::InputFileNotFound {
                path: request.input.display().to_string(),
            });
        }

        if !(0.0..=1.0).contains(&request.options.temperature) {
            return Err(SubgenError::ConfigInvalidValue {
                key: "temperature".to_string(),
                message: format!(
                    "must be between 0.0 and 1.0, got {}",
                    request.options.temperature
                ),
            });
        }

        if self.engine.is_some() {
            return Ok(None);
        }

        let model = catalog::get_model(&request.model).ok_or_else(|| SubgenError::UnknownModel {
            name: request.model.clone(),
        })?;
        let model_path = store::model_path(&self.models_dir, model.name);
        if !model_path.is_file() {
            return Err(SubgenError::TranscriptionModelNotFound {
                path: model_path.display().to_string(),
            });
        }
        Ok(Some(model_path))
    }

    /// Load the whisper model off the async runtime; this can take seconds
    /// for the larger models.
    async fn load_engine(&self, model_path: Option<PathBuf>) -> Result<Arc<dyn Transcriber>> {
        let path = model_path.ok_or_else(|| SubgenError::Other(
            "No engine injected and no model path resolved".to_string(),
        ))?;
        let transcriber = tokio::task::spawn_blocking(move || WhisperTranscriber::new(&path))
            .await
            .map_err(|e| SubgenError::Other(format!("Model load task failed: {e}")))??;
        Ok(Arc::new(transcriber))
    }
}

/// Sibling `.srt` path for an input file.
fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(defaults::SUBTITLE_EXTENSION)
}
