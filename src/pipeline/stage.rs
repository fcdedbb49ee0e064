//! Pipeline stage identifiers.

use std::fmt;

/// Lifecycle stages of a transcription run.
///
/// A run moves strictly forward through the non-terminal stages, one active
/// at a time; `Cancelled` and `Failed` are reachable from every non-terminal
/// stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Idle,
    ValidatingInputs,
    EnsuringAssets,
    Probing,
    Extracting,
    Transcribing,
    Assembling,
    Done,
    Cancelled,
    Failed,
}

impl PipelineStage {
    /// Short label for progress display.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::ValidatingInputs => "validating inputs",
            PipelineStage::EnsuringAssets => "preparing tools",
            PipelineStage::Probing => "probing media",
            PipelineStage::Extracting => "extracting audio",
            PipelineStage::Transcribing => "transcribing",
            PipelineStage::Assembling => "writing subtitles",
            PipelineStage::Done => "done",
            PipelineStage::Cancelled => "cancelled",
            PipelineStage::Failed => "failed",
        }
    }

    /// Whether a run that reached this stage has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStage::Done | PipelineStage::Cancelled | PipelineStage::Failed
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
