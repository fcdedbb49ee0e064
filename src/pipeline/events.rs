//! Event surface connecting a run to its consumer.

use crate::pipeline::stage::PipelineStage;
use std::sync::Mutex;

/// Callbacks a pipeline consumer implements to observe a run.
///
/// The CLI renders these to the terminal; tests record them. All methods
/// take `&self`, so implementations use interior mutability where they
/// accumulate state.
pub trait PipelineEvents: Send + Sync {
    /// Free-form status line.
    fn on_log(&self, message: &str);

    /// Percentage progress (0..=100) for the given stage.
    fn on_progress(&self, stage: PipelineStage, percent: u8);

    /// The run moved to a new stage.
    fn on_stage_change(&self, stage: PipelineStage);
}

/// Events sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl PipelineEvents for NullEvents {
    fn on_log(&self, _message: &str) {}
    fn on_progress(&self, _stage: PipelineStage, _percent: u8) {}
    fn on_stage_change(&self, _stage: PipelineStage) {}
}

/// Events sink that records everything, for assertions in tests.
#[derive(Debug, Default)]
pub struct MemoryEvents {
    logs: Mutex<Vec<String>>,
    progress: Mutex<Vec<(PipelineStage, u8)>>,
    stages: Mutex<Vec<PipelineStage>>,
}

impl MemoryEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> Vec<String> {
        self.lock_logs().clone()
    }

    pub fn progress(&self) -> Vec<(PipelineStage, u8)> {
        self.lock_progress().clone()
    }

    pub fn stages(&self) -> Vec<PipelineStage> {
        self.lock_stages().clone()
    }

    fn lock_logs(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.logs.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_progress(&self) -> std::sync::MutexGuard<'_, Vec<(PipelineStage, u8)>> {
        self.progress
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_stages(&self) -> std::sync::MutexGuard<'_, Vec<PipelineStage>> {
        self.stages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl PipelineEvents for MemoryEvents {
    fn on_log(&self, message: &str) {
        self.lock_logs().push(message.to_string());
    }

    fn on_progress(&self, stage: PipelineStage, percent: u8) {
        self.lock_progress().push((stage, percent));
    }

    fn on_stage_change(&self, stage: PipelineStage) {
        self.lock_stages().push(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_events_records_in_order() {
        let events = MemoryEvents::new();

        events.on_stage_change(PipelineStage::ValidatingInputs);
        events.on_log("checking input");
        events.on_progress(PipelineStage::Transcribing, 30);
        events.on_progress(PipelineStage::Transcribing, 70);
        events.on_stage_change(PipelineStage::Done);

        assert_eq!(events.logs(), vec!["checking input"]);
        assert_eq!(
            events.progress(),
            vec![
                (PipelineStage::Transcribing, 30),
                (PipelineStage::Transcribing, 70)
            ]
        );
        assert_eq!(
            events.stages(),
            vec![PipelineStage::ValidatingInputs, PipelineStage::Done]
        );
    }

    #[test]
    fn test_null_events_accepts_everything() {
        let events = NullEvents;
        events.on_log("ignored");
        events.on_progress(PipelineStage::Extracting, 50);
        events.on_stage_change(PipelineStage::Failed);
    }

    #[test]
    fn test_events_are_object_safe() {
        let events: Box<dyn PipelineEvents> = Box::new(MemoryEvents::new());
        events.on_log("boxed");
    }
}
