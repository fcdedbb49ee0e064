//! Terminal rendering of pipeline events.
//! Used by the CLI's default transcription command.

use crate::pipeline::events::PipelineEvents;
use crate::pipeline::stage::PipelineStage;
use std::io::{self, Write};

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Clear the current terminal line (replaces an in-place progress line).
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

/// Uppercase the first character of a stage label for line output.
fn sentence(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Pipeline events rendered to stderr.
///
/// Progress is drawn in place on one line; log lines and stage transitions
/// replace it. Quiet mode suppresses everything (failures are reported by
/// the caller).
#[derive(Debug, Clone, Copy)]
pub struct ConsoleEvents {
    quiet: bool,
}

impl ConsoleEvents {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl PipelineEvents for ConsoleEvents {
    fn on_log(&self, message: &str) {
        if self.quiet {
            return;
        }
        clear_line();
        eprintln!("{message}");
    }

    fn on_progress(&self, stage: PipelineStage, percent: u8) {
        if self.quiet {
            return;
        }
        eprint!("\r\x1b[2K{DIM}{}{RESET} {percent}%", stage.label());
        io::stderr().flush().ok();
    }

    fn on_stage_change(&self, stage: PipelineStage) {
        // Terminal stages are summarized by the caller with full context.
        if self.quiet || stage.is_terminal() {
            return;
        }
        clear_line();
        eprintln!("{DIM}=={RESET} {}", sentence(stage.label()));
    }
}
