//! Media duration probing via the extraction tool's diagnostics.
//!
//! ffmpeg prints stream metadata on stderr when invoked without an output
//! target. The duration marker in that text is the only part we need; the
//! probe's exit status is irrelevant (no output file always means a non-zero
//! exit).

use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

static DURATION_RE: OnceLock<Regex> = OnceLock::new();

fn duration_re() -> &'static Regex {
    DURATION_RE.get_or_init(|| {
        // Hardcoded pattern, cannot fail to compile.
        #[allow(clippy::expect_used)]
        Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})").expect("valid duration regex")
    })
}

/// Parse the `Duration: HH:MM:SS.cc` marker (centiseconds) out of
/// diagnostic text.
pub fn parse_duration_marker(diagnostics: &str) -> Option<Duration> {
    let caps = duration_re().captures(diagnostics)?;
    let hours: u64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;
    let centis: u64 = caps.get(4)?.as_str().parse().ok()?;
    Some(Duration::from_millis(
        (hours * 3600 + minutes * 60 + seconds) * 1000 + centis * 10,
    ))
}

/// Ask the extraction tool for the input's total duration.
///
/// Returns zero when the duration cannot be determined, for any reason:
/// tool missing, media unreadable, marker absent. Subtitles can still be
/// produced without a total duration; only percentage progress is lost.
pub async fn probe_duration(tool: &Path, media: &Path) -> Duration {
    let output = tokio::process::Command::new(tool)
        .arg("-i")
        .arg(media)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match output {
        Ok(output) => {
            let diagnostics = String::from_utf8_lossy(&output.stderr);
            parse_duration_marker(&diagnostics).unwrap_or(Duration::ZERO)
        }
        Err(_) => Duration::ZERO,
    }
}
