//! Audio extraction subprocess management.
//!
//! Runs the extraction tool to decode any input container into the PCM
//! format the transcription engine consumes. The subprocess is supervised
//! for cancellation: a cancelled run terminates the child and reports
//! [`SubgenError::Cancelled`], never a tool failure.

use crate::defaults::{AUDIO_CHANNELS, SAMPLE_RATE};
use crate::error::{Result, SubgenError};
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

/// Decode `input` into a 16 kHz mono 16-bit PCM WAV at `output`.
///
/// Stderr is captured in full and becomes the diagnostics of a
/// [`SubgenError::ToolFailed`] when the tool exits non-zero.
pub async fn extract_audio(
    tool: &Path,
    input: &Path,
    output: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let tool_name = tool
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.display().to_string());

    let mut child = tokio::process::Command::new(tool)
        .arg("-i")
        .arg(input)
        .arg("-ar")
        .arg(SAMPLE_RATE.to_string())
        .arg("-ac")
        .arg(AUDIO_CHANNELS.to_string())
        .arg("-c:a")
        .arg("pcm_s16le")
        .arg(output)
        .arg("-y")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| SubgenError::ToolLaunch {
            tool: tool_name.clone(),
            message: e.to_string(),
        })?;

    // Drain stderr concurrently so a chatty tool never blocks on a full pipe.
    let mut stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut diagnostics = String::new();
        if let Some(ref mut pipe) = stderr {
            let _unused = pipe.read_to_string(&mut diagnostics).await;
        }
        diagnostics
    });

    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            child.start_kill().ok();
            child.wait().await.ok();
            stderr_task.abort();
            return Err(SubgenError::Cancelled);
        }
        status = child.wait() => status?,
    };

    let diagnostics = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(SubgenError::ToolFailed {
            tool: tool_name,
            code: status.code().unwrap_or(-1),
            diagnostics: diagnostics.trim().to_string(),
        });
    }

    Ok(())
}
