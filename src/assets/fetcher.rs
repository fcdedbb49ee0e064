//! Streaming asset downloads with progress reporting.
//!
//! Downloads are written straight to their destination path. A failed or
//! cancelled transfer leaves a partial file behind; it fails the size check
//! on the next attempt and is downloaded again from scratch. There is no
//! resume support.

use crate::assets::catalog::{AssetDescriptor, get_model};
use crate::assets::store;
use crate::defaults::{PROGRESS_INTERVAL_MS, SIZE_TOLERANCE_BYTES};
use crate::error::{Result, SubgenError};
use futures_util::StreamExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Snapshot of a transfer in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub bytes_received: u64,
    /// Total transfer size, when the server or catalog declares one.
    pub total_bytes: Option<u64>,
    /// Bytes per second since the previous report.
    pub rate: f64,
    /// 0-100 when the total is known, `None` for indeterminate transfers.
    pub percent: Option<u8>,
}

/// How a fetch concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination already held a file matching the declared size;
    /// nothing was transferred.
    AlreadyPresent,
    Downloaded,
}

/// Check a file size against a declared size, allowing the tolerance slack.
///
/// An unknown declared size never matches: without a reference there is no
/// way to tell a complete file from a truncated one.
pub fn matches_declared_size(actual: u64, declared: Option<u64>) -> bool {
    match declared {
        Some(declared) => actual.abs_diff(declared) <= SIZE_TOLERANCE_BYTES,
        None => false,
    }
}

/// Download `descriptor` to `destination`, reporting progress via `on_progress`.
///
/// Skips the transfer entirely (zero network reads) when the destination
/// already holds a file within [`SIZE_TOLERANCE_BYTES`] of the declared size.
/// Progress is reported at most every [`PROGRESS_INTERVAL_MS`], plus one
/// final 100% event once the stream is exhausted.
pub async fn fetch(
    descriptor: &AssetDescriptor,
    destination: &Path,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(&DownloadProgress),
) -> Result<FetchOutcome> {
    if let Ok(metadata) = fs::metadata(destination)
        && metadata.is_file()
        && matches_declared_size(metadata.len(), descriptor.declared_size)
    {
        return Ok(FetchOutcome::AlreadyPresent);
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let client = reqwest::Client::new();
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SubgenError::Cancelled),
        response = client.get(&descriptor.url).send() => {
            response.map_err(|e| SubgenError::AssetDownload {
                asset: descriptor.file_name.clone(),
                message: e.to_string(),
            })?
        }
    };

    if !response.status().is_success() {
        return Err(SubgenError::AssetHttpStatus {
            asset: descriptor.file_name.clone(),
            status: response.status().to_string(),
        });
    }

    let total_bytes = response.content_length().or(descriptor.declared_size);

    let mut file = fs::File::create(destination)?;
    let mut stream = response.bytes_stream();

    let interval = Duration::from_millis(PROGRESS_INTERVAL_MS);
    let mut received: u64 = 0;
    let mut last_report = Instant::now();
    let mut bytes_since_report: u64 = 0;

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SubgenError::Cancelled),
            chunk = stream.next() => match chunk {
                Some(chunk) => chunk.map_err(|e| SubgenError::AssetDownload {
                    asset: descriptor.file_name.clone(),
                    message: e.to_string(),
                })?,
                None => break,
            },
        };

        file.write_all(&chunk)?;
        received += chunk.len() as u64;
        bytes_since_report += chunk.len() as u64;

        let elapsed = last_report.elapsed();
        if elapsed >= interval {
            on_progress(&DownloadProgress {
                bytes_received: received,
                total_bytes,
                rate: bytes_since_report as f64 / elapsed.as_secs_f64(),
                percent: percent(received, total_bytes),
            });
            last_report = Instant::now();
            bytes_since_report = 0;
        }
    }
    file.flush()?;

    // The stream is exhausted, so the received count is the true total.
    on_progress(&DownloadProgress {
        bytes_received: received,
        total_bytes: Some(received),
        rate: 0.0,
        percent: Some(100),
    });

    Ok(FetchOutcome::Downloaded)
}

/// Download a Whisper model into `models_dir`.
///
/// Returns the model path and how the fetch concluded. A file already on
/// disk within the size tolerance is left untouched.
pub async fn download_model(
    models_dir: &Path,
    name: &str,
    cancel: &CancellationToken,
    on_progress: impl FnMut(&DownloadProgress),
) -> Result<(PathBuf, FetchOutcome)> {
    let info = get_model(name).ok_or_else(|| SubgenError::UnknownModel {
        name: name.to_string(),
    })?;
    let path = store::model_path(models_dir, info.name);
    let outcome = fetch(&info.descriptor(), &path, cancel, on_progress).await?;
    Ok((path, outcome))
}

fn percent(received: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(0) | None => None,
        Some(total) => Some(((received.saturating_mul(100) / total).min(100)) as u8),
    }
}

/// Format a byte count for humans: `B` through `TB`, up to two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{} B", bytes);
    }
    let formatted = format!("{size:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Format a transfer rate for humans.
pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec.max(0.0) as u64))
}
