//! Audio extractor (ffmpeg) resolution.
//!
//! Resolution order: explicit configuration, the subgen tools directory, the
//! system PATH, and finally a prebuilt bundle download where one exists.
//! The resolved path is cached for the rest of the process behind a
//! single-flight lock, so concurrent callers share one probe or download and
//! later runs skip the whole step. An explicit configuration bypasses the
//! cache entirely.

use crate::defaults::EXTRACTOR_BINARY;
use crate::error::{Result, SubgenError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

static EXTRACTOR_CACHE: OnceLock<Mutex<Option<PathBuf>>> = OnceLock::new();

fn cache() -> &'static Mutex<Option<PathBuf>> {
    EXTRACTOR_CACHE.get_or_init(|| Mutex::new(None))
}

/// Forget the cached extractor path.
///
/// Test hook; outside tests the cache lives until process exit.
#[cfg(test)]
pub(crate) async fn reset_cache() {
    *cache().lock().await = None;
}

/// Resolve the extraction tool, downloading it if necessary.
///
/// `on_log` receives human-readable status lines; `on_percent` receives
/// download progress when a download happens. Holding the cache lock for the
/// whole resolution makes concurrent calls wait for the first one's result
/// instead of racing the probe or the download.
pub async fn ensure_extractor(
    configured: Option<&Path>,
    tools_dir: &Path,
    cancel: &CancellationToken,
    on_log: &mut (dyn FnMut(String) + Send),
    on_percent: &mut (dyn FnMut(u8) + Send),
) -> Result<PathBuf> {
    if cancel.is_cancelled() {
        return Err(SubgenError::Cancelled);
    }

    // An explicit configuration is honored or rejected, never silently
    // bypassed; it does not go through the process-wide cache.
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(SubgenError::ExtractorNotFound {
            message: format!("configured extractor {} does not exist", path.display()),
        });
    }

    let mut cached = cache().lock().await;
    if let Some(path) = cached.as_ref()
        && extractor_usable(path)
    {
        return Ok(path.clone());
    }

    let resolved = resolve_extractor(tools_dir, cancel, on_log, on_percent).await?;
    *cached = Some(resolved.clone());
    Ok(resolved)
}

/// A bare command name (resolved through PATH) is always considered usable;
/// explicit paths must exist on disk.
fn extractor_usable(path: &Path) -> bool {
    path.parent().is_none_or(|p| p.as_os_str().is_empty()) || path.exists()
}

async fn resolve_extractor(
    tools_dir: &Path,
    cancel: &CancellationToken,
    on_log: &mut (dyn FnMut(String) + Send),
    on_percent: &mut (dyn FnMut(u8) + Send),
) -> Result<PathBuf> {
    let bundled = tools_dir.join(EXTRACTOR_BINARY);
    if bundled.exists() {
        return Ok(bundled);
    }

    if let Some(system) = find_on_path().await {
        on_log(format!("Using system {}", EXTRACTOR_BINARY));
        return Ok(system);
    }

    download_bundle(tools_dir, cancel, on_log, on_percent).await
}

/// Probe PATH by asking the binary for its version.
async fn find_on_path() -> Option<PathBuf> {
    let status = tokio::process::Command::new(EXTRACTOR_BINARY)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => Some(PathBuf::from(EXTRACTOR_BINARY)),
        _ => None,
    }
}

#[cfg(all(feature = "download", windows))]
async fn download_bundle(
    tools_dir: &Path,
    cancel: &CancellationToken,
    on_log: &mut (dyn FnMut(String) + Send),
    on_percent: &mut (dyn FnMut(u8) + Send),
) -> Result<PathBuf> {
    use crate::assets::archive::unpack_entry_by_suffix;
    use crate::assets::catalog::AssetDescriptor;
    use crate::assets::fetcher::{fetch, format_bytes, format_speed};
    use crate::defaults::{EXTRACTOR_ARCHIVE_URL, EXTRACTOR_ENTRY_SUFFIX};

    let descriptor = AssetDescriptor {
        file_name: "ffmpeg-bundle.zip".to_string(),
        url: EXTRACTOR_ARCHIVE_URL.to_string(),
        label: "ffmpeg bundle".to_string(),
        // The "latest" bundle rolls, so there is no stable declared size.
        declared_size: None,
    };

    on_log(format!("{} not found, downloading a prebuilt bundle", EXTRACTOR_BINARY));
    let archive_path = tools_dir.join(&descriptor.file_name);
    let started = std::time::Instant::now();
    let mut downloaded = 0u64;
    fetch(&descriptor, &archive_path, cancel, |p| {
        downloaded = p.bytes_received;
        if let Some(pct) = p.percent {
            on_percent(pct);
        }
    })
    .await?;
    let elapsed = started.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 { downloaded as f64 / elapsed } else { 0.0 };
    on_log(format!(
        "Downloaded {} ({}, {})",
        descriptor.label,
        format_bytes(downloaded),
        format_speed(rate)
    ));

    let dest = tools_dir.to_path_buf();
    let archive_for_unpack = archive_path.clone();
    let binary = tokio::task::spawn_blocking(move || {
        unpack_entry_by_suffix(&archive_for_unpack, EXTRACTOR_ENTRY_SUFFIX, &dest)
    })
    .await
    .map_err(|e| SubgenError::Other(format!("archive unpack task failed: {e}")))??;

    if let Err(e) = std::fs::remove_file(&archive_path) {
        on_log(format!("Could not remove downloaded archive: {e}"));
    }

    on_log(format!("Audio extractor installed at {}", binary.display()));
    Ok(binary)
}

#[cfg(all(feature = "download", not(windows)))]
async fn download_bundle(
    _tools_dir: &Path,
    _cancel: &CancellationToken,
    _on_log: &mut (dyn FnMut(String) + Send),
    _on_percent: &mut (dyn FnMut(u8) + Send),
) -> Result<PathBuf> {
    // Prebuilt bundles are only published as zip for Windows; everywhere
    // else a package manager does this better.
    Err(SubgenError::ExtractorNotFound {
        message: format!(
            "{EXTRACTOR_BINARY} is not installed. Install it with your package manager \
             (e.g. `apt install ffmpeg`) or set assets.extractor_path in the config"
        ),
    })
}

#[cfg(not(feature = "download"))]
async fn download_bundle(
    _tools_dir: &Path,
    _cancel: &CancellationToken,
    _on_log: &mut (dyn FnMut(String) + Send),
    _on_percent: &mut (dyn FnMut(u8) + Send),
) -> Result<PathBuf> {
    Err(SubgenError::ExtractorNotFound {
        message: format!(
            "{EXTRACTOR_BINARY} is not installed and this build cannot download it \
             (rebuild with `--features download`). Install it or set \
             assets.extractor_path in the config"
        ),
    })
}
