//! Zip entry extraction for bundled tool archives.
//!
//! Prebuilt extractor bundles bury the binary a few directories deep and the
//! layout shifts between releases, so entries are located by name suffix
//! instead of exact path. Only the matched entry is extracted; its path
//! inside the archive is discarded, which also sidesteps zip path traversal.

use crate::error::{Result, SubgenError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Extract the first file entry whose name ends with `suffix` into
/// `dest_dir`, returning the path of the written file.
///
/// Entry names are normalized to forward slashes and matched
/// case-insensitively, so `bin/ffmpeg.exe` matches `FFmpeg-N\Bin\FFMPEG.EXE`.
/// Blocking; run it on a blocking task from async code.
pub fn unpack_entry_by_suffix(
    archive_path: &Path,
    suffix: &str,
    dest_dir: &Path,
) -> Result<PathBuf> {
    let archive_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_path.display().to_string());

    let file = fs::File::open(archive_path)?;
    let mut zip = ZipArchive::new(file).map_err(|e| SubgenError::AssetDownload {
        asset: archive_name.clone(),
        message: format!("invalid archive: {e}"),
    })?;

    let needle = suffix.replace('\\', "/").to_ascii_lowercase();
    let mut matched = None;
    for i in 0..zip.len() {
        let entry = zip.by_index(i).map_err(|e| SubgenError::AssetDownload {
            asset: archive_name.clone(),
            message: format!("unreadable archive entry: {e}"),
        })?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().replace('\\', "/").to_ascii_lowercase();
        if name.ends_with(&needle) {
            matched = Some(i);
            break;
        }
    }

    let Some(index) = matched else {
        return Err(SubgenError::ArchiveEntryMissing {
            archive: archive_name,
            entry: suffix.to_string(),
        });
    };

    fs::create_dir_all(dest_dir)?;

    let mut entry = zip.by_index(index).map_err(|e| SubgenError::AssetDownload {
        asset: archive_name.clone(),
        message: format!("unreadable archive entry: {e}"),
    })?;
    let entry_name = entry.name().replace('\\', "/");
    let file_part = entry_name.rsplit('/').next().unwrap_or(&entry_name);
    let out_path = dest_dir.join(file_part);

    let mut out = fs::File::create(&out_path)?;
    io::copy(&mut entry, &mut out)?;

    Ok(out_path)
}
