//! Writing assets to the output directory
//!
//! All assets are staged next to their final location first and only renamed
//! into place once every one of them was written. Files they replace are kept
//! aside until every rename succeeded, so a failed write restores the previous
//! output.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::Assets;
use crate::error::{BuildError, BuildResult};

const STAGING_SUFFIX: &str = "modpack-tmp";
const BACKUP_SUFFIX: &str = "modpack-bak";

/// An asset renamed into place, with the file it replaced
struct Committed {
    target: PathBuf,
    backup: Option<PathBuf>,
}

/// Write every asset below `output_dir` and return the written filenames
pub fn write_assets(assets: &Assets, output_dir: &Path) -> BuildResult<Vec<String>> {
    for name in assets.keys() {
        check_asset_name(name)?;
    }

    fs::create_dir_all(output_dir).map_err(|e| BuildError::io(output_dir, e))?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();

    for (name, asset) in assets {
        let target = output_dir.join(name);
        let staging = sibling_path(&target, STAGING_SUFFIX);

        let written = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&staging, asset.as_bytes()));

        if let Err(e) = written {
            discard(&staged);
            let _ = fs::remove_file(&staging);
            return Err(BuildError::io(target, e));
        }

        staged.push((staging, target));
    }

    let mut committed: Vec<Committed> = Vec::new();

    for (i, (staging, target)) in staged.iter().enumerate() {
        match commit(staging, target) {
            Ok(backup) => {
                debug!("Wrote {}", target.display());
                committed.push(Committed {
                    target: target.clone(),
                    backup,
                });
            }
            Err(e) => {
                roll_back(&committed);
                discard(&staged[i..]);
                return Err(BuildError::io(target, e));
            }
        }
    }

    for backup in committed.iter().filter_map(|c| c.backup.as_ref()) {
        if let Err(e) = fs::remove_file(backup) {
            warn!("Failed to remove backup {}: {}", backup.display(), e);
        }
    }

    Ok(assets.keys().cloned().collect())
}

/// Reject names that are absolute or climb out of the output directory
fn check_asset_name(name: &str) -> BuildResult<()> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if name.is_empty() || escapes {
        return Err(BuildError::InvalidAssetName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Move an existing file at `target` aside, then rename `staging` over it.
/// On failure the old file is put back.
fn commit(staging: &Path, target: &Path) -> io::Result<Option<PathBuf>> {
    let backup = match fs::symlink_metadata(target) {
        Ok(meta) if !meta.is_dir() => {
            let backup = sibling_path(target, BACKUP_SUFFIX);
            fs::rename(target, &backup)?;
            Some(backup)
        }
        _ => None,
    };

    if let Err(e) = fs::rename(staging, target) {
        if let Some(backup) = &backup {
            restore(backup, target);
        }
        return Err(e);
    }

    Ok(backup)
}

/// Undo renames that already happened, newest first
fn roll_back(committed: &[Committed]) {
    for entry in committed.iter().rev() {
        if let Err(e) = fs::remove_file(&entry.target) {
            warn!("Failed to remove {}: {}", entry.target.display(), e);
        }
        if let Some(backup) = &entry.backup {
            restore(backup, &entry.target);
        }
    }
}

fn restore(backup: &Path, target: &Path) {
    if let Err(e) = fs::rename(backup, target) {
        warn!(
            "Failed to restore {} from {}: {}",
            target.display(),
            backup.display(),
            e
        );
    }
}

fn sibling_path(target: &Path, suffix: &str) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{}", file_name, suffix))
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        if let Err(e) = fs::remove_file(staging) {
            warn!("Failed to remove staged file {}: {}", staging.display(), e);
        }
    }
}
