//! Timestamped backups taken before destructive steps.
//!
//! Two shapes exist: a full copy of the target folder, and a copy of an
//! explicit file list (the originals about to be pruned) that keeps paths
//! relative to the folder. Both land in a fresh directory under the backup
//! root named `<prefix>_<YYYYmmdd_HHMMSS>`.

use crate::errors::RelinkError;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

pub const FOLDER_BACKUP_PREFIX: &str = "backup";
pub const FILES_BACKUP_PREFIX: &str = "deleted_files_backup";

fn backup_error(path: &Path) -> impl FnOnce(io::Error) -> RelinkError + '_ {
    move |source| RelinkError::Backup {
        path: path.to_path_buf(),
        source,
    }
}

/// Create a fresh, empty backup directory under `root`.
///
/// A second backup within the same second gets a numeric suffix instead of
/// reusing the first one.
fn create_backup_dir(root: &Path, prefix: &str, now: DateTime<Local>) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let stamp = format!("{}_{}", prefix, now.format("%Y%m%d_%H%M%S"));

    let mut attempt = 0;
    loop {
        let name = if attempt == 0 {
            stamp.clone()
        } else {
            format!("{}_{}", stamp, attempt)
        };
        let candidate = root.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Copy all of `folder` into a new directory under `backup_root`.
///
/// If the backup root lies inside `folder`, it is left out of the copy.
pub fn backup_folder(
    folder: &Path,
    backup_root: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, RelinkError> {
    let source_root = folder.canonicalize().map_err(backup_error(folder))?;
    let target = create_backup_dir(backup_root, FOLDER_BACKUP_PREFIX, now)
        .map_err(backup_error(backup_root))?;
    let backup_root = backup_root.canonicalize().map_err(backup_error(backup_root))?;

    for entry in WalkDir::new(&source_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !e.path().starts_with(&backup_root))
    {
        let entry = entry.map_err(|e| RelinkError::Backup {
            path: folder.to_path_buf(),
            source: e.into(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(&source_root)
            .unwrap_or(entry.path());
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).map_err(backup_error(&destination))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &destination).map_err(backup_error(entry.path()))?;
        }
    }

    info!(backup = %target.display(), "folder backed up");
    Ok(target)
}

/// Copy `files` (all under `folder`) into a new directory under
/// `backup_root`, preserving their paths relative to `folder`.
pub fn backup_files(
    folder: &Path,
    files: &[PathBuf],
    backup_root: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, RelinkError> {
    let target = create_backup_dir(backup_root, FILES_BACKUP_PREFIX, now)
        .map_err(backup_error(backup_root))?;

    for file in files {
        let relative = match file.strip_prefix(folder) {
            Ok(relative) => relative,
            Err(_) => Path::new(file.file_name().unwrap_or(file.as_os_str())),
        };
        let destination = target.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(backup_error(parent))?;
        }
        fs::copy(file, &destination).map_err(backup_error(file))?;
    }

    info!(backup = %target.display(), files = files.len(), "files backed up");
    Ok(target)
}
