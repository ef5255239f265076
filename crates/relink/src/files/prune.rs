use super::walk::find_images;
use crate::document::converted_sibling;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Original images under `folder` whose converted sibling exists.
pub fn find_prunable(folder: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(find_images(folder)?
        .into_iter()
        .filter(|image| converted_sibling(image).is_file())
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneReport {
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<PruneFailure>,
}

/// Delete every file in `files`, continuing past individual failures.
pub fn delete_files(files: &[PathBuf]) -> PruneReport {
    let mut report = PruneReport::default();
    for file in files {
        match fs::remove_file(file) {
            Ok(()) => {
                info!(file = %file.display(), "deleted");
                report.deleted.push(file.clone());
            }
            Err(e) => {
                warn!(file = %file.display(), "delete failed: {}", e);
                report.failures.push(PruneFailure {
                    path: file.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    report
}
