use crate::document::{has_source_extension, AdapterRegistry};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Whether `path` names a convertible raster image.
pub fn is_source_image(path: &Path) -> bool {
    path.file_name()
        .map(|name| has_source_extension(&name.to_string_lossy()))
        .unwrap_or(false)
}

/// Convertible images under `folder`, sorted.
pub fn find_images(folder: &Path) -> io::Result<Vec<PathBuf>> {
    collect_files(folder, is_source_image)
}

/// Documents under `folder` that some registered adapter supports, sorted.
pub fn find_documents(folder: &Path, registry: &AdapterRegistry) -> io::Result<Vec<PathBuf>> {
    collect_files(folder, |path| registry.is_document(path))
}

fn collect_files(folder: &Path, keep: impl Fn(&Path) -> bool) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry?;
        if entry.file_type().is_file() && keep(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
