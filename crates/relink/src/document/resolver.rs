//! Converted-sibling resolution
//!
//! Decides whether an image reference has a converted counterpart on disk.
//! The extension gate here is what keeps arbitrary tokens like `notes.txt`
//! from ever becoming candidates.

use std::path::{Path, PathBuf};

/// Raster image extensions eligible for conversion (compared case-insensitively).
pub const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

/// Extension of the converted variant.
pub const TARGET_EXTENSION: &str = "webp";

/// Split a path string into stem and extension (without the dot).
///
/// Only the final path component is considered and leading dots of that
/// component do not start an extension, so `.hidden` has no extension.
fn split_extension(raw: &str) -> Option<(&str, &str)> {
    let name_start = raw.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    let name = &raw[name_start..];
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    let dot = name[leading_dots..].rfind('.')? + leading_dots;
    let split_at = name_start + dot;
    Some((&raw[..split_at], &raw[split_at + 1..]))
}

/// Whether `raw` ends in one of the [`SOURCE_EXTENSIONS`].
pub fn has_source_extension(raw: &str) -> bool {
    split_extension(raw)
        .map(|(_, ext)| {
            SOURCE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// Path string of the converted variant, keeping the original casing and
/// separators. Returns `None` for paths without a source extension.
///
/// ```
/// use relink::document::converted_name;
///
/// assert_eq!(converted_name("img/Logo.JPG").as_deref(), Some("img/Logo.webp"));
/// assert_eq!(converted_name("notes.txt"), None);
/// ```
pub fn converted_name(raw: &str) -> Option<String> {
    if !has_source_extension(raw) {
        return None;
    }
    let (stem, _) = split_extension(raw)?;
    Some(format!("{}.{}", stem, TARGET_EXTENSION))
}

/// Converted sibling of an image file on disk.
pub fn converted_sibling(path: &Path) -> PathBuf {
    path.with_extension(TARGET_EXTENSION)
}

/// Resolves image references relative to a document's directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_dir: PathBuf,
    site_root: Option<PathBuf>,
}

impl PathResolver {
    /// Resolver for references found in documents under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            site_root: None,
        }
    }

    /// Resolve root-relative references (`/images/a.jpg`) against `root`
    /// instead of the filesystem root.
    pub fn with_site_root(mut self, root: Option<PathBuf>) -> Self {
        self.site_root = root;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Converted path for `raw` if its converted sibling exists.
    ///
    /// The returned string is the reference as it should be written back
    /// into the document: same directory part and style as `raw`, only the
    /// extension changes.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        if raw.is_empty() || raw.contains("://") {
            return None;
        }

        let converted = converted_name(raw)?;
        let location = self.locate(&converted);
        if location.is_file() {
            Some(converted)
        } else {
            None
        }
    }

    fn locate(&self, converted: &str) -> PathBuf {
        if let (Some(root), Some(stripped)) = (&self.site_root, converted.strip_prefix('/')) {
            return root.join(stripped);
        }

        let path = Path::new(converted);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.jpg"), Some(("a", "jpg")));
        assert_eq!(split_extension("dir.v2/a"), None);
        assert_eq!(split_extension("img/a.b.png"), Some(("img/a.b", "png")));
        assert_eq!(split_extension(".hidden"), None);
        assert_eq!(split_extension("..\\x.bmp"), Some(("..\\x", "bmp")));
    }

    #[test]
    fn test_extension_gate_is_case_insensitive() {
        assert!(has_source_extension("a.JPG"));
        assert!(has_source_extension("a.Jpeg"));
        assert!(has_source_extension("scan.tiff"));
        assert!(!has_source_extension("a.webp"));
        assert!(!has_source_extension("notes.txt"));
        assert!(!has_source_extension("jpg"));
    }

    #[test]
    fn test_converted_name_preserves_style() {
        assert_eq!(
            converted_name("./img/Photo.PNG").as_deref(),
            Some("./img/Photo.webp")
        );
        assert_eq!(
            converted_name("..\\pics\\a.jpeg").as_deref(),
            Some("..\\pics\\a.webp")
        );
        assert_eq!(converted_name("a.gif"), None);
    }

    #[test]
    fn test_resolve_requires_existing_sibling() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path());

        assert_eq!(resolver.resolve("a.jpg"), None);

        fs::write(temp.path().join("a.webp"), b"webp").unwrap();
        assert_eq!(resolver.resolve("a.jpg").as_deref(), Some("a.webp"));

        fs::remove_file(temp.path().join("a.webp")).unwrap();
        assert_eq!(resolver.resolve("a.jpg"), None);
    }

    #[test]
    fn test_resolve_relative_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("img")).unwrap();
        fs::write(temp.path().join("img/b.webp"), b"webp").unwrap();

        let resolver = PathResolver::new(temp.path());
        assert_eq!(resolver.resolve("img/b.png").as_deref(), Some("img/b.webp"));
        assert_eq!(
            resolver.resolve("./img/b.png").as_deref(),
            Some("./img/b.webp")
        );
    }

    #[test]
    fn test_resolve_rejects_non_image_extension() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("notes.webp"), b"webp").unwrap();
        let resolver = PathResolver::new(temp.path());
        assert_eq!(resolver.resolve("notes.txt"), None);
    }

    #[test]
    fn test_resolve_absolute_path() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("abs.webp"), b"webp").unwrap();
        let raw = temp.path().join("abs.jpg").to_string_lossy().to_string();

        let resolver = PathResolver::new("/nonexistent-base");
        let expected = temp.path().join("abs.webp").to_string_lossy().to_string();
        assert_eq!(resolver.resolve(&raw), Some(expected));
    }

    #[test]
    fn test_resolve_root_relative_with_site_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("static/images")).unwrap();
        fs::write(temp.path().join("static/images/c.webp"), b"webp").unwrap();

        let resolver = PathResolver::new(temp.path().join("content/posts"))
            .with_site_root(Some(temp.path().join("static")));
        assert_eq!(
            resolver.resolve("/images/c.jpg").as_deref(),
            Some("/images/c.webp")
        );
    }

    #[test]
    fn test_resolve_skips_urls() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path());
        assert_eq!(resolver.resolve("https://example.com/a.jpg"), None);
        assert_eq!(resolver.resolve(""), None);
    }

    #[test]
    fn test_directory_named_like_sibling_is_not_a_match() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("d.webp")).unwrap();
        let resolver = PathResolver::new(temp.path());
        assert_eq!(resolver.resolve("d.jpg"), None);
    }

    #[test]
    fn test_converted_sibling() {
        assert_eq!(
            converted_sibling(Path::new("a/b.jpeg")),
            PathBuf::from("a/b.webp")
        );
    }
}
