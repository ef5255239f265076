//! Which files are documents.
//!
//! A document is any file some registered [`DocFormatAdapter`] claims by
//! extension. Everything else under the folder is left alone by the
//! reference rewrite.

use std::path::Path;

/// A text format whose image references can be rewritten.
///
/// ```
/// use relink::document::{DocFormatAdapter, MarkdownAdapter};
/// use std::path::Path;
///
/// assert!(MarkdownAdapter.claims(Path::new("posts/hello.MD")));
/// assert!(!MarkdownAdapter.claims(Path::new("posts/hello.mdx")));
/// ```
pub trait DocFormatAdapter {
    fn id(&self) -> &str;

    /// Lowercase extensions without the dot.
    fn extensions(&self) -> &[&str];

    fn claims(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}

/// `.md` and `.markdown` files with optional YAML front matter.
pub struct MarkdownAdapter;

impl DocFormatAdapter for MarkdownAdapter {
    fn id(&self) -> &str {
        "markdown"
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }
}

/// Ordered set of document formats; the first adapter claiming a path wins.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn DocFormatAdapter>>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(MarkdownAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Box<dyn DocFormatAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn adapter_for(&self, path: &Path) -> Option<&dyn DocFormatAdapter> {
        self.adapters
            .iter()
            .map(|adapter| adapter.as_ref())
            .find(|adapter| adapter.claims(path))
    }

    pub fn is_document(&self, path: &Path) -> bool {
        self.adapter_for(path).is_some()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
