//! Candidate collection
//!
//! Runs the pattern set over a document region, keeps only references whose
//! converted sibling exists, and attaches the review context shown to a
//! human before a rewrite is applied.

use super::edit::TextEdit;
use super::frontmatter::FrontMatter;
use super::patterns::{
    locate_metadata_value, PatternOptions, PatternSet, RawReference, ReferenceKind,
};
use super::resolver::PathResolver;
use serde::Serialize;
use std::ops::Range;
use tracing::debug;

/// Front-matter key holding the cover image path.
pub const DEFAULT_METADATA_KEY: &str = "image";

/// Characters of review context shown on each side of a path.
pub const DEFAULT_CONTEXT_CHARS: usize = 5;

/// Part of a document a candidate was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    FrontMatter,
    Body,
}

/// Text immediately around a path, for human review only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Context {
    pub before: String,
    pub after: String,
}

/// A reference whose converted sibling exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub kind: ReferenceKind,
    pub region: Region,
    /// Byte range of the path within its region's text.
    pub path_span: Range<usize>,
    pub original: String,
    pub converted: String,
    /// Markup as written in the document.
    pub matched: String,
    /// Markup after the rewrite.
    pub replacement: String,
    pub context: Context,
}

impl Candidate {
    fn from_reference(
        reference: &RawReference,
        region: Region,
        text: &str,
        converted: String,
        context_chars: usize,
    ) -> Self {
        Self {
            kind: reference.kind,
            region,
            path_span: reference.path_span.clone(),
            original: reference.path(text).to_string(),
            matched: reference.matched(text).to_string(),
            replacement: reference.reconstruct(text, &converted),
            context: context_around(text, &reference.path_span, context_chars),
            converted,
        }
    }

    /// One-line human label, e.g. `[standard link] logo.jpg -> logo.webp`.
    pub fn label(&self) -> String {
        format!(
            "[{}] {} -> {}",
            self.kind.label(),
            self.original,
            self.converted
        )
    }

    /// Context line before the rewrite, e.g. `...hoto 555.jpg is g...`.
    pub fn before_text(&self) -> String {
        format!(
            "...{}{}{}...",
            self.context.before, self.original, self.context.after
        )
    }

    /// Context line after the rewrite.
    pub fn after_text(&self) -> String {
        format!(
            "...{}{}{}...",
            self.context.before, self.converted, self.context.after
        )
    }

    /// Span edit that applies this candidate to its region's text.
    pub fn edit(&self) -> TextEdit {
        TextEdit::new(self.path_span.clone(), self.converted.clone())
    }
}

fn context_around(text: &str, span: &Range<usize>, width: usize) -> Context {
    let start = text[..span.start]
        .char_indices()
        .rev()
        .take(width)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(span.start);
    let end = text[span.end..]
        .char_indices()
        .nth(width)
        .map(|(i, _)| span.end + i)
        .unwrap_or(text.len());

    Context {
        before: text[start..span.start].to_string(),
        after: text[span.end..end].to_string(),
    }
}

/// Finds candidates in document regions.
///
/// # Example
///
/// ```
/// use relink::document::{PathResolver, ReferenceScanner};
///
/// let scanner = ReferenceScanner::builtin().unwrap();
/// let resolver = PathResolver::new("/nonexistent");
///
/// // No converted sibling on disk, so nothing is offered.
/// assert!(scanner.scan_body("![logo](logo.jpg)", &resolver).is_empty());
/// ```
pub struct ReferenceScanner {
    patterns: PatternSet,
    metadata_key: String,
    context_chars: usize,
}

impl ReferenceScanner {
    pub fn new(patterns: PatternSet, metadata_key: impl Into<String>, context_chars: usize) -> Self {
        Self {
            patterns,
            metadata_key: metadata_key.into(),
            context_chars,
        }
    }

    pub fn builtin() -> Result<Self, regex::Error> {
        Ok(Self::new(
            PatternSet::new(&PatternOptions::default())?,
            DEFAULT_METADATA_KEY,
            DEFAULT_CONTEXT_CHARS,
        ))
    }

    pub fn metadata_key(&self) -> &str {
        &self.metadata_key
    }

    /// Candidates in the document body, in syntax order then left to right.
    pub fn scan_body(&self, body: &str, resolver: &PathResolver) -> Vec<Candidate> {
        self.patterns
            .find_all(body)
            .iter()
            .filter_map(|reference| {
                let converted = resolver.resolve(reference.path(body))?;
                debug!(
                    kind = reference.kind.label(),
                    path = reference.path(body),
                    "found candidate"
                );
                Some(Candidate::from_reference(
                    reference,
                    Region::Body,
                    body,
                    converted,
                    self.context_chars,
                ))
            })
            .collect()
    }

    /// Candidate for the designated metadata field, if any.
    ///
    /// Spans are relative to `front_matter.content`. Nothing is returned when
    /// the block did not parse as a mapping.
    pub fn scan_front_matter(
        &self,
        front_matter: &FrontMatter<'_>,
        resolver: &PathResolver,
    ) -> Vec<Candidate> {
        let Some(value) = front_matter.string_field(&self.metadata_key) else {
            return Vec::new();
        };
        let Some(converted) = resolver.resolve(value) else {
            return Vec::new();
        };
        let Some(reference) =
            locate_metadata_value(front_matter.content, &self.metadata_key, value)
        else {
            return Vec::new();
        };

        vec![Candidate::from_reference(
            &reference,
            Region::FrontMatter,
            front_matter.content,
            converted,
            self.context_chars,
        )]
    }
}
