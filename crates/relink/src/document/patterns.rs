//! Reference syntaxes
//!
//! Each syntax finds the image paths embedded in one kind of markup and
//! reports them as byte ranges into the scanned text. Rewriting is always a
//! substitution of the path range, so the surrounding markup (alt text,
//! other attributes, shortcode structure) is preserved verbatim.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Alternation of the source image extensions used inside patterns.
const IMAGE_EXT: &str = r"(?i:jpg|jpeg|png|bmp|tiff)";

/// Syntax a reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `![alt](path)`
    StandardLink,
    /// `<img src="path">`
    InlineMarkup,
    /// `{{< imgrow img="path" >}}`
    ShortcodeAttribute,
    /// Every quoted image path inside `{{< imgrow "a.jpg" "b.jpg" >}}`
    ShortcodeInlineList,
    /// A whitespace- or quote-delimited token ending in an image extension
    BarePath,
    /// The designated image field of the front matter
    MetadataField,
}

impl ReferenceKind {
    /// Kinds prone to false positives because the path is not delimited by
    /// unambiguous markup.
    pub fn is_risky(self) -> bool {
        matches!(
            self,
            ReferenceKind::BarePath | ReferenceKind::ShortcodeInlineList
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ReferenceKind::StandardLink => "standard link",
            ReferenceKind::InlineMarkup => "inline markup",
            ReferenceKind::ShortcodeAttribute => "shortcode attribute",
            ReferenceKind::ShortcodeInlineList => "shortcode list item",
            ReferenceKind::BarePath => "bare path",
            ReferenceKind::MetadataField => "metadata field",
        }
    }
}

/// A path occurrence found by a syntax matcher, addressed by byte ranges
/// into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    pub kind: ReferenceKind,
    /// Range of the whole matched markup.
    pub span: Range<usize>,
    /// Range of the embedded path inside `span`.
    pub path_span: Range<usize>,
}

impl RawReference {
    pub fn path<'t>(&self, text: &'t str) -> &'t str {
        &text[self.path_span.clone()]
    }

    pub fn matched<'t>(&self, text: &'t str) -> &'t str {
        &text[self.span.clone()]
    }

    /// The matched markup with its path replaced by `converted`.
    pub fn reconstruct(&self, text: &str, converted: &str) -> String {
        let matched = self.matched(text);
        let start = self.path_span.start - self.span.start;
        let end = self.path_span.end - self.span.start;
        format!("{}{}{}", &matched[..start], converted, &matched[end..])
    }

    fn overlaps(&self, other: &Range<usize>) -> bool {
        self.path_span.start < other.end && other.start < self.path_span.end
    }
}

/// A reference syntax: finds every occurrence in a text, left to right.
pub trait ReferenceSyntax {
    fn kind(&self) -> ReferenceKind;

    fn find_all(&self, text: &str) -> Vec<RawReference>;
}

/// `![alt](path "optional title")`
pub struct StandardLinkSyntax {
    pattern: Regex,
}

impl StandardLinkSyntax {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"!\[[^\]]*\]\(([^)]+)\)")?,
        })
    }
}

impl ReferenceSyntax for StandardLinkSyntax {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::StandardLink
    }

    fn find_all(&self, text: &str) -> Vec<RawReference> {
        let mut found = Vec::new();
        for cap in self.pattern.captures_iter(text) {
            let (Some(whole), Some(target)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            if let Some(path) = link_destination(target.as_str()) {
                let start = target.start() + path.start;
                found.push(RawReference {
                    kind: self.kind(),
                    span: whole.range(),
                    path_span: start..start + path.len(),
                });
            }
        }
        found
    }
}

/// Range of the destination inside a link target, dropping an optional
/// title and angle brackets.
fn link_destination(target: &str) -> Option<Range<usize>> {
    let start = target.len() - target.trim_start().len();
    let rest = &target[start..];

    if let Some(inner) = rest.strip_prefix('<') {
        let end = inner.find('>')?;
        return Some(start + 1..start + 1 + end);
    }

    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(start..start + end)
}

/// `<img ... src="path" ...>`
pub struct InlineMarkupSyntax {
    pattern: Regex,
}

impl InlineMarkupSyntax {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*["']([^"'>]*)["']"#)?,
        })
    }
}

impl ReferenceSyntax for InlineMarkupSyntax {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::InlineMarkup
    }

    fn find_all(&self, text: &str) -> Vec<RawReference> {
        captures_to_references(&self.pattern, text, self.kind())
    }
}

/// First quoted image path of a named shortcode, bare or as `name="..."`.
pub struct ShortcodeAttributeSyntax {
    pattern: Regex,
}

impl ShortcodeAttributeSyntax {
    pub fn new(shortcodes: &[String]) -> Result<Self, regex::Error> {
        let pattern = format!(
            r#"\{{\{{<\s*(?:{})\s+(?:[^>}}]*?\s+)?(?:\w+=)?"([^"]+\.{})""#,
            name_alternation(shortcodes),
            IMAGE_EXT
        );
        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }
}

impl ReferenceSyntax for ShortcodeAttributeSyntax {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::ShortcodeAttribute
    }

    fn find_all(&self, text: &str) -> Vec<RawReference> {
        captures_to_references(&self.pattern, text, self.kind())
    }
}

/// Every quoted image path in the argument list of a named shortcode.
pub struct ShortcodeListSyntax {
    shortcode: Regex,
    quoted: Regex,
}

impl ShortcodeListSyntax {
    pub fn new(shortcodes: &[String]) -> Result<Self, regex::Error> {
        let shortcode = format!(
            r"\{{\{{<\s*(?:{})\s+([^>}}]*?)>\}}\}}",
            name_alternation(shortcodes)
        );
        Ok(Self {
            shortcode: Regex::new(&shortcode)?,
            quoted: Regex::new(&format!(r#""([^"]+\.{})""#, IMAGE_EXT))?,
        })
    }
}

impl ReferenceSyntax for ShortcodeListSyntax {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::ShortcodeInlineList
    }

    fn find_all(&self, text: &str) -> Vec<RawReference> {
        let mut found = Vec::new();
        for cap in self.shortcode.captures_iter(text) {
            let Some(args) = cap.get(1) else { continue };
            for inner in self.quoted.captures_iter(args.as_str()) {
                let (Some(quoted), Some(path)) = (inner.get(0), inner.get(1)) else {
                    continue;
                };
                found.push(RawReference {
                    kind: self.kind(),
                    span: args.start() + quoted.start()..args.start() + quoted.end(),
                    path_span: args.start() + path.start()..args.start() + path.end(),
                });
            }
        }
        found
    }
}

/// Any token bounded by whitespace or double quotes that ends in an image
/// extension.
pub struct BarePathSyntax {
    pattern: Regex,
}

impl BarePathSyntax {
    pub fn new() -> Result<Self, regex::Error> {
        let pattern = format!(r#"(?:^|["\s])([^"\s]+\.{})(?:["\s]|$)"#, IMAGE_EXT);
        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }
}

impl ReferenceSyntax for BarePathSyntax {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::BarePath
    }

    fn find_all(&self, text: &str) -> Vec<RawReference> {
        // Resume right after each token so a delimiter shared by two
        // adjacent tokens is not consumed by the first match.
        let mut found = Vec::new();
        let mut at = 0;
        while at <= text.len() {
            let Some(cap) = self.pattern.captures_at(text, at) else {
                break;
            };
            let Some(path) = cap.get(1) else { break };
            found.push(RawReference {
                kind: self.kind(),
                span: path.range(),
                path_span: path.range(),
            });
            at = path.end();
        }
        found
    }
}

fn captures_to_references(pattern: &Regex, text: &str, kind: ReferenceKind) -> Vec<RawReference> {
    pattern
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let path = cap.get(1)?;
            Some(RawReference {
                kind,
                span: whole.range(),
                path_span: path.range(),
            })
        })
        .collect()
}

fn name_alternation(names: &[String]) -> String {
    if names.is_empty() {
        // Matches nothing; keeps the pattern valid when a syntax is disabled.
        return r"[^\s\S]".to_string();
    }
    names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|")
}

/// Locate the value of a top-level `key:` inside raw front-matter text.
///
/// Prefers the value on the key's own line so an identical string elsewhere
/// in the block is left alone. Values written in block style (`image: >-`)
/// are searched for only in the text after the key's line.
pub fn locate_metadata_value(content: &str, key: &str, value: &str) -> Option<RawReference> {
    if value.is_empty() {
        return None;
    }

    let mut offset = 0;
    let mut after_key = None;
    for line in content.split_inclusive('\n') {
        if let Some(rest) = line.strip_prefix(key) {
            if rest.trim_start().starts_with(':') {
                if let Some(pos) = rest.find(value) {
                    let start = offset + key.len() + pos;
                    return Some(RawReference {
                        kind: ReferenceKind::MetadataField,
                        span: offset..offset + line.len(),
                        path_span: start..start + value.len(),
                    });
                }
                after_key.get_or_insert(offset + line.len());
            }
        }
        offset += line.len();
    }

    let from = after_key?;
    let start = from + content[from..].find(value)?;
    Some(RawReference {
        kind: ReferenceKind::MetadataField,
        span: start..start + value.len(),
        path_span: start..start + value.len(),
    })
}

/// Ordered collection of body syntaxes.
///
/// Order matters: when two syntaxes see the same path, the earlier (more
/// specific) syntax owns it and the later one skips it.
pub struct PatternSet {
    syntaxes: Vec<Box<dyn ReferenceSyntax>>,
}

/// Which syntaxes a [`PatternSet`] contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOptions {
    pub attribute_shortcodes: Vec<String>,
    pub list_shortcodes: Vec<String>,
    pub bare_paths: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            attribute_shortcodes: vec!["imgrow".to_string(), "music".to_string()],
            list_shortcodes: vec!["imgrow".to_string()],
            bare_paths: true,
        }
    }
}

impl PatternSet {
    pub fn new(options: &PatternOptions) -> Result<Self, regex::Error> {
        let mut syntaxes: Vec<Box<dyn ReferenceSyntax>> = vec![
            Box::new(StandardLinkSyntax::new()?),
            Box::new(InlineMarkupSyntax::new()?),
        ];
        if !options.attribute_shortcodes.is_empty() {
            syntaxes.push(Box::new(ShortcodeAttributeSyntax::new(
                &options.attribute_shortcodes,
            )?));
        }
        if !options.list_shortcodes.is_empty() {
            syntaxes.push(Box::new(ShortcodeListSyntax::new(&options.list_shortcodes)?));
        }
        if options.bare_paths {
            syntaxes.push(Box::new(BarePathSyntax::new()?));
        }
        Ok(Self { syntaxes })
    }

    pub fn builtin() -> Result<Self, regex::Error> {
        Self::new(&PatternOptions::default())
    }

    pub fn kinds(&self) -> Vec<ReferenceKind> {
        self.syntaxes.iter().map(|s| s.kind()).collect()
    }

    /// All references in `text`, grouped by syntax in set order and left to
    /// right within a syntax. A path range already claimed by an earlier
    /// syntax is not reported again.
    pub fn find_all(&self, text: &str) -> Vec<RawReference> {
        let mut claimed: Vec<Range<usize>> = Vec::new();
        let mut found = Vec::new();

        for syntax in &self.syntaxes {
            let mut matches = syntax.find_all(text);
            matches.sort_by_key(|r| r.span.start);
            for reference in matches {
                if claimed.iter().any(|range| reference.overlaps(range)) {
                    continue;
                }
                claimed.push(reference.path_span.clone());
                found.push(reference);
            }
        }

        found
    }
}
