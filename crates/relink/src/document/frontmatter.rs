//! Front-matter splitting
//!
//! Separates a leading YAML block delimited by `---` marker lines from the
//! document body. The pieces are borrowed slices of the original text, so
//! `opening + content + closing + body` always reconstructs the input exactly.

use crate::errors::ScanWarning;
use serde_yaml::{Mapping, Value};

/// Marker line opening and closing a front-matter block.
pub const MARKER: &str = "---";

/// A front-matter block located at the very start of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter<'a> {
    /// Opening marker line, including its line terminator (and a BOM, if any).
    pub opening: &'a str,
    /// Raw text between the markers, including the final line terminator.
    pub content: &'a str,
    /// Closing marker line, including its line terminator when present.
    pub closing: &'a str,
    /// Parsed key-value fields; `None` when the block is not a valid mapping.
    pub fields: Option<Mapping>,
}

impl<'a> FrontMatter<'a> {
    /// String value of a top-level key, if present and a string.
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.fields.as_ref()?.get(key)?.as_str()
    }

    /// Byte length of the whole block, markers included.
    pub fn len(&self) -> usize {
        self.opening.len() + self.content.len() + self.closing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A document split into its optional front matter and its body.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDocument<'a> {
    pub front_matter: Option<FrontMatter<'a>>,
    pub body: &'a str,
    pub warning: Option<ScanWarning>,
}

/// Split `text` into front matter and body.
///
/// A block is recognized only when the first line is exactly `---` and a
/// later line is exactly `---`. A block that fails to parse as a mapping is
/// still split off (so the body is scanned on its own) but carries no fields
/// and produces a [`ScanWarning`].
///
/// # Example
///
/// ```
/// use relink::document::split_front_matter;
///
/// let doc = split_front_matter("---\nimage: cover.png\n---\n# Post\n");
/// let fm = doc.front_matter.unwrap();
/// assert_eq!(fm.string_field("image"), Some("cover.png"));
/// assert_eq!(doc.body, "# Post\n");
/// ```
pub fn split_front_matter(text: &str) -> SplitDocument<'_> {
    let Some((opening_end, content_end, closing_end)) = locate_block(text) else {
        return SplitDocument {
            front_matter: None,
            body: text,
            warning: None,
        };
    };

    let content = &text[opening_end..content_end];
    let (fields, warning) = match parse_fields(content) {
        Ok(fields) => (Some(fields), None),
        Err(message) => (None, Some(ScanWarning::FrontMatterParse { message })),
    };

    SplitDocument {
        front_matter: Some(FrontMatter {
            opening: &text[..opening_end],
            content,
            closing: &text[content_end..closing_end],
            fields,
        }),
        body: &text[closing_end..],
        warning,
    }
}

/// Returns (end of opening line, end of content, end of closing line).
fn locate_block(text: &str) -> Option<(usize, usize, usize)> {
    let mut lines = text.split_inclusive('\n');

    let first = lines.next()?;
    if !first.ends_with('\n') || !is_marker(first.trim_start_matches('\u{feff}')) {
        return None;
    }

    let opening_end = first.len();
    let mut offset = opening_end;
    for line in lines {
        if is_marker(line) {
            return Some((opening_end, offset, offset + line.len()));
        }
        offset += line.len();
    }

    None
}

fn is_marker(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == MARKER
}

fn parse_fields(content: &str) -> Result<Mapping, String> {
    match serde_yaml::from_str::<Value>(content) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err("front matter is not a key-value mapping".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
