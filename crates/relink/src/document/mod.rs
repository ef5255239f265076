//! Document reference detection and rewriting
//!
//! This module holds the text-level machinery: splitting front matter from
//! the body, finding image references in several syntaxes, deciding whether
//! a converted sibling exists, and applying span edits.

mod adapter;
mod edit;
mod frontmatter;
mod patterns;
mod resolver;
mod scanner;

pub use adapter::{AdapterRegistry, DocFormatAdapter, MarkdownAdapter};
pub use edit::{apply_edits, occurrences, TextEdit};
pub use frontmatter::{split_front_matter, FrontMatter, SplitDocument, MARKER};
pub use patterns::{
    locate_metadata_value, BarePathSyntax, InlineMarkupSyntax, PatternOptions, PatternSet,
    RawReference, ReferenceKind, ReferenceSyntax, ShortcodeAttributeSyntax, ShortcodeListSyntax,
    StandardLinkSyntax,
};
pub use resolver::{
    converted_name, converted_sibling, has_source_extension, PathResolver, SOURCE_EXTENSIONS,
    TARGET_EXTENSION,
};
pub use scanner::{
    Candidate, Context, ReferenceScanner, Region, DEFAULT_CONTEXT_CHARS, DEFAULT_METADATA_KEY,
};
