//! Document rewrite engine
//!
//! Runs one document through split -> scan -> decide -> apply, for the
//! front matter and the body independently, then reassembles the text with
//! the original marker lines. A document is written back only if at least
//! one candidate was applied; otherwise it is left byte-identical.

use crate::document::{
    apply_edits, occurrences, split_front_matter, Candidate, PathResolver, ReferenceScanner,
    TextEdit,
};
use crate::errors::{RelinkError, ScanWarning};
use crate::policy::{ConfirmationChannel, ConfirmationPolicy, PolicyState, RiskyApproval};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How an accepted candidate is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteMode {
    /// Only the exact occurrence that was reviewed changes.
    #[default]
    Span,
    /// Every occurrence of the reviewed text in the same region changes,
    /// including copies that were never reviewed.
    AllOccurrences,
}

impl RewriteMode {
    pub fn parse(value: &str) -> Result<Self, RelinkError> {
        match value {
            "span" => Ok(RewriteMode::Span),
            "all-occurrences" => Ok(RewriteMode::AllOccurrences),
            invalid => Err(RelinkError::InvalidConfig(format!(
                "Invalid rewrite mode: '{}'. Valid options: 'span', 'all-occurrences'",
                invalid
            ))),
        }
    }
}

/// A rewrite that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedReference {
    pub kind: crate::document::ReferenceKind,
    pub original: String,
    pub converted: String,
}

impl From<&Candidate> for AppliedReference {
    fn from(candidate: &Candidate) -> Self {
        Self {
            kind: candidate.kind,
            original: candidate.original.clone(),
            converted: candidate.converted.clone(),
        }
    }
}

/// Result of rewriting one document's text in memory.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub text: String,
    pub changed: bool,
    pub applied: Vec<AppliedReference>,
    pub skipped: usize,
    pub warnings: Vec<ScanWarning>,
    /// Policy state after the document, for carrying into the next one.
    pub policy: PolicyState,
}

/// Read-only view of what a document offers.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub candidates: Vec<Candidate>,
    pub warnings: Vec<ScanWarning>,
}

/// Report for one processed document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub changed: bool,
    pub written: bool,
    pub applied: Vec<AppliedReference>,
    pub skipped: usize,
    pub warnings: Vec<ScanWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Options for a sequential batch of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Policy every document starts in.
    pub initial: PolicyState,
    /// Carry a mid-batch switch to `Auto` into later documents.
    pub sticky_auto: bool,
    /// Pre-answer the risky-kind gate for every document.
    pub risky: RiskyApproval,
    /// Compute diffs instead of writing.
    pub dry_run: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            initial: PolicyState::Confirming,
            sticky_auto: false,
            risky: RiskyApproval::Ask,
            dry_run: false,
        }
    }
}

/// A per-file failure that did not stop the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn changed_count(&self) -> usize {
        self.documents.iter().filter(|d| d.changed).count()
    }

    pub fn applied_count(&self) -> usize {
        self.documents.iter().map(|d| d.applied.len()).sum()
    }
}

/// Rewrites image references in documents.
pub struct RewriteEngine {
    scanner: ReferenceScanner,
    mode: RewriteMode,
    site_root: Option<PathBuf>,
}

impl RewriteEngine {
    pub fn new(scanner: ReferenceScanner) -> Self {
        Self {
            scanner,
            mode: RewriteMode::Span,
            site_root: None,
        }
    }

    pub fn with_mode(mut self, mode: RewriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_site_root(mut self, root: Option<PathBuf>) -> Self {
        self.site_root = root;
        self
    }

    pub fn mode(&self) -> RewriteMode {
        self.mode
    }

    fn resolver_for(&self, document: &Path) -> PathResolver {
        let base = document.parent().unwrap_or(Path::new(""));
        PathResolver::new(base).with_site_root(self.site_root.clone())
    }

    /// Every candidate of a document, without asking or changing anything.
    pub fn scan(&self, text: &str, document: &Path) -> ScanResult {
        let split = split_front_matter(text);
        let resolver = self.resolver_for(document);

        let mut candidates = Vec::new();
        if let Some(front_matter) = &split.front_matter {
            candidates.extend(self.scanner.scan_front_matter(front_matter, &resolver));
        }
        candidates.extend(self.scanner.scan_body(split.body, &resolver));

        ScanResult {
            candidates,
            warnings: split.warning.into_iter().collect(),
        }
    }

    /// Rewrite `text` of the document at `document` in memory.
    ///
    /// The front matter is handled first, then the body; `policy` is threaded
    /// through both so a switch to `Auto` in one carries into the other.
    pub fn rewrite(
        &self,
        text: &str,
        document: &Path,
        mut policy: ConfirmationPolicy,
        channel: &mut dyn ConfirmationChannel,
    ) -> Result<RewriteOutcome, RelinkError> {
        let split = split_front_matter(text);
        let resolver = self.resolver_for(document);
        let warnings: Vec<ScanWarning> = split.warning.into_iter().collect();
        for warning in &warnings {
            warn!(document = %document.display(), "{}", warning);
        }

        let mut applied = Vec::new();
        let mut skipped = 0;
        let mut out = String::with_capacity(text.len());

        if let Some(front_matter) = &split.front_matter {
            let candidates = self.scanner.scan_front_matter(front_matter, &resolver);
            let region = self.apply_region(
                front_matter.content,
                &candidates,
                document,
                &mut policy,
                channel,
            )?;
            applied.extend(region.applied);
            skipped += region.skipped;

            out.push_str(front_matter.opening);
            out.push_str(&region.text);
            out.push_str(front_matter.closing);
        }

        let candidates = self.scanner.scan_body(split.body, &resolver);
        let region = self.apply_region(split.body, &candidates, document, &mut policy, channel)?;
        applied.extend(region.applied);
        skipped += region.skipped;
        out.push_str(&region.text);

        let changed = out != text;

        Ok(RewriteOutcome {
            text: out,
            changed,
            applied,
            skipped,
            warnings,
            policy: policy.state(),
        })
    }

    fn apply_region(
        &self,
        text: &str,
        candidates: &[Candidate],
        document: &Path,
        policy: &mut ConfirmationPolicy,
        channel: &mut dyn ConfirmationChannel,
    ) -> Result<RegionOutcome, RelinkError> {
        let mut edits: Vec<TextEdit> = Vec::new();
        let mut applied = Vec::new();
        let mut skipped = 0;

        for candidate in candidates {
            if policy.decide(document, candidate, channel)? {
                debug!(label = %candidate.label(), "applying");
                edits.extend(self.edits_for(text, candidate));
                applied.push(AppliedReference::from(candidate));
            } else {
                debug!(label = %candidate.label(), "skipped");
                skipped += 1;
            }
        }

        Ok(RegionOutcome {
            text: apply_edits(text, &edits),
            applied,
            skipped,
        })
    }

    fn edits_for(&self, text: &str, candidate: &Candidate) -> Vec<TextEdit> {
        match self.mode {
            RewriteMode::Span => vec![candidate.edit()],
            RewriteMode::AllOccurrences if candidate.kind.is_risky() => {
                occurrences(text, &candidate.original, &candidate.converted)
            }
            RewriteMode::AllOccurrences => {
                occurrences(text, &candidate.matched, &candidate.replacement)
            }
        }
    }

    /// Read, rewrite, and (unless `dry_run`) write back one document.
    pub fn process(
        &self,
        path: &Path,
        policy: ConfirmationPolicy,
        channel: &mut dyn ConfirmationChannel,
        dry_run: bool,
    ) -> Result<(DocumentReport, PolicyState), RelinkError> {
        let original = fs::read_to_string(path).map_err(|source| RelinkError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let outcome = self.rewrite(&original, path, policy, channel)?;

        let mut written = false;
        let mut diff = None;
        if outcome.changed {
            if dry_run {
                diff = Some(unified_diff(path, &original, &outcome.text));
            } else {
                fs::write(path, &outcome.text).map_err(|source| RelinkError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
                written = true;
                info!(document = %path.display(), applied = outcome.applied.len(), "updated");
            }
        }

        let report = DocumentReport {
            path: path.to_path_buf(),
            changed: outcome.changed,
            written,
            applied: outcome.applied,
            skipped: outcome.skipped,
            warnings: outcome.warnings,
            diff,
        };
        Ok((report, outcome.policy))
    }

    /// Process documents one after another.
    ///
    /// A document that cannot be read or written is recorded as a failure
    /// and the batch moves on. A broken confirmation channel stops the batch,
    /// since no further decision can be obtained.
    pub fn run_batch(
        &self,
        documents: &[PathBuf],
        options: BatchOptions,
        channel: &mut dyn ConfirmationChannel,
    ) -> Result<BatchReport, RelinkError> {
        let mut report = BatchReport::default();
        let mut state = options.initial;

        for path in documents {
            let policy = ConfirmationPolicy::new(state).with_risky_approval(options.risky);
            match self.process(path, policy, channel, options.dry_run) {
                Ok((document, after)) => {
                    if options.sticky_auto {
                        state = after;
                    }
                    report.documents.push(document);
                }
                Err(RelinkError::Prompt(e)) => return Err(RelinkError::Prompt(e)),
                Err(e) => {
                    warn!(document = %path.display(), "{}", e);
                    report.failures.push(BatchFailure {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

struct RegionOutcome {
    text: String,
    applied: Vec<AppliedReference>,
    skipped: usize,
}

/// Unified line diff between two versions of a document.
pub fn unified_diff(path: &Path, before: &str, after: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let mut out = format!("--- a/{}\n+++ b/{}\n", path.display(), path.display());
    let diff = TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => continue,
        };
        out.push_str(sign);
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }
    out
}
