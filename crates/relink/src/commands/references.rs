//! Reference scanning and rewriting operations

use super::*;
use crate::document::Candidate;
use crate::engine::{BatchFailure, BatchOptions, BatchReport};
use crate::errors::ScanWarning;
use crate::policy::{ConfirmationChannel, PolicyState, RiskyApproval};
use serde::Serialize;
use std::fs;
use tracing::warn;

/// Options of the `refs` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefsOptions {
    /// Start every document in `Auto` instead of `Confirming`.
    pub auto: bool,
    /// Carry a mid-batch switch to `Auto` over to later documents.
    pub sticky_auto: bool,
    /// Approve risky kinds up front instead of asking once per document.
    pub accept_risky: bool,
    /// Show diffs instead of writing.
    pub dry_run: bool,
    /// Rewrite every copy of an accepted reference's text.
    pub all_occurrences: bool,
    /// Back up the folder before writing.
    pub backup: bool,
}

impl RefsOptions {
    fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            initial: if self.auto {
                PolicyState::Auto
            } else {
                PolicyState::Confirming
            },
            sticky_auto: self.sticky_auto,
            risky: if self.accept_risky {
                RiskyApproval::Accepted
            } else {
                RiskyApproval::Ask
            },
            dry_run: self.dry_run,
        }
    }
}

/// Outcome of the `refs` command.
#[derive(Debug, Clone, Serialize)]
pub struct RefsSummary {
    pub documents_scanned: usize,
    pub documents_changed: usize,
    pub references_applied: usize,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    #[serde(flatten)]
    pub report: BatchReport,
}

impl RefsSummary {
    pub fn has_failures(&self) -> bool {
        !self.report.failures.is_empty()
    }
}

/// Candidates found in one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentScan {
    pub path: PathBuf,
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ScanWarning>,
}

/// Outcome of the read-only `scan` command.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub documents_scanned: usize,
    pub candidate_count: usize,
    /// Documents with at least one candidate or warning.
    pub documents: Vec<DocumentScan>,
    pub failures: Vec<BatchFailure>,
}

impl CommandExecutor {
    /// List every candidate in every document without asking or writing.
    pub fn scan(&self) -> Result<ScanReport> {
        let engine = self.engine(false)?;
        let paths = self.documents()?;

        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for path in &paths {
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(document = %path.display(), "{}", e);
                    failures.push(BatchFailure {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let result = engine.scan(&text, path);
            if !result.candidates.is_empty() || !result.warnings.is_empty() {
                documents.push(DocumentScan {
                    path: path.clone(),
                    candidates: result.candidates,
                    warnings: result.warnings,
                });
            }
        }

        Ok(ScanReport {
            documents_scanned: paths.len(),
            candidate_count: documents.iter().map(|d| d.candidates.len()).sum(),
            documents,
            failures,
        })
    }

    /// Rewrite image references in every document under the folder.
    pub fn update_references(
        &self,
        options: &RefsOptions,
        channel: &mut dyn ConfirmationChannel,
    ) -> Result<RefsSummary> {
        let engine = self.engine(options.all_occurrences)?;
        let documents = self.documents()?;

        let backup = if options.backup && !options.dry_run && !documents.is_empty() {
            Some(self.backup_folder()?)
        } else {
            None
        };

        let report = engine.run_batch(&documents, options.batch_options(), channel)?;

        Ok(RefsSummary {
            documents_scanned: documents.len(),
            documents_changed: report.changed_count(),
            references_applied: report.applied_count(),
            dry_run: options.dry_run,
            backup,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackupConfig;
    use crate::policy::ScriptedChannel;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CommandExecutor) {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("blog");
        fs::create_dir_all(folder.join("posts")).unwrap();
        let config = RelinkConfig {
            backup: Some(BackupConfig {
                dir: Some(temp.path().join("backups")),
            }),
            ..RelinkConfig::default()
        };
        let executor = CommandExecutor::new(&folder, config);
        (temp, executor)
    }

    fn write(executor: &CommandExecutor, rel: &str, content: &str) {
        fs::write(executor.folder().join(rel), content).unwrap();
    }

    fn read(executor: &CommandExecutor, rel: &str) -> String {
        fs::read_to_string(executor.folder().join(rel)).unwrap()
    }

    #[test]
    fn test_scan_reports_candidates_without_writing() {
        let (_temp, executor) = setup();
        write(&executor, "posts/a.webp", "");
        write(&executor, "posts/one.md", "![a](a.jpg)\n");
        write(&executor, "posts/two.md", "nothing\n");

        let report = executor.scan().unwrap();

        assert_eq!(report.documents_scanned, 2);
        assert_eq!(report.candidate_count, 1);
        assert_eq!(report.documents.len(), 1);
        assert_eq!(read(&executor, "posts/one.md"), "![a](a.jpg)\n");
    }

    #[test]
    fn test_scan_records_unreadable_document_and_continues() {
        let (_temp, executor) = setup();
        write(&executor, "posts/a.webp", "");
        write(&executor, "posts/one.md", "![a](a.jpg)\n");
        fs::write(executor.folder().join("posts/broken.md"), [0xff, 0xfe, 0x00]).unwrap();

        let report = executor.scan().unwrap();

        assert_eq!(report.documents_scanned, 2);
        assert_eq!(report.candidate_count, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("posts/broken.md"));
    }

    #[test]
    fn test_update_references_auto_with_backup() {
        let (temp, executor) = setup();
        write(&executor, "posts/a.webp", "");
        write(&executor, "posts/one.md", "![a](a.jpg)\n");

        let options = RefsOptions {
            auto: true,
            backup: true,
            ..RefsOptions::default()
        };
        let mut channel = ScriptedChannel::default();
        let summary = executor.update_references(&options, &mut channel).unwrap();

        assert_eq!(summary.documents_changed, 1);
        assert_eq!(summary.references_applied, 1);
        assert_eq!(read(&executor, "posts/one.md"), "![a](a.webp)\n");

        let backup = summary.backup.unwrap();
        assert!(backup.starts_with(temp.path().join("backups")));
        assert_eq!(
            fs::read_to_string(backup.join("posts/one.md")).unwrap(),
            "![a](a.jpg)\n"
        );
    }

    #[test]
    fn test_update_references_dry_run_skips_backup_and_write() {
        let (temp, executor) = setup();
        write(&executor, "posts/a.webp", "");
        write(&executor, "posts/one.md", "![a](a.jpg)\n");

        let options = RefsOptions {
            auto: true,
            dry_run: true,
            backup: true,
            ..RefsOptions::default()
        };
        let mut channel = ScriptedChannel::default();
        let summary = executor.update_references(&options, &mut channel).unwrap();

        assert!(summary.backup.is_none());
        assert!(!temp.path().join("backups").exists());
        assert_eq!(summary.documents_changed, 1);
        assert!(summary.report.documents[0].diff.is_some());
        assert_eq!(read(&executor, "posts/one.md"), "![a](a.jpg)\n");
    }

    #[test]
    fn test_accept_risky_skips_gate() {
        let (_temp, executor) = setup();
        write(&executor, "posts/555.webp", "");
        write(&executor, "posts/one.md", "photo 555.jpg here\n");

        let options = RefsOptions {
            auto: true,
            accept_risky: true,
            ..RefsOptions::default()
        };
        let mut channel = ScriptedChannel::default();
        executor.update_references(&options, &mut channel).unwrap();

        assert!(channel.prompts().is_empty());
        assert_eq!(read(&executor, "posts/one.md"), "photo 555.webp here\n");
    }

    #[test]
    fn test_all_occurrences_option() {
        let (_temp, executor) = setup();
        write(&executor, "posts/555.webp", "");
        write(&executor, "posts/one.md", "a 555.jpg b 555.jpg\n");

        let options = RefsOptions {
            all_occurrences: true,
            ..RefsOptions::default()
        };
        let mut channel = ScriptedChannel::new(["y", "n"]);
        executor.update_references(&options, &mut channel).unwrap();

        assert_eq!(read(&executor, "posts/one.md"), "a 555.webp b 555.webp\n");
    }
}
