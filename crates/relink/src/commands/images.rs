//! Image conversion and pruning operations

use super::*;
use crate::convert::{convert_all, ConvertReport, ImageConverter};
use crate::files::PruneReport;
use crate::policy::{ConfirmationChannel, PolicyState};
use serde::Serialize;
use tracing::warn;

/// Outcome of the `convert` command.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    pub images_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    #[serde(flatten)]
    pub report: ConvertReport,
}

/// Outcome of the `prune` command.
#[derive(Debug, Clone, Serialize)]
pub struct PruneSummary {
    pub candidates: Vec<PathBuf>,
    /// Nothing was deleted because the user declined.
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    #[serde(flatten)]
    pub report: PruneReport,
}

impl PruneSummary {
    fn cancelled(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            cancelled: true,
            backup: None,
            report: PruneReport::default(),
        }
    }
}

impl CommandExecutor {
    /// Convert every source image under the folder to its sibling.
    ///
    /// Existing siblings are replaced silently with `overwrite`, otherwise
    /// `channel` is asked about each one.
    pub fn convert_images(
        &self,
        converter: &dyn ImageConverter,
        overwrite: bool,
        backup: bool,
        channel: &mut dyn ConfirmationChannel,
    ) -> Result<ConvertSummary> {
        let images = self.images()?;

        let backup = if backup && !images.is_empty() {
            Some(self.backup_folder()?)
        } else {
            None
        };

        let policy = if overwrite {
            PolicyState::Auto
        } else {
            PolicyState::Confirming
        };
        let report = convert_all(&images, converter, policy, channel)?;

        Ok(ConvertSummary {
            images_found: images.len(),
            backup,
            report,
        })
    }

    /// Originals whose converted sibling exists.
    pub fn find_prunable(&self) -> Result<Vec<PathBuf>> {
        files::find_prunable(&self.folder)
            .with_context(|| format!("Failed to list images in {}", self.folder.display()))
    }

    /// Delete `candidates`.
    ///
    /// Unless `assume_yes`, the channel must confirm the deletion. With
    /// `backup`, the files are copied away first; if that copy fails the
    /// channel is asked whether to delete anyway.
    pub fn prune(
        &self,
        candidates: Vec<PathBuf>,
        assume_yes: bool,
        backup: bool,
        channel: &mut dyn ConfirmationChannel,
    ) -> Result<PruneSummary> {
        if candidates.is_empty() {
            return Ok(PruneSummary {
                candidates,
                cancelled: false,
                backup: None,
                report: PruneReport::default(),
            });
        }

        if !assume_yes
            && !channel.confirm(&format!(
                "Delete {} original image(s) that have a converted copy?",
                candidates.len()
            ))?
        {
            return Ok(PruneSummary::cancelled(candidates));
        }

        let mut backup_path = None;
        if backup {
            let root = self.config.backup_dir();
            match files::backup_files(&self.folder, &candidates, &root, Local::now()) {
                Ok(path) => backup_path = Some(path),
                Err(e) => {
                    warn!("{}", e);
                    if !channel.confirm(&format!("{}. Delete without a backup?", e))? {
                        return Ok(PruneSummary::cancelled(candidates));
                    }
                }
            }
        }

        let report = files::delete_files(&candidates);
        Ok(PruneSummary {
            candidates,
            cancelled: false,
            backup: backup_path,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackupConfig;
    use crate::errors::RelinkError;
    use crate::policy::{Prompt, ScriptedChannel};
    use std::fs;
    use tempfile::TempDir;

    struct CopyConverter;

    impl ImageConverter for CopyConverter {
        fn convert(&self, source: &Path, target: &Path) -> Result<(), RelinkError> {
            fs::copy(source, target)
                .map(|_| ())
                .map_err(|source| RelinkError::Write {
                    path: target.to_path_buf(),
                    source,
                })
        }
    }

    fn executor_in(temp: &TempDir, backup_dir: PathBuf) -> CommandExecutor {
        let folder = temp.path().join("blog");
        fs::create_dir_all(folder.join("img")).unwrap();
        let config = RelinkConfig {
            backup: Some(BackupConfig {
                dir: Some(backup_dir),
            }),
            ..RelinkConfig::default()
        };
        CommandExecutor::new(folder, config)
    }

    fn setup() -> (TempDir, CommandExecutor) {
        let temp = TempDir::new().unwrap();
        let executor = executor_in(&temp, temp.path().join("backups"));
        (temp, executor)
    }

    #[test]
    fn test_convert_images_backs_up_then_converts() {
        let (temp, executor) = setup();
        fs::write(executor.folder().join("img/a.png"), b"a").unwrap();

        let mut channel = ScriptedChannel::default();
        let summary = executor
            .convert_images(&CopyConverter, false, true, &mut channel)
            .unwrap();

        assert_eq!(summary.images_found, 1);
        assert_eq!(summary.report.converted.len(), 1);
        assert!(executor.folder().join("img/a.webp").exists());
        assert!(summary.backup.unwrap().starts_with(temp.path().join("backups")));
    }

    #[test]
    fn test_convert_images_overwrite_never_asks() {
        let (_temp, executor) = setup();
        fs::write(executor.folder().join("img/a.png"), b"new").unwrap();
        fs::write(executor.folder().join("img/a.webp"), b"old").unwrap();

        let mut channel = ScriptedChannel::default();
        executor
            .convert_images(&CopyConverter, true, false, &mut channel)
            .unwrap();

        assert!(channel.prompts().is_empty());
        assert_eq!(
            fs::read(executor.folder().join("img/a.webp")).unwrap(),
            b"new"
        );
    }

    #[test]
    fn test_prune_requires_confirmation() {
        let (_temp, executor) = setup();
        fs::write(executor.folder().join("img/a.png"), b"a").unwrap();
        fs::write(executor.folder().join("img/a.webp"), b"a").unwrap();

        let candidates = executor.find_prunable().unwrap();
        let mut channel = ScriptedChannel::new(["n"]);
        let summary = executor
            .prune(candidates, false, true, &mut channel)
            .unwrap();

        assert!(summary.cancelled);
        assert!(executor.folder().join("img/a.png").exists());
    }

    #[test]
    fn test_prune_backs_up_then_deletes() {
        let (temp, executor) = setup();
        fs::write(executor.folder().join("img/a.png"), b"a").unwrap();
        fs::write(executor.folder().join("img/a.webp"), b"a").unwrap();

        let candidates = executor.find_prunable().unwrap();
        let mut channel = ScriptedChannel::default();
        let summary = executor.prune(candidates, true, true, &mut channel).unwrap();

        assert!(!summary.cancelled);
        assert_eq!(summary.report.deleted.len(), 1);
        assert!(!executor.folder().join("img/a.png").exists());
        let backup = summary.backup.unwrap();
        assert!(backup.starts_with(temp.path().join("backups")));
        assert!(backup.join("img/a.png").exists());
    }

    #[test]
    fn test_prune_backup_failure_asks_before_deleting() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let executor = executor_in(&temp, blocker.join("backups"));
        fs::write(executor.folder().join("img/a.png"), b"a").unwrap();
        fs::write(executor.folder().join("img/a.webp"), b"a").unwrap();

        let candidates = executor.find_prunable().unwrap();
        let mut channel = ScriptedChannel::new(["n"]);
        let summary = executor.prune(candidates, true, true, &mut channel).unwrap();

        assert!(summary.cancelled);
        assert!(executor.folder().join("img/a.png").exists());
        assert!(matches!(channel.prompts()[0], Prompt::Question(_)));
    }
}
