//! Command execution logic for all CLI operations.
//!
//! The `CommandExecutor` owns the target folder and its configuration and
//! runs the operation behind each subcommand, returning a serializable
//! summary for the CLI to render.
//!
//! This module is organized into submodules by functional area:
//! - `references`: scanning and rewriting image references in documents
//! - `images`: converting originals and pruning them afterwards

mod images;
mod references;

pub use images::{ConvertSummary, PruneSummary};
pub use references::{DocumentScan, RefsOptions, RefsSummary, ScanReport};

use crate::config::RelinkConfig;
use crate::document::{AdapterRegistry, PatternSet, ReferenceScanner};
use crate::engine::{RewriteEngine, RewriteMode};
use crate::files;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Executes CLI commands against one content folder.
pub struct CommandExecutor {
    folder: PathBuf,
    config: RelinkConfig,
    registry: AdapterRegistry,
}

impl CommandExecutor {
    pub fn new(folder: impl Into<PathBuf>, config: RelinkConfig) -> Self {
        Self {
            folder: folder.into(),
            config,
            registry: AdapterRegistry::with_builtins(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn config(&self) -> &RelinkConfig {
        &self.config
    }

    /// Rewrite engine configured for this folder.
    ///
    /// `all_occurrences` forces the legacy write-back mode regardless of the
    /// configured one.
    pub fn engine(&self, all_occurrences: bool) -> Result<RewriteEngine> {
        let scan = self.config.scan();
        let patterns =
            PatternSet::new(&scan.pattern_options()).context("Invalid reference pattern")?;
        let scanner = ReferenceScanner::new(patterns, scan.metadata_key(), scan.context_chars());

        let mode = if all_occurrences {
            RewriteMode::AllOccurrences
        } else {
            self.config.rewrite_mode()?
        };

        Ok(RewriteEngine::new(scanner)
            .with_mode(mode)
            .with_site_root(self.config.site_root(&self.folder)))
    }

    /// Documents under the folder, sorted.
    pub fn documents(&self) -> Result<Vec<PathBuf>> {
        files::find_documents(&self.folder, &self.registry)
            .with_context(|| format!("Failed to list documents in {}", self.folder.display()))
    }

    /// Convertible images under the folder, sorted.
    pub fn images(&self) -> Result<Vec<PathBuf>> {
        files::find_images(&self.folder)
            .with_context(|| format!("Failed to list images in {}", self.folder.display()))
    }

    /// Copy the whole folder to a fresh timestamped backup directory.
    pub fn backup_folder(&self) -> Result<PathBuf> {
        let root = self.config.backup_dir();
        let target = files::backup_folder(&self.folder, &root, Local::now())
            .with_context(|| format!("Backup of {} failed", self.folder.display()))?;
        info!(backup = %target.display(), "backup created");
        Ok(target)
    }
}
