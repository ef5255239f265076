//! Error types and actionable error formatting.
//!
//! Library operations return [`RelinkError`] for failures that stop a single
//! unit of work (one document, one image, one backup). Problems that must not
//! stop the work are reported as [`ScanWarning`] values instead.
//!
//! [`ActionableError`] wraps a message with possible causes and remediation
//! steps for display at the CLI boundary.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single unit of work.
#[derive(Debug, Error)]
pub enum RelinkError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Confirmation channel failed: {0}")]
    Prompt(#[from] io::Error),

    #[error("Failed to convert {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    #[error("Failed to back up {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Recoverable problem surfaced to the caller while processing a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanWarning {
    /// The front-matter block exists but is not a valid key-value mapping.
    /// Metadata-field scanning is skipped; the body is still processed.
    FrontMatterParse { message: String },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::FrontMatterParse { message } => {
                write!(f, "front matter could not be parsed: {}", message)
            }
        }
    }
}

/// A command failure as shown to the user: what went wrong, why it might
/// have, and what to try next.
///
/// ```
/// use relink::errors::ActionableError;
///
/// let error = ActionableError::new("Folder ./blog not found")
///     .with_cause("The path may be misspelled")
///     .with_remedy("Check the folder exists: ls ./blog");
///
/// let text = error.to_string();
/// assert!(text.starts_with("Error: Folder ./blog not found"));
/// assert!(text.contains("  - Check the folder exists: ls ./blog"));
/// ```
#[derive(Debug, Clone)]
pub struct ActionableError {
    message: String,
    causes: Vec<String>,
    remedies: Vec<String>,
}

impl ActionableError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
            remedies: Vec::new(),
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remedies.push(remedy.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    pub fn remedies(&self) -> &[String] {
        &self.remedies
    }
}

impl fmt::Display for ActionableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.message)?;
        for (heading, items) in [("Possible causes:", &self.causes), ("Try:", &self.remedies)] {
            if items.is_empty() {
                continue;
            }
            writeln!(f, "\n{}", heading)?;
            for item in items {
                writeln!(f, "  - {}", item)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ActionableError {}

/// Target folder does not exist or is not a directory.
pub fn folder_not_found(folder: &str) -> ActionableError {
    ActionableError::new(format!("Folder {} not found", folder))
        .with_cause("The path may be misspelled or relative to a different directory")
        .with_cause("The path may point to a file instead of a folder")
        .with_remedy(format!("Check the folder exists: ls {}", folder))
        .with_remedy("Pass an absolute path to the content folder")
}

/// Backup could not be created, so the destructive step was not started.
pub fn backup_failed(folder: &str, reason: &str) -> ActionableError {
    ActionableError::new(format!("Backup of {} failed", folder))
        .with_cause(format!("Backup error: {}", reason))
        .with_cause("The backup directory may not be writable or the disk may be full")
        .with_remedy("Choose another backup location: [backup] dir = \"...\" in .relink.toml")
        .with_remedy("Back up manually and rerun with --no-backup")
}

/// Configuration exists but cannot be used.
pub fn invalid_config(reason: &str) -> ActionableError {
    ActionableError::new("Configuration is invalid")
        .with_cause(reason.to_string())
        .with_remedy("Fix the offending key or remove the file to use defaults")
        .with_remedy("Point --config or RELINK_CONFIG at another file")
}
