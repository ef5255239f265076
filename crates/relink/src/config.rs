//! Configuration file loading and parsing.
//!
//! relink reads an optional TOML file. The path comes from `--config`, then
//! the `RELINK_CONFIG` environment variable, then `<folder>/.relink.toml`.
//! If none exists, every setting falls back to its default.

use crate::convert::{WebpConverter, DEFAULT_QUALITY};
use crate::document::{PatternOptions, DEFAULT_CONTEXT_CHARS, DEFAULT_METADATA_KEY};
use crate::engine::RewriteMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up inside the target folder.
pub const CONFIG_FILE_NAME: &str = ".relink.toml";

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "RELINK_CONFIG";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelinkConfig {
    /// Reference detection settings (optional).
    pub scan: Option<ScanConfig>,
    /// Path resolution settings (optional).
    pub resolver: Option<ResolverConfig>,
    /// Write-back settings (optional).
    pub rewrite: Option<RewriteConfig>,
    /// Image encoding settings (optional).
    pub convert: Option<ConvertConfig>,
    /// Backup settings (optional).
    pub backup: Option<BackupConfig>,
}

/// Reference detection configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Front-matter key holding the cover image (default: "image").
    pub metadata_key: Option<String>,
    /// Shortcodes whose `src`/`image` attributes are references (default: ["imgrow", "music"]).
    pub attribute_shortcodes: Option<Vec<String>>,
    /// Shortcodes whose quoted positional arguments are references (default: ["imgrow"]).
    pub list_shortcodes: Option<Vec<String>>,
    /// Detect bare file names in prose (default: true).
    pub bare_paths: Option<bool>,
    /// Review context width on each side of a path (default: 5).
    pub context_chars: Option<usize>,
}

impl ScanConfig {
    pub fn metadata_key(&self) -> String {
        self.metadata_key
            .clone()
            .unwrap_or_else(|| DEFAULT_METADATA_KEY.to_string())
    }

    pub fn context_chars(&self) -> usize {
        self.context_chars.unwrap_or(DEFAULT_CONTEXT_CHARS)
    }

    /// Pattern options with defaults filled in.
    pub fn pattern_options(&self) -> PatternOptions {
        let defaults = PatternOptions::default();
        PatternOptions {
            attribute_shortcodes: self
                .attribute_shortcodes
                .clone()
                .unwrap_or(defaults.attribute_shortcodes),
            list_shortcodes: self
                .list_shortcodes
                .clone()
                .unwrap_or(defaults.list_shortcodes),
            bare_paths: self.bare_paths.unwrap_or(defaults.bare_paths),
        }
    }
}

/// Path resolution configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Base directory for root-relative paths such as `/img/a.jpg`.
    /// Relative values are taken relative to the target folder.
    pub site_root: Option<PathBuf>,
}

/// Write-back configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    /// "span" or "all-occurrences" (default: "span").
    pub mode: Option<String>,
}

impl RewriteConfig {
    pub fn mode(&self) -> Result<RewriteMode> {
        match self.mode.as_deref() {
            None => Ok(RewriteMode::Span),
            Some(value) => Ok(RewriteMode::parse(value)?),
        }
    }
}

/// Image encoding configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    /// WebP quality from 1 to 100 (default: 80).
    pub quality: Option<u8>,
    /// Encode losslessly (default: false).
    pub lossless: Option<bool>,
}

impl ConvertConfig {
    pub fn quality(&self) -> u8 {
        self.quality.unwrap_or(DEFAULT_QUALITY)
    }

    pub fn lossless(&self) -> bool {
        self.lossless.unwrap_or(false)
    }
}

/// Backup configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    /// Directory receiving timestamped backups.
    pub dir: Option<PathBuf>,
}

impl BackupConfig {
    /// Backup directory, defaulting to `<data-local-dir>/relink/backups`.
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_backup_dir)
    }
}

fn default_backup_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("relink")
        .join("backups")
}

impl RelinkConfig {
    /// Load configuration from `path`.
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: RelinkConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Find and load the configuration for `folder`.
    ///
    /// An explicit path must exist. Without one, `RELINK_CONFIG` and then
    /// `<folder>/.relink.toml` are tried; if neither is present the empty
    /// configuration is returned.
    pub fn discover(explicit: Option<&Path>, folder: &Path) -> Result<(Self, Option<PathBuf>)> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::discover_with(explicit, from_env.as_deref(), folder)
    }

    fn discover_with(
        explicit: Option<&Path>,
        from_env: Option<&Path>,
        folder: &Path,
    ) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit.or(from_env) {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let local = folder.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Ok((Self::load(&local)?, Some(local)));
        }

        Ok((Self::default(), None))
    }

    pub fn scan(&self) -> ScanConfig {
        self.scan.clone().unwrap_or_default()
    }

    pub fn rewrite_mode(&self) -> Result<RewriteMode> {
        self.rewrite.clone().unwrap_or_default().mode()
    }

    /// WebP converter from the `[convert]` table.
    ///
    /// `quality` and `lossless` come from the command line and take
    /// precedence; `lossless` can only switch lossless encoding on.
    pub fn converter(&self, quality: Option<u8>, lossless: bool) -> Result<WebpConverter> {
        let convert = self.convert.clone().unwrap_or_default();
        let converter = WebpConverter::new(
            quality.unwrap_or_else(|| convert.quality()),
            lossless || convert.lossless(),
        )?;
        Ok(converter)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backup.clone().unwrap_or_default().dir()
    }

    /// Site root resolved against `folder`.
    pub fn site_root(&self, folder: &Path) -> Option<PathBuf> {
        let root = self.resolver.as_ref()?.site_root.as_ref()?;
        if root.is_absolute() {
            Some(root.clone())
        } else {
            Some(folder.join(root))
        }
    }
}
