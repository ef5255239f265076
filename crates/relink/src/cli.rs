//! Command-line interface definitions using clap.

use crate::output::ExitCode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rewrite image references in Markdown to converted WebP siblings
///
/// Converts raster images to WebP, rewrites references to them in Markdown
/// documents (standard links, <img> tags, shortcodes, bare file names and the
/// front-matter image field), and prunes the originals afterwards. A
/// reference is only ever rewritten when its converted file exists.
///
/// Review prompts accept y (apply), n (skip) and gg (apply this and every
/// later change without asking).
#[derive(Parser)]
#[command(name = "relink", version)]
#[command(about = "Rewrite image references to converted WebP files", long_about = None)]
#[command(after_help = ExitCode::all_codes_documentation())]
pub struct Cli {
    /// Suppress non-essential output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print a JSON report instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug details to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: $RELINK_CONFIG, then <FOLDER>/.relink.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite image references in every Markdown document under FOLDER
    Refs {
        folder: PathBuf,

        #[command(flatten)]
        review: ReviewArgs,

        /// Show a diff of what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Rewrite every copy of an accepted reference's text, not just the
        /// reviewed one
        #[arg(long)]
        all_occurrences: bool,

        /// Do not back up FOLDER before writing
        #[arg(long)]
        no_backup: bool,
    },

    /// Convert every png/jpg/jpeg/bmp/tiff image under FOLDER to WebP
    Convert {
        folder: PathBuf,

        #[command(flatten)]
        encode: EncodeArgs,

        /// Replace existing WebP files without asking
        #[arg(long)]
        overwrite: bool,

        /// Do not back up FOLDER before converting
        #[arg(long)]
        no_backup: bool,
    },

    /// Convert images, then rewrite references to them
    Run {
        folder: PathBuf,

        #[command(flatten)]
        review: ReviewArgs,

        #[command(flatten)]
        encode: EncodeArgs,

        /// Replace existing WebP files without asking
        #[arg(long)]
        overwrite: bool,

        /// Do not back up FOLDER first
        #[arg(long)]
        no_backup: bool,
    },

    /// Delete original images that have a converted WebP copy
    Prune {
        folder: PathBuf,

        /// Delete without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Do not back up the files before deleting them
        #[arg(long)]
        no_backup: bool,
    },

    /// List every reference that would be offered, without prompting or writing
    Scan { folder: PathBuf },
}

impl Commands {
    /// Subcommand name as used in JSON metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Refs { .. } => "refs",
            Commands::Convert { .. } => "convert",
            Commands::Run { .. } => "run",
            Commands::Prune { .. } => "prune",
            Commands::Scan { .. } => "scan",
        }
    }

    pub fn folder(&self) -> &PathBuf {
        match self {
            Commands::Refs { folder, .. }
            | Commands::Convert { folder, .. }
            | Commands::Run { folder, .. }
            | Commands::Prune { folder, .. }
            | Commands::Scan { folder } => folder,
        }
    }
}

/// How references are confirmed.
#[derive(Args, Debug, Clone, Copy)]
pub struct ReviewArgs {
    /// Apply references without asking (risky kinds still need one
    /// confirmation per document)
    #[arg(long)]
    pub auto: bool,

    /// Keep applying without asking in later documents after answering gg
    #[arg(long)]
    pub sticky_auto: bool,

    /// Also apply bare file names and shortcode list entries without asking
    #[arg(long)]
    pub accept_risky: bool,
}

/// How images are encoded. Unset values fall back to the `[convert]` table.
#[derive(Args, Debug, Clone, Copy)]
pub struct EncodeArgs {
    /// WebP quality from 1 to 100 (default: 80)
    #[arg(long, value_name = "1-100")]
    pub quality: Option<u8>,

    /// Encode losslessly
    #[arg(long)]
    pub lossless: bool,
}
