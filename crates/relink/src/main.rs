//! relink
//!
//! Converts raster images to WebP and rewrites the Markdown references to
//! them, asking before each change unless told otherwise.

use anyhow::Result;
use clap::Parser;
use relink::cli::{Cli, Commands, ReviewArgs};
use relink::commands::{
    CommandExecutor, ConvertSummary, PruneSummary, RefsOptions, RefsSummary, ScanReport,
};
use relink::config::RelinkConfig;
use relink::errors::{self, ActionableError, RelinkError};
use relink::output::{ErrorCode, ExitCode, OutputContext};
use relink::prompt::TerminalChannel;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "relink=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// JSON error code for a failed command
fn error_code(error: &anyhow::Error) -> &'static str {
    for cause in error.chain() {
        if let Some(relink_error) = cause.downcast_ref::<RelinkError>() {
            return match relink_error {
                RelinkError::Backup { .. } => ErrorCode::BACKUP_FAILED,
                RelinkError::InvalidConfig(_) => ErrorCode::INVALID_CONFIG,
                RelinkError::Read { source, .. } | RelinkError::Write { source, .. } => {
                    ErrorCode::for_io(source)
                }
                RelinkError::Prompt(_) => ErrorCode::IO_ERROR,
                RelinkError::Encode { .. } => ErrorCode::GENERIC,
            };
        }
        if cause.is::<toml::de::Error>() {
            return ErrorCode::INVALID_CONFIG;
        }
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return ErrorCode::for_io(io_error);
        }
    }
    ErrorCode::GENERIC
}

/// Human-facing description of a failed command
fn describe(error: &anyhow::Error, code: &str, folder: &Path) -> ActionableError {
    match code {
        ErrorCode::BACKUP_FAILED => errors::backup_failed(
            &folder.display().to_string(),
            &error.root_cause().to_string(),
        ),
        ErrorCode::INVALID_CONFIG => errors::invalid_config(&format!("{:#}", error)),
        _ => ActionableError::new(format!("{:#}", error)),
    }
}

fn report_failure(
    output: OutputContext,
    code: &str,
    error: ActionableError,
    command: &str,
    details: Option<serde_json::Value>,
) -> ExitCode {
    if let Err(e) = output.report_failure(code, &error, command, details) {
        eprintln!("Error: {}", e);
    }
    ErrorCode::to_exit_code(code)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = OutputContext::new(cli.quiet, cli.json);
    let command = cli.command.name();
    let folder = cli.command.folder().clone();

    let exit_code = if !folder.is_dir() {
        let display = folder.display().to_string();
        report_failure(
            output,
            ErrorCode::FOLDER_NOT_FOUND,
            errors::folder_not_found(&display),
            command,
            Some(serde_json::json!({ "folder": display })),
        )
    } else {
        match run(cli, output) {
            Ok(code) => code,
            Err(e) => {
                let code = error_code(&e);
                report_failure(output, code, describe(&e, code, &folder), command, None)
            }
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn run(cli: Cli, output: OutputContext) -> Result<ExitCode> {
    let folder = cli.command.folder().clone();
    let (config, config_path) = RelinkConfig::discover(cli.config.as_deref(), &folder)?;
    if let Some(path) = &config_path {
        tracing::debug!(config = %path.display(), "configuration loaded");
    }

    let executor = CommandExecutor::new(&folder, config);
    let mut channel = TerminalChannel::stdio();
    let command = cli.command.name();

    match cli.command {
        Commands::Refs {
            review,
            dry_run,
            all_occurrences,
            no_backup,
            ..
        } => {
            let options = refs_options(review, dry_run, all_occurrences, !no_backup);
            let summary = executor.update_references(&options, &mut channel)?;
            print_refs(&summary, output)?;
            output.emit_json(&summary, command)?;
            Ok(exit_for(summary.has_failures()))
        }
        Commands::Convert {
            encode,
            overwrite,
            no_backup,
            ..
        } => {
            let converter = executor
                .config()
                .converter(encode.quality, encode.lossless)?;
            let summary =
                executor.convert_images(&converter, overwrite, !no_backup, &mut channel)?;
            print_convert(&summary, output)?;
            output.emit_json(&summary, command)?;
            Ok(exit_for(!summary.report.failures.is_empty()))
        }
        Commands::Run {
            review,
            encode,
            overwrite,
            no_backup,
            ..
        } => {
            let converter = executor
                .config()
                .converter(encode.quality, encode.lossless)?;
            let convert =
                executor.convert_images(&converter, overwrite, !no_backup, &mut channel)?;
            print_convert(&convert, output)?;

            // The folder backup above already covers the document rewrite.
            let backup = !no_backup && convert.backup.is_none();
            let options = refs_options(review, false, false, backup);
            let refs = executor.update_references(&options, &mut channel)?;
            print_refs(&refs, output)?;

            let failed = !convert.report.failures.is_empty() || refs.has_failures();
            output.emit_json(&RunSummary { convert, refs }, command)?;
            Ok(exit_for(failed))
        }
        Commands::Prune { yes, no_backup, .. } => {
            let candidates = executor.find_prunable()?;
            if !candidates.is_empty() {
                output.print_info(format!(
                    "Found {} original image(s) with a converted copy:",
                    candidates.len()
                ))?;
                for path in &candidates {
                    output.print_data(path.display())?;
                }
            }
            let summary = executor.prune(candidates, yes, !no_backup, &mut channel)?;
            print_prune(&summary, output)?;
            output.emit_json(&summary, command)?;
            Ok(exit_for(!summary.report.failures.is_empty()))
        }
        Commands::Scan { .. } => {
            let report = executor.scan()?;
            print_scan(&report, output)?;
            output.emit_json(&report, command)?;
            Ok(exit_for(!report.failures.is_empty()))
        }
    }
}

#[derive(Serialize)]
struct RunSummary {
    convert: ConvertSummary,
    refs: RefsSummary,
}

fn refs_options(
    review: ReviewArgs,
    dry_run: bool,
    all_occurrences: bool,
    backup: bool,
) -> RefsOptions {
    RefsOptions {
        auto: review.auto,
        sticky_auto: review.sticky_auto,
        accept_risky: review.accept_risky,
        dry_run,
        all_occurrences,
        backup,
    }
}

fn exit_for(failed: bool) -> ExitCode {
    if failed {
        ExitCode::GenericError
    } else {
        ExitCode::Success
    }
}

fn print_refs(summary: &RefsSummary, output: OutputContext) -> Result<()> {
    if let Some(backup) = &summary.backup {
        output.print_info(format!("Backup created: {}", backup.display()))?;
    }

    for document in &summary.report.documents {
        for warning in &document.warnings {
            output.print_warning(format!("{}: {}", document.path.display(), warning))?;
        }
        if !document.changed {
            continue;
        }
        match &document.diff {
            Some(diff) => output.print_data(diff.trim_end())?,
            None => output.print_info(format!(
                "Updated {} ({} reference(s))",
                document.path.display(),
                document.applied.len()
            ))?,
        }
    }

    for failure in &summary.report.failures {
        output.print_error(format!("{}: {}", failure.path.display(), failure.error))?;
    }

    let verb = if summary.dry_run {
        "would change"
    } else {
        "changed"
    };
    output.print_info(format!(
        "{} of {} document(s) {}, {} reference(s) applied",
        summary.documents_changed, summary.documents_scanned, verb, summary.references_applied
    ))?;
    Ok(())
}

fn print_convert(summary: &ConvertSummary, output: OutputContext) -> Result<()> {
    if summary.images_found == 0 {
        output.print_info("No images to convert")?;
        return Ok(());
    }
    if let Some(backup) = &summary.backup {
        output.print_info(format!("Backup created: {}", backup.display()))?;
    }
    for path in &summary.report.converted {
        output.print_info(format!("Converted: {}", path.display()))?;
    }
    for failure in &summary.report.failures {
        output.print_error(format!("{}: {}", failure.path.display(), failure.error))?;
    }
    output.print_info(format!(
        "{} converted, {} skipped, {} failed",
        summary.report.converted.len(),
        summary.report.skipped.len(),
        summary.report.failures.len()
    ))?;
    Ok(())
}

fn print_prune(summary: &PruneSummary, output: OutputContext) -> Result<()> {
    if summary.candidates.is_empty() {
        output.print_info("Nothing to delete")?;
        return Ok(());
    }
    if summary.cancelled {
        output.print_info("Cancelled, nothing deleted")?;
        return Ok(());
    }
    if let Some(backup) = &summary.backup {
        output.print_info(format!("Backup created: {}", backup.display()))?;
    }
    for failure in &summary.report.failures {
        output.print_error(format!("{}: {}", failure.path.display(), failure.error))?;
    }
    output.print_info(format!("Deleted {} file(s)", summary.report.deleted.len()))?;
    Ok(())
}

fn print_scan(report: &ScanReport, output: OutputContext) -> Result<()> {
    for document in &report.documents {
        output.print_data(document.path.display())?;
        for warning in &document.warnings {
            output.print_warning(format!("{}: {}", document.path.display(), warning))?;
        }
        for candidate in &document.candidates {
            output.print_data(format!("  {}", candidate.label()))?;
            if candidate.kind.is_risky() {
                output.print_info(format!("      {}", candidate.before_text()))?;
            }
        }
    }
    for failure in &report.failures {
        output.print_error(format!("{}: {}", failure.path.display(), failure.error))?;
    }
    output.print_info(format!(
        "{} candidate(s) in {} of {} document(s)",
        report.candidate_count,
        report.documents.len(),
        report.documents_scanned
    ))?;
    Ok(())
}
