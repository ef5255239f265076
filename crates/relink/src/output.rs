//! Report rendering for the CLI.
//!
//! Reports and diffs go to stdout, warnings and errors to stderr. With
//! `--json` a command prints exactly one envelope on stdout instead:
//! [`JsonOutput`] when it ran, [`JsonError`] when it could not.

use crate::errors::ActionableError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::io::{self, Write};

/// Version of the JSON envelope layout
const OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Write one line; a closed pipe (`relink scan | head`) ends the process
/// quietly.
fn emit(stream: Stream, line: &str) -> io::Result<()> {
    let result = match stream {
        Stream::Stdout => writeln!(io::stdout().lock(), "{}", line),
        Stream::Stderr => writeln!(io::stderr().lock(), "{}", line),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => std::process::exit(0),
        other => other,
    }
}

/// What a command is allowed to print, from `--quiet` and `--json`.
#[derive(Debug, Clone, Copy)]
pub struct OutputContext {
    quiet: bool,
    json: bool,
}

impl OutputContext {
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    /// Results such as file lists and diffs; hidden only by `--json`.
    pub fn print_data(&self, msg: impl Display) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        emit(Stream::Stdout, &msg.to_string())
    }

    /// Progress and summary lines; hidden by `--quiet` and `--json`.
    pub fn print_info(&self, msg: impl Display) -> io::Result<()> {
        if self.quiet || self.json {
            return Ok(());
        }
        emit(Stream::Stdout, &msg.to_string())
    }

    pub fn print_warning(&self, msg: impl Display) -> io::Result<()> {
        if self.quiet || self.json {
            return Ok(());
        }
        emit(Stream::Stderr, &format!("Warning: {}", msg))
    }

    /// Per-file failures; always shown.
    pub fn print_error(&self, msg: impl Display) -> io::Result<()> {
        emit(Stream::Stderr, &format!("Error: {}", msg))
    }

    /// Print `data` as the command's success envelope. Does nothing without
    /// `--json`.
    pub fn emit_json<T: Serialize>(&self, data: &T, command: &str) -> io::Result<()> {
        if !self.json {
            return Ok(());
        }
        emit(
            Stream::Stdout,
            &JsonOutput::success(data, command).to_json_string()?,
        )
    }

    /// Print a command failure: a [`JsonError`] envelope on stdout with
    /// `--json`, the actionable text on stderr otherwise.
    pub fn report_failure(
        &self,
        code: &str,
        error: &ActionableError,
        command: &str,
        details: Option<Value>,
    ) -> io::Result<()> {
        if !self.json {
            return emit(Stream::Stderr, error.to_string().trim_end());
        }
        let mut envelope = JsonError::from_actionable(code, error, command);
        if let Some(details) = details {
            envelope = envelope.with_details(details);
        }
        emit(Stream::Stdout, &envelope.to_json_string()?)
    }
}

/// `{ success: true, data, metadata }`
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub success: bool,
    pub data: T,
    pub metadata: Metadata,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T, command: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            metadata: Metadata::now(command),
        }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// `{ success: false, error, metadata }`
#[derive(Debug, Serialize)]
pub struct JsonError {
    pub success: bool,
    pub error: ErrorDetail,
    pub metadata: Metadata,
}

impl JsonError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
                causes: Vec::new(),
                suggestions: Vec::new(),
            },
            metadata: Metadata::now(command),
        }
    }

    /// Envelope carrying an [`ActionableError`]'s causes and remedies.
    pub fn from_actionable(code: &str, error: &ActionableError, command: &str) -> Self {
        let mut envelope = Self::new(code, error.message(), command);
        envelope.error.causes = error.causes().to_vec();
        envelope.error.suggestions = error.remedies().to_vec();
        envelope
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn exit_code(&self) -> ExitCode {
        ErrorCode::to_exit_code(&self.error.code)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// One of the [`ErrorCode`] constants
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Process exit status of `relink`.
///
/// ```rust
/// use relink::output::ExitCode;
///
/// assert_eq!(ExitCode::NotFound.code(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Also used when some files of a batch failed and the rest succeeded
    GenericError = 1,
    InvalidArgument = 2,
    NotFound = 3,
    PermissionDenied = 5,
    /// Backup, file system or terminal failure
    ExternalError = 10,
}

impl ExitCode {
    const ALL: [ExitCode; 6] = [
        ExitCode::Success,
        ExitCode::GenericError,
        ExitCode::InvalidArgument,
        ExitCode::NotFound,
        ExitCode::PermissionDenied,
        ExitCode::ExternalError,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Command succeeded",
            ExitCode::GenericError => "Command failed, or some files could not be processed",
            ExitCode::InvalidArgument => "Invalid arguments or configuration",
            ExitCode::NotFound => "Folder or file not found",
            ExitCode::PermissionDenied => "Permission denied",
            ExitCode::ExternalError => "Backup, file system or terminal failure",
        }
    }

    /// Exit code table shown at the end of `--help`
    pub fn all_codes_documentation() -> String {
        let rows: Vec<String> = Self::ALL
            .iter()
            .map(|code| format!("  {:<3}- {}", code.code(), code.description()))
            .collect();
        format!("Exit Codes:\n{}", rows.join("\n"))
    }
}

/// Error codes of [`JsonError`] envelopes.
pub struct ErrorCode;

impl ErrorCode {
    pub const FOLDER_NOT_FOUND: &'static str = "FOLDER_NOT_FOUND";
    pub const NOT_FOUND: &'static str = "NOT_FOUND";
    pub const INVALID_ARGUMENT: &'static str = "INVALID_ARGUMENT";
    pub const INVALID_CONFIG: &'static str = "INVALID_CONFIG";
    pub const BACKUP_FAILED: &'static str = "BACKUP_FAILED";
    pub const PERMISSION_DENIED: &'static str = "PERMISSION_DENIED";
    pub const IO_ERROR: &'static str = "IO_ERROR";
    pub const GENERIC: &'static str = "ERROR";

    /// Code for a file system failure.
    pub fn for_io(error: &io::Error) -> &'static str {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NOT_FOUND,
            io::ErrorKind::PermissionDenied => Self::PERMISSION_DENIED,
            _ => Self::IO_ERROR,
        }
    }

    pub fn to_exit_code(code: &str) -> ExitCode {
        match code {
            Self::FOLDER_NOT_FOUND | Self::NOT_FOUND => ExitCode::NotFound,
            Self::INVALID_ARGUMENT | Self::INVALID_CONFIG => ExitCode::InvalidArgument,
            Self::PERMISSION_DENIED => ExitCode::PermissionDenied,
            Self::BACKUP_FAILED | Self::IO_ERROR => ExitCode::ExternalError,
            _ => ExitCode::GenericError,
        }
    }
}

/// Attached to every envelope.
#[derive(Debug, Serialize)]
pub struct Metadata {
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub command: String,
}

impl Metadata {
    fn now(command: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            version: OUTPUT_VERSION,
            command: command.into(),
        }
    }
}
