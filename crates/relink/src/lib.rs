//! relink library
//!
//! Finds image references in Markdown documents and rewrites them to point at
//! converted WebP siblings, with every change confirmed by a
//! [`policy::ConfirmationChannel`]. The binary is a thin layer over
//! [`commands::CommandExecutor`]; the library is also used directly by the
//! integration tests.

pub mod cli;
pub mod commands;
pub mod config;
pub mod convert;
pub mod document;
pub mod engine;
pub mod errors;
pub mod files;
pub mod output;
pub mod policy;
pub mod prompt;

// Re-export commonly used types
pub use commands::CommandExecutor;
pub use engine::{BatchOptions, BatchReport, RewriteEngine, RewriteMode};
pub use errors::{RelinkError, ScanWarning};
pub use output::{ExitCode, JsonError, JsonOutput};
pub use policy::{ConfirmationChannel, ConfirmationPolicy, Decision, PolicyState, ScriptedChannel};
