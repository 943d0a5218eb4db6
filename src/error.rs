//! Structured error handling, diagnostics and exit codes.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Exit codes for the DupeDoctor application.
///
/// - 0: Success (completed normally, duplicates found or action done)
/// - 1: General error (unexpected failure or invalid configuration)
/// - 2: No duplicates found (completed normally, nothing to do)
/// - 3: Partial success (completed with some non-fatal per-file failures)
/// - 130: Interrupted by user (Ctrl+C / cancellation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Completed but some files could not be processed.
    PartialSuccess = 3,
    /// Interrupted: Run was cancelled by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DD000",
            Self::GeneralError => "DD001",
            Self::NoDuplicates => "DD002",
            Self::PartialSuccess => "DD003",
            Self::Interrupted => "DD130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Category of a recovered per-file problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Stat or read refused by the OS.
    AccessDenied,
    /// Entry vanished or could not be read for another reason.
    NotReadable,
    /// Move, copy, mkdir or restore failed.
    WriteFailure,
}

/// A per-file problem that was recovered locally.
///
/// Diagnostics are accumulated in run summaries and never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Path the problem concerns
    pub path: PathBuf,
    /// Category
    pub kind: DiagnosticKind,
    /// Human-readable detail
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic.
    #[must_use]
    pub fn new(path: &Path, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            message: message.into(),
        }
    }
}
