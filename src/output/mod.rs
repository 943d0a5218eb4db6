//! Output formatters for scan results.
//!
//! This module provides the formats a scan can be written in:
//! - a metadata manifest CSV covering every walked file
//! - a text duplicate report (plain for files, colored for the console)
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupedoctor::duplicates::DuplicateFinder;
//! use dupedoctor::error::ExitCode;
//! use dupedoctor::output::{JsonOutput, ReportOutput};
//! use std::path::Path;
//!
//! let report = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//!
//! ReportOutput::new(&report.groups)
//!     .write_to(&mut std::io::stdout())
//!     .unwrap();
//!
//! let output = JsonOutput::new(&report.groups, &report.summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod manifest;
pub mod report;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use manifest::{ManifestError, ManifestOutput};
pub use report::{write_summary, ReportOutput};
