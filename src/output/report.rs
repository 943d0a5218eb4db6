//! Human-readable duplicate report.
//!
//! The same layout is used for the `--report` file and for console output.
//! The file variant is always plain text; the console variant highlights
//! the kept file and the group headers with `yansi`, which the CLI turns off
//! globally for `--no-color`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use yansi::Paint;

use crate::duplicates::{DuplicateGroup, ScanSummary};

const TITLE_RULE_WIDTH: usize = 60;
const GROUP_RULE_WIDTH: usize = 40;
const MIB: f64 = 1024.0 * 1024.0;

/// Text report over a set of duplicate groups.
pub struct ReportOutput<'a> {
    groups: &'a [DuplicateGroup],
    generated_at: DateTime<Local>,
}

impl<'a> ReportOutput<'a> {
    /// Create a report stamped with the current local time.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self {
            groups,
            generated_at: Local::now(),
        }
    }

    /// Override the timestamp in the title line.
    #[must_use]
    pub fn with_timestamp(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Write the plain report.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.render(writer, false)
    }

    /// Write the plain report to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn write_to_path(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()
    }

    /// Write the colored console variant.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_console<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.render(writer, true)
    }

    fn render<W: Write>(&self, writer: &mut W, color: bool) -> io::Result<()> {
        let title = format!(
            "Duplicate Report — {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        if color {
            writeln!(writer, "{}", title.bold())?;
        } else {
            writeln!(writer, "{title}")?;
        }
        writeln!(writer, "{}", "=".repeat(TITLE_RULE_WIDTH))?;

        for (index, group) in self.groups.iter().enumerate() {
            let header = group_header(index + 1, group);
            if color {
                writeln!(writer, "{}", header.cyan().bold())?;
            } else {
                writeln!(writer, "{header}")?;
            }

            for file in group.files() {
                let path = file.path.display();
                if group.is_canonical(&file.path) {
                    if color {
                        writeln!(writer, " - {} {}", path.green(), "[keep]".green().bold())?;
                    } else {
                        writeln!(writer, " - {path} [keep]")?;
                    }
                } else {
                    writeln!(writer, " - {path}")?;
                }
            }
            writeln!(writer, "{}", "-".repeat(GROUP_RULE_WIDTH))?;
        }
        Ok(())
    }
}

/// `Group N (M files, X MiB)` where the size covers every member.
#[must_use]
pub fn group_header(number: usize, group: &DuplicateGroup) -> String {
    format!(
        "Group {number} ({} files, {:.2} MiB)",
        group.len(),
        group.total_size() as f64 / MIB
    )
}

/// Print the end-of-scan statistics block.
///
/// # Errors
///
/// Returns any I/O error from the writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &ScanSummary) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "Scan summary".bold())?;
    writeln!(writer, "  Strategy:          {}", summary.strategy)?;
    writeln!(
        writer,
        "  Files scanned:     {} ({})",
        summary.total_files,
        summary.total_size_display()
    )?;
    writeln!(writer, "  Duplicate groups:  {}", summary.duplicate_groups)?;
    writeln!(writer, "  Duplicate files:   {}", summary.duplicate_files)?;
    writeln!(
        writer,
        "  Reclaimable:       {} ({:.1}%)",
        summary.reclaimable_display().yellow(),
        summary.wasted_percentage()
    )?;
    if summary.unfingerprinted > 0 {
        writeln!(
            writer,
            "  Unreadable files:  {}",
            summary.unfingerprinted.red()
        )?;
    }
    writeln!(
        writer,
        "  Duration:          {:.2}s",
        summary.scan_duration.as_secs_f64()
    )?;

    if summary.has_diagnostics() {
        writeln!(writer)?;
        writeln!(writer, "{}", "Problems".red().bold())?;
        for diagnostic in &summary.diagnostics {
            writeln!(writer, "  {}", diagnostic.message)?;
        }
    }
    Ok(())
}
