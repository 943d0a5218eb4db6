//! DupeDoctor - duplicate file finder with reversible quarantine.
//!
//! Files under a root are fingerprinted (SHA-256 content hash, size and
//! extension, or a composite of metadata fields), grouped by equal keys, and
//! one canonical file per group is kept. The rest can be copied or moved into
//! a mirrored quarantine tree; every relocation is recorded in a CSV move log
//! that `undo` replays.
//!
//! [`run_app`] drives the command-line binary; the modules can also be used
//! directly as a library.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use yansi::Paint;

use crate::actions::{
    mirror_restore, restore_quarantine, MoveMode, MoveProgressCallback, MoveSummary,
    QuarantineMover, RestoreOptions, RestoreSummary,
};
use crate::cli::{Cli, Commands, OutputFormat, QuarantineArgs, ScanArgs, UndoArgs};
use crate::config::{Settings, SettingsOverrides};
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanReport};
use crate::error::ExitCode;
use crate::output::{write_summary, JsonOutput, ManifestOutput, ReportOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::signal::CancelToken;

/// Run the command selected on the command line.
///
/// # Errors
///
/// Returns an error for fatal problems: unusable configuration, a missing
/// or invalid root, an interrupted scan, or an output file that cannot be
/// written. Per-file problems are reported and turned into
/// [`ExitCode::PartialSuccess`] instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }
    logging::init_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Scan(args) => run_scan(&cli, args),
        Commands::Quarantine(args) => run_quarantine(&cli, args),
        Commands::Undo(args) => run_undo(args),
        Commands::Config => show_config(&cli),
    }
}

fn load_settings(cli: &Cli, overrides: &SettingsOverrides) -> Result<Settings> {
    Settings::load(cli.config.as_deref(), overrides).map_err(|e| {
        log::error!("{e}");
        anyhow::Error::new(e).context("Failed to load configuration")
    })
}

/// Walk and group `root`, never descending into `quarantine_root`.
fn scan(
    settings: &Settings,
    root: &Path,
    quarantine_root: &Path,
    cancel: CancelToken,
    progress: Arc<Progress>,
) -> Result<ScanReport> {
    let strategy = settings.fingerprint()?;
    let walker_config = settings.walker_config().with_excluded_dir(quarantine_root);
    log::debug!(
        "Strategy {}, criteria {:?}, excluding {}",
        strategy.name(),
        settings.criteria,
        quarantine_root.display()
    );

    let config = FinderConfig::default()
        .with_walker_config(walker_config)
        .with_strategy(strategy)
        .with_cancel_token(cancel)
        .with_progress_callback(progress as Arc<dyn ProgressCallback>);

    Ok(DuplicateFinder::new(config).find_duplicates(root)?)
}

fn install_cancel_token() -> Result<CancelToken> {
    signal::install_handler().context("Failed to install Ctrl+C handler")
}

fn scan_exit_code(report: &ScanReport) -> ExitCode {
    if report.summary.has_diagnostics() {
        ExitCode::PartialSuccess
    } else if report.groups.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> Result<ExitCode> {
    let settings = load_settings(cli, &args.matching.overrides())?;
    let quarantine_root = settings
        .quarantine_config()
        .layout_for(&args.path)
        .quarantine_root()
        .to_path_buf();
    let cancel = install_cancel_token()?;
    let progress = Arc::new(Progress::new(cli.quiet));

    let report = scan(&settings, &args.path, &quarantine_root, cancel, progress)?;
    let exit_code = scan_exit_code(&report);

    if let Some(path) = &args.manifest {
        let file = File::create(path)
            .with_context(|| format!("Failed to create manifest {}", path.display()))?;
        ManifestOutput::new(&report.files)
            .write_to(BufWriter::new(file))
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        log::info!("Manifest written to {}", path.display());
    }

    if let Some(path) = &args.report {
        ReportOutput::new(&report.groups)
            .write_to_path(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Json => {
            JsonOutput::new(&report.groups, &report.summary, exit_code)
                .write_to(&mut out, true)
                .context("Failed to write JSON output")?;
        }
        OutputFormat::Text => {
            if report.groups.is_empty() {
                writeln!(out, "No duplicate files found.")?;
            } else {
                ReportOutput::new(&report.groups).write_console(&mut out)?;
            }
            write_summary(&mut out, &report.summary)?;
        }
    }

    Ok(exit_code)
}

fn run_quarantine(cli: &Cli, args: &QuarantineArgs) -> Result<ExitCode> {
    let settings = load_settings(cli, &args.overrides())?;
    let cancel = install_cancel_token()?;
    let quarantine_config = settings.quarantine_config().with_cancel_token(cancel.clone());
    let layout = quarantine_config.layout_for(&args.path);
    let progress = Arc::new(Progress::new(cli.quiet));

    let report = scan(
        &settings,
        &args.path,
        layout.quarantine_root(),
        cancel,
        Arc::clone(&progress),
    )?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if report.groups.is_empty() {
        writeln!(out, "No duplicate files found.")?;
        write_summary(&mut out, &report.summary)?;
        return Ok(scan_exit_code(&report));
    }

    let mover = QuarantineMover::new(layout.source_root(), quarantine_config);
    log::info!(
        "Quarantine ({}) into {}",
        mover.mode(),
        mover.layout().quarantine_root().display()
    );
    let handle = mover.spawn(
        report.groups,
        Some(progress as Arc<dyn MoveProgressCallback>),
    )?;
    let summary = handle.join()?;

    print_move_summary(&mut out, &summary)?;
    for diagnostic in &report.summary.diagnostics {
        writeln!(out, "  {}", diagnostic.message.as_str().red())?;
    }

    Ok(if summary.cancelled {
        ExitCode::Interrupted
    } else if !summary.all_succeeded() || report.summary.has_diagnostics() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn print_move_summary<W: Write>(out: &mut W, summary: &MoveSummary) -> io::Result<()> {
    if summary.mode == MoveMode::DryRun {
        for entry in &summary.entries {
            writeln!(
                out,
                "Would move: {} -> {}",
                entry.source.display(),
                entry.destination.display()
            )?;
        }
    }

    writeln!(out, "{}", summary.summary().bold())?;
    if let Some(log_path) = &summary.log_path {
        writeln!(out, "Move log: {}", log_path.display())?;
    }
    for diagnostic in &summary.diagnostics {
        writeln!(out, "  {}", diagnostic.message.as_str().red())?;
    }
    Ok(())
}

fn run_undo(args: &UndoArgs) -> Result<ExitCode> {
    let quarantine_dir = std::path::absolute(&args.quarantine_dir)
        .with_context(|| format!("Invalid path {}", args.quarantine_dir.display()))?;

    let summary = if args.mirror {
        let target = match &args.root {
            Some(root) => root.clone(),
            None => quarantine_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        mirror_restore(&quarantine_dir, &target)?
    } else {
        restore_quarantine(
            &quarantine_dir,
            RestoreOptions {
                keep_log: args.keep_log,
            },
        )?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_restore_summary(&mut out, &summary)?;

    Ok(if summary.is_complete_success() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    })
}

fn print_restore_summary<W: Write>(out: &mut W, summary: &RestoreSummary) -> io::Result<()> {
    writeln!(out, "{}", summary.summary().bold())?;
    for (path, reason) in &summary.skipped {
        writeln!(out, "  skipped {}: {}", path.display(), reason.yellow())?;
    }
    for diagnostic in &summary.failed {
        writeln!(out, "  {}", diagnostic.message.as_str().red())?;
    }
    if summary.log_consumed {
        writeln!(out, "Move log removed.")?;
    }
    Ok(())
}

fn show_config(cli: &Cli) -> Result<ExitCode> {
    let settings = load_settings(cli, &SettingsOverrides::default())?;
    let source = cli
        .config
        .clone()
        .or_else(Settings::default_config_path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<none>".to_string());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "# config file: {source}")?;
    write!(out, "{}", settings.to_toml()?)?;
    Ok(ExitCode::Success)
}
