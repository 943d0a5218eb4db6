use clap::Parser;
use dupedoctor::cli::Cli;
use dupedoctor::duplicates::FinderError;
use dupedoctor::error::ExitCode;
use dupedoctor::run_app;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Temp tree plus an empty config file so the user's own config never leaks in.
struct Fixture {
    dir: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempdir().unwrap();
        let config = dir.path().join("settings.toml");
        fs::write(&config, "").unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        for (name, content) in files {
            let path = data.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        Self { dir, config }
    }

    fn data(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let mut argv = vec![
            "dupedoctor".to_string(),
            "-q".to_string(),
            "--no-color".to_string(),
            "--config".to_string(),
            self.config.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        run_app(Cli::try_parse_from(argv).unwrap())
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_scan_without_duplicates_exits_2() {
    let fx = Fixture::new(&[("a.txt", "1"), ("b.txt", "2")]);
    let code = fx.run(&["scan", &path_arg(&fx.data())]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_scan_with_duplicates_writes_outputs() {
    let fx = Fixture::new(&[("a.txt", "dup"), ("a - Copy.txt", "dup")]);
    let manifest = fx.dir.path().join("manifest.csv");
    let report = fx.dir.path().join("report.txt");

    let code = fx
        .run(&[
            "scan",
            &path_arg(&fx.data()),
            "--output",
            "json",
            "--manifest",
            &path_arg(&manifest),
            "--report",
            &path_arg(&report),
        ])
        .unwrap();

    assert_eq!(code, ExitCode::Success);
    let manifest = fs::read_to_string(manifest).unwrap();
    assert_eq!(manifest.lines().count(), 3);
    assert!(fs::read_to_string(report).unwrap().contains("[keep]"));
}

#[test]
fn test_empty_scan_manifest_keeps_header() {
    let fx = Fixture::new(&[]);
    let manifest = fx.dir.path().join("manifest.csv");

    let code = fx
        .run(&["scan", &path_arg(&fx.data()), "--manifest", &path_arg(&manifest)])
        .unwrap();

    assert_eq!(code, ExitCode::NoDuplicates);
    assert_eq!(
        fs::read_to_string(manifest).unwrap(),
        "Full Path,File Name,Size (Bytes),Date Created,Date Modified\n"
    );
}

#[test]
fn test_scan_missing_root_is_fatal() {
    let fx = Fixture::new(&[]);
    let err = fx
        .run(&["scan", &path_arg(&fx.dir.path().join("nowhere"))])
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::PathNotFound(_))
    ));
}

#[test]
fn test_invalid_config_is_fatal() {
    let fx = Fixture::new(&[("a.txt", "1")]);
    fs::write(&fx.config, "strategy = \"metadata\"\ncriteria = []\n").unwrap();

    let result = fx.run(&["scan", &path_arg(&fx.data())]);
    assert!(result.is_err());
}

#[test]
fn test_quarantine_defaults_to_dry_run() {
    let fx = Fixture::new(&[("a.txt", "dup"), ("a - Copy.txt", "dup")]);
    let code = fx.run(&["quarantine", &path_arg(&fx.data())]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(fx.data().join("a - Copy.txt").exists());
    assert!(!fx.data().join("_quarantine_data").exists());
}

#[test]
fn test_quarantine_move_then_undo() {
    let fx = Fixture::new(&[
        ("a.txt", "dup"),
        ("nested/a - Copy.txt", "dup"),
        ("other.txt", "unique"),
    ]);
    let quarantine = fx.data().join("_quarantine_data");

    let code = fx
        .run(&["quarantine", &path_arg(&fx.data()), "--mode", "move"])
        .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(!fx.data().join("nested/a - Copy.txt").exists());
    assert!(quarantine.join("nested/a - Copy.txt").exists());

    // The quarantine is never rescanned as part of the source tree.
    let code = fx.run(&["scan", &path_arg(&fx.data())]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);

    let code = fx.run(&["undo", &path_arg(&quarantine)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        fs::read_to_string(fx.data().join("nested/a - Copy.txt")).unwrap(),
        "dup"
    );
}

#[test]
fn test_undo_without_log_is_fatal() {
    let fx = Fixture::new(&[]);
    assert!(fx.run(&["undo", &path_arg(&fx.data())]).is_err());
}

#[test]
fn test_config_command() {
    let fx = Fixture::new(&[]);
    assert_eq!(fx.run(&["config"]).unwrap(), ExitCode::Success);
}
