use dupedoctor::duplicates::DuplicateFinder;
use dupedoctor::error::ExitCode;
use dupedoctor::output::{JsonOutput, ManifestOutput, ReportOutput};
use dupedoctor::scanner::WalkerConfig;
use std::fs;
use tempfile::tempdir;

fn scanned() -> (tempfile::TempDir, dupedoctor::duplicates::ScanReport) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "same").unwrap();
    fs::write(dir.path().join("a - Copy.txt"), "same").unwrap();
    fs::write(dir.path().join("keep.py"), "same").unwrap();
    fs::write(dir.path().join("solo.txt"), "different").unwrap();

    let config = dupedoctor::duplicates::FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_exclude_extensions(["py"]));
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    (dir, report)
}

#[test]
fn test_manifest_lists_every_walked_file() {
    let (_dir, report) = scanned();
    let csv = ManifestOutput::new(&report.files).to_csv_string().unwrap();

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["Full Path", "File Name", "Size (Bytes)", "Date Created", "Date Modified"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| !r[1].ends_with(".py")));
    let solo = rows.iter().find(|r| &r[1] == "solo.txt").unwrap();
    assert_eq!(&solo[2], "9");
}

#[test]
fn test_report_marks_canonical() {
    let (dir, report) = scanned();
    let path = dir.path().join("report.txt");
    ReportOutput::new(&report.groups).write_to_path(&path).unwrap();

    let text = fs::read_to_string(path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert!(lines[0].starts_with("Duplicate Report — "));
    assert_eq!(lines[2], "Group 1 (2 files, 0.00 MiB)");
    assert!(lines
        .iter()
        .any(|l| l.ends_with("a.txt [keep]") && l.starts_with(" - ")));
    assert!(lines.iter().any(|l| l.ends_with("a - Copy.txt")));
    assert_eq!(*lines.last().unwrap(), "-".repeat(40));
}

#[test]
fn test_json_round_trips_through_serde_json() {
    let (_dir, report) = scanned();
    let mut buffer = Vec::new();
    JsonOutput::new(&report.groups, &report.summary, ExitCode::Success)
        .write_to(&mut buffer, true)
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
    let groups = value["duplicates"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups[0]["canonical"].as_str().unwrap().ends_with("a.txt"));
    assert_eq!(groups[0]["candidates"].as_array().unwrap().len(), 1);
    assert!(groups[0]["key"].as_str().unwrap().starts_with("sha256:"));
    assert_eq!(value["summary"]["total_files"], 3);
    assert_eq!(value["summary"]["exit_code_name"], "DD000");
}
