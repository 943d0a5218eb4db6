use dupedoctor::actions::{
    mirror_restore, restore_quarantine, MoveLog, MoveMode, QuarantineConfig, QuarantineMover,
    RestoreError, RestoreOptions, SkipReason,
};
use dupedoctor::duplicates::DuplicateFinder;
use filetime::FileTime;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn snapshot(root: &Path, skip: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.path() != skip)
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
        .collect()
}

fn populate(root: &Path) {
    for (name, content) in [
        ("photos/a.jpg", "jpeg bytes"),
        ("photos/a - Copy.jpg", "jpeg bytes"),
        ("photos/2023/a (1).jpg", "jpeg bytes"),
        ("docs/report.pdf", "pdf"),
        ("docs/old/report (2).pdf", "pdf"),
        ("unique.txt", "only one"),
    ] {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn quarantine_all(root: &Path) -> PathBuf {
    let groups = DuplicateFinder::with_defaults()
        .find_duplicates(root)
        .unwrap()
        .groups;
    let mover = QuarantineMover::new(root, QuarantineConfig::new(MoveMode::Move));
    let summary = mover.run(&groups, None);
    assert!(summary.all_succeeded());
    assert_eq!(summary.success_count(), 3);
    mover.layout().quarantine_root().to_path_buf()
}

#[test]
fn test_round_trip_restores_bit_for_bit() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let quarantine = dir.path().join("_quarantine_none");
    let before = snapshot(dir.path(), &quarantine);

    let quarantine = quarantine_all(dir.path());
    assert_ne!(snapshot(dir.path(), &quarantine), before);

    let summary = restore_quarantine(&quarantine, RestoreOptions::default()).unwrap();

    assert!(summary.is_complete_success());
    assert_eq!(summary.restored_count(), 3);
    assert!(summary.log_consumed);
    assert!(!MoveLog::in_quarantine(&quarantine).exists());
    assert_eq!(snapshot(dir.path(), &quarantine), before);
}

#[test]
fn test_newer_destination_is_left_alone() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let quarantine = quarantine_all(dir.path());

    let occupied = dir.path().join("photos/a - Copy.jpg");
    fs::write(&occupied, "edited after quarantine").unwrap();
    let future = SystemTime::now() + Duration::from_secs(3600);
    filetime::set_file_mtime(&occupied, FileTime::from_system_time(future)).unwrap();

    let summary = restore_quarantine(&quarantine, RestoreOptions::default()).unwrap();

    assert_eq!(summary.restored_count(), 2);
    assert_eq!(
        summary.skipped,
        vec![(occupied.clone(), SkipReason::DestinationNewer)]
    );
    assert!(!summary.log_consumed);
    assert!(MoveLog::in_quarantine(&quarantine).exists());
    assert_eq!(
        fs::read_to_string(&occupied).unwrap(),
        "edited after quarantine"
    );
}

#[test]
fn test_keep_log_option() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let quarantine = quarantine_all(dir.path());

    let summary = restore_quarantine(&quarantine, RestoreOptions { keep_log: true }).unwrap();

    assert!(summary.is_complete_success());
    assert!(!summary.log_consumed);
    assert!(MoveLog::in_quarantine(&quarantine).exists());
}

#[test]
fn test_missing_log_is_an_error() {
    let dir = tempdir().unwrap();
    let result = restore_quarantine(dir.path(), RestoreOptions::default());
    assert!(matches!(result, Err(RestoreError::LogNotFound(_))));

    let result = restore_quarantine(&dir.path().join("absent"), RestoreOptions::default());
    assert!(matches!(result, Err(RestoreError::NotADirectory(_))));
}

#[test]
fn test_mirror_restore_copies_tree_back() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let quarantine = quarantine_all(dir.path());

    let summary = mirror_restore(&quarantine, dir.path()).unwrap();

    assert_eq!(summary.restored_count(), 3);
    assert!(dir.path().join("photos/a - Copy.jpg").exists());
    assert!(dir.path().join("docs/old/report (2).pdf").exists());
    assert!(!dir.path().join("moved_duplicates_log.csv").exists());
    assert!(quarantine.join("photos/a - Copy.jpg").exists());
}

#[test]
fn test_mirror_restore_skips_newer() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let quarantine = quarantine_all(dir.path());

    let newer = dir.path().join("docs/old/report (2).pdf");
    fs::write(&newer, "rewritten").unwrap();
    let future = SystemTime::now() + Duration::from_secs(600);
    filetime::set_file_mtime(&newer, FileTime::from_system_time(future)).unwrap();

    let summary = mirror_restore(&quarantine, dir.path()).unwrap();

    assert_eq!(summary.skipped_count(), 1);
    assert_eq!(fs::read_to_string(&newer).unwrap(), "rewritten");
}

#[test]
fn test_retry_after_partial_replay_finishes() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let quarantine = quarantine_all(dir.path());

    let blocker = dir.path().join("photos/a - Copy.jpg");
    fs::write(&blocker, "edited after quarantine").unwrap();
    let future = SystemTime::now() + Duration::from_secs(3600);
    filetime::set_file_mtime(&blocker, FileTime::from_system_time(future)).unwrap();

    let first = restore_quarantine(&quarantine, RestoreOptions::default()).unwrap();
    assert_eq!(first.restored_count(), 2);
    assert_eq!(first.skipped_count(), 1);
    let left = MoveLog::in_quarantine(&quarantine).read().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].source, blocker);

    fs::remove_file(&blocker).unwrap();
    let retry = restore_quarantine(&quarantine, RestoreOptions::default()).unwrap();

    assert_eq!(retry.restored_count(), 1);
    assert_eq!(retry.skipped_count(), 0);
    assert!(retry.is_complete_success());
    assert!(retry.log_consumed);
    assert!(!MoveLog::in_quarantine(&quarantine).exists());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "jpeg bytes");
}
