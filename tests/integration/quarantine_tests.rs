use dupedoctor::actions::{
    MoveLog, MoveMode, MoveProgressCallback, MoveSummary, QuarantineConfig, QuarantineMover,
    LOG_FILE_NAME,
};
use dupedoctor::duplicates::{DuplicateFinder, DuplicateGroup};
use dupedoctor::signal::CancelToken;
use filetime::FileTime;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn tree(files: &[(&str, &str)]) -> (TempDir, Vec<DuplicateGroup>) {
    let dir = tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
    }
    let groups = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap()
        .groups;
    (dir, groups)
}

struct CancelAfter {
    token: CancelToken,
    after: usize,
    done: AtomicUsize,
}

impl MoveProgressCallback for CancelAfter {
    fn on_before_move(&self, _path: &Path, _index: usize, _total: usize) {}

    fn on_move_success(&self, _path: &Path, _size: u64) {
        if self.done.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
            self.token.cancel();
        }
    }

    fn on_move_failure(&self, _path: &Path, _error: &str) {}

    fn on_complete(&self, _summary: &MoveSummary) {}
}

#[test]
fn test_dry_run_touches_nothing() {
    let (dir, groups) = tree(&[("a.txt", "x"), ("sub/a - Copy.txt", "x")]);
    let mover = QuarantineMover::new(dir.path(), QuarantineConfig::default());

    let summary = mover.run(&groups, None);

    assert_eq!(summary.mode, MoveMode::DryRun);
    assert_eq!(summary.success_count(), 1);
    assert_eq!(
        summary.entries[0].destination,
        mover.layout().quarantine_root().join("sub/a - Copy.txt")
    );
    assert!(dir.path().join("sub/a - Copy.txt").exists());
    assert!(!mover.layout().quarantine_root().exists());
    assert!(summary.log_path.is_none());
}

#[test]
fn test_move_mirrors_relative_paths_and_logs() {
    let (dir, groups) = tree(&[
        ("a.txt", "one"),
        ("deep/er/a - Copy.txt", "one"),
        ("b.txt", "two"),
        ("b (2).txt", "two"),
    ]);
    let mover = QuarantineMover::new(dir.path(), QuarantineConfig::new(MoveMode::Move));
    let quarantine = mover.layout().quarantine_root().to_path_buf();

    let summary = mover.run(&groups, None);

    assert!(summary.all_succeeded());
    assert_eq!(summary.success_count(), 2);
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
    assert!(!dir.path().join("deep/er/a - Copy.txt").exists());
    assert_eq!(
        fs::read_to_string(quarantine.join("deep/er/a - Copy.txt")).unwrap(),
        "one"
    );
    assert!(quarantine.join("b (2).txt").exists());

    let entries = MoveLog::in_quarantine(&quarantine).read().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.destination.starts_with(&quarantine)));
    assert_eq!(summary.log_path, Some(quarantine.join(LOG_FILE_NAME)));
}

#[test]
fn test_copy_keeps_source_and_mtime() {
    let (dir, _) = tree(&[("a.txt", "z"), ("a - Copy.txt", "z")]);
    let old = FileTime::from_unix_time(1_500_000_000, 0);
    filetime::set_file_mtime(dir.path().join("a - Copy.txt"), old).unwrap();
    let groups = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap()
        .groups;

    let mover = QuarantineMover::new(dir.path(), QuarantineConfig::new(MoveMode::Copy));
    let summary = mover.run(&groups, None);

    assert_eq!(summary.success_count(), 1);
    let copy = mover.layout().quarantine_root().join("a - Copy.txt");
    assert!(dir.path().join("a - Copy.txt").exists());
    let meta = fs::metadata(&copy).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&meta), old);
}

#[test]
fn test_cancel_after_three_of_ten() {
    let files: Vec<(String, &str)> = (0..11).map(|i| (format!("f{i:02}.dat"), "dup")).collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), *c)).collect();
    let (dir, groups) = tree(&refs);
    assert_eq!(groups[0].candidates().count(), 10);

    let token = CancelToken::new();
    let callback = CancelAfter {
        token: token.clone(),
        after: 3,
        done: AtomicUsize::new(0),
    };
    let mover = QuarantineMover::new(
        dir.path(),
        QuarantineConfig::new(MoveMode::Move).with_cancel_token(token),
    );
    let quarantine = mover.layout().quarantine_root().to_path_buf();

    let summary = mover.run(&groups, Some(&callback));

    assert!(summary.cancelled);
    assert_eq!(summary.skipped, 7);
    assert_eq!(MoveLog::in_quarantine(&quarantine).read().unwrap().len(), 3);
    let still_at_source = groups[0]
        .candidates()
        .filter(|f| f.path.exists())
        .count();
    assert_eq!(still_at_source, 7);
}

#[test]
fn test_background_mover_with_progress() {
    let (dir, groups) = tree(&[("a.txt", "q"), ("aa.txt", "q"), ("aaa.txt", "q")]);
    let mover = QuarantineMover::new(dir.path(), QuarantineConfig::new(MoveMode::Move));
    let progress: Arc<dyn MoveProgressCallback> =
        Arc::new(dupedoctor::progress::Progress::new(true));

    let handle = mover.spawn(groups, Some(progress)).unwrap();
    let summary = handle.join().unwrap();

    assert_eq!(summary.success_count(), 2);
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("aa.txt").exists());
}

#[test]
fn test_rerun_does_not_overwrite_quarantine() {
    let (dir, groups) = tree(&[("a.txt", "1"), ("a - Copy.txt", "1")]);
    let config = QuarantineConfig::new(MoveMode::Copy);

    let first = QuarantineMover::new(dir.path(), config.clone()).run(&groups, None);
    assert!(first.all_succeeded());

    let second = QuarantineMover::new(dir.path(), config).run(&groups, None);
    assert_eq!(second.failed, 1);
    assert_eq!(second.success_count(), 0);
}

#[test]
fn test_custom_quarantine_dir() {
    let (dir, groups) = tree(&[("src/a.txt", "k"), ("src/b/a.txt", "k")]);
    let target = dir.path().join("elsewhere");
    let mover = QuarantineMover::new(
        &dir.path().join("src"),
        QuarantineConfig::new(MoveMode::Move).with_quarantine_dir(&target),
    );

    let summary = mover.run(&groups, None);

    assert_eq!(summary.success_count(), 1);
    assert!(target.join(LOG_FILE_NAME).exists());
}
