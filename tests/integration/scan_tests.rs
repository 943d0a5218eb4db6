use dupedoctor::duplicates::{
    Composite, CriteriaSet, Criterion, DuplicateFinder, FinderConfig, SizeExtension,
};
use dupedoctor::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn metadata_finder() -> DuplicateFinder {
    DuplicateFinder::new(
        FinderConfig::default().with_strategy(Arc::new(Composite::name_size_extension())),
    )
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(report.groups.is_empty());
    assert!(report.files.is_empty());
    assert_eq!(report.summary.total_files, 0);
    assert_eq!(report.summary.duplicate_groups, 0);
}

#[test]
fn test_copy_names_group_under_both_strategies() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", "same bytes");
    write(dir.path(), "a - Copy.txt", "same bytes");
    write(dir.path(), "a (1).txt", "same bytes");

    for finder in [DuplicateFinder::with_defaults(), metadata_finder()] {
        let report = finder.find_duplicates(dir.path()).unwrap();
        assert_eq!(report.groups.len(), 1);
        let group = &report.groups[0];
        assert_eq!(group.len(), 3);
        assert_eq!(group.canonical().name, "a.txt");
        assert_eq!(group.candidates().count(), 2);
        assert_eq!(report.summary.duplicate_files, 2);
    }
}

#[test]
fn test_size_extension_false_positive() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one.log", "abcd");
    write(dir.path(), "two.log", "wxyz");

    let by_size = DuplicateFinder::new(
        FinderConfig::default().with_strategy(Arc::new(SizeExtension)),
    )
    .find_duplicates(dir.path())
    .unwrap();
    assert_eq!(by_size.groups.len(), 1);

    let by_content = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(by_content.groups.is_empty());
}

#[test]
fn test_content_hash_ignores_names() {
    let dir = tempdir().unwrap();
    write(dir.path(), "x/report.pdf", "payload");
    write(dir.path(), "y/scan-0001.pdf", "payload");
    write(dir.path(), "y/report.pdf", "other payload");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(report.groups.len(), 1);
    let names: Vec<_> = report.groups[0].files().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["report.pdf", "scan-0001.pdf"]);
}

#[test]
fn test_excluded_extension_never_grouped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.py", "print()");
    write(dir.path(), "b.py", "print()");
    write(dir.path(), "a.txt", "notes");
    write(dir.path(), "b.txt", "notes");

    let walker = WalkerConfig::default().with_exclude_extensions([".PY"]);
    let strategies: Vec<Arc<dyn dupedoctor::duplicates::Fingerprint>> = vec![
        Arc::new(dupedoctor::duplicates::ContentHash::new()),
        Arc::new(SizeExtension),
        Arc::new(Composite::name_size_extension()),
    ];

    for strategy in strategies {
        let report = DuplicateFinder::new(
            FinderConfig::default()
                .with_walker_config(walker.clone())
                .with_strategy(strategy),
        )
        .find_duplicates(dir.path())
        .unwrap();

        assert!(report.files.iter().all(|f| f.extension != "py"));
        assert!(report
            .groups
            .iter()
            .flat_map(|g| g.files())
            .all(|f| f.extension != "py"));
    }
}

#[test]
fn test_include_extensions_restrict_walk() {
    let dir = tempdir().unwrap();
    write(dir.path(), "p1.JPG", "img");
    write(dir.path(), "p2.jpg", "img");
    write(dir.path(), "d1.txt", "img");

    let report = DuplicateFinder::new(
        FinderConfig::default()
            .with_walker_config(WalkerConfig::default().with_include_extensions(["jpg"])),
    )
    .find_duplicates(dir.path())
    .unwrap();

    assert_eq!(report.summary.total_files, 2);
    assert_eq!(report.groups.len(), 1);
}

#[test]
fn test_metadata_criteria_modified_time() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", "1");
    write(dir.path(), "b.bin", "22");
    let stamp = filetime::FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(dir.path().join("a.bin"), stamp).unwrap();
    filetime::set_file_mtime(dir.path().join("b.bin"), stamp).unwrap();

    let strategy =
        Composite::new(CriteriaSet::from_criteria([Criterion::Modified])).unwrap();
    let report = DuplicateFinder::new(FinderConfig::default().with_strategy(Arc::new(strategy)))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_quarantine_subtree_excluded() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", "dup");
    write(dir.path(), "_q/a.txt", "dup");

    let report = DuplicateFinder::new(
        FinderConfig::default()
            .with_walker_config(WalkerConfig::default().with_excluded_dir(dir.path().join("_q"))),
    )
    .find_duplicates(dir.path())
    .unwrap();

    assert_eq!(report.summary.total_files, 1);
    assert!(report.groups.is_empty());
}

#[test]
fn test_empty_files_are_duplicates_of_each_other() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", "");
    write(dir.path(), "empty2", "");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.summary.reclaimable_space, 0);
}

#[test]
fn test_repeated_scans_are_identical() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        write(dir.path(), &format!("d{i}/same.dat"), "content");
    }

    let first = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let second = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(first.groups[0].paths(), second.groups[0].paths());
    assert_eq!(
        first.groups[0].canonical().path,
        second.groups[0].canonical().path
    );
}
