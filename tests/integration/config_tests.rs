use dupedoctor::actions::MoveMode;
use dupedoctor::config::{ConfigError, Settings, SettingsOverrides};
use dupedoctor::duplicates::{Criterion, DuplicateFinder, FinderConfig, FinderError, StrategyKind};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Settings::default()));
    let settings: Settings = figment.extract().unwrap();
    assert_eq!(settings.strategy, StrategyKind::ContentHash);
    assert_eq!(
        settings.criteria,
        vec![Criterion::Name, Criterion::Size, Criterion::Extension]
    );
    assert_eq!(settings.mode, MoveMode::DryRun);
    assert!(settings.quarantine_dir.is_none());
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("DUPEDOCTOR_EXCLUDE_EXTENSIONS", "[BAK, tmp]");

    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Env::prefixed("DUPEDOCTOR_"));
    let settings: Settings = figment.extract().unwrap();

    std::env::remove_var("DUPEDOCTOR_EXCLUDE_EXTENSIONS");

    let settings = settings.normalized().unwrap();
    assert_eq!(settings.exclude_extensions, vec!["bak", "tmp"]);
}

#[test]
fn test_env_lists_accept_commas() {
    // Own prefix so parallel tests loading DUPEDOCTOR_* never see it.
    std::env::set_var("DUPEDOCTOR_LISTTEST_EXCLUDE_EXTENSIONS", "py,pyc");
    std::env::set_var("DUPEDOCTOR_LISTTEST_INCLUDE_EXTENSIONS", "JPG");

    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Env::prefixed("DUPEDOCTOR_LISTTEST_"));
    let settings: Result<Settings, _> = figment.extract();

    std::env::remove_var("DUPEDOCTOR_LISTTEST_EXCLUDE_EXTENSIONS");
    std::env::remove_var("DUPEDOCTOR_LISTTEST_INCLUDE_EXTENSIONS");

    let settings = settings.unwrap().normalized().unwrap();
    assert_eq!(settings.exclude_extensions, vec!["py", "pyc"]);
    assert_eq!(settings.include_extensions, vec!["jpg"]);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
strategy = "size-extension"
include_extensions = ["JPG", "png"]
mode = "move"
quarantine_dir = "/srv/quarantine"
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(&config_path), &SettingsOverrides::default()).unwrap();

    assert_eq!(settings.strategy, StrategyKind::SizeExtension);
    assert_eq!(settings.include_extensions, vec!["jpg", "png"]);
    assert_eq!(settings.mode, MoveMode::Move);
    assert_eq!(
        settings.quarantine_dir.as_deref(),
        Some(std::path::Path::new("/srv/quarantine"))
    );
}

#[test]
fn test_cli_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "strategy = \"size-extension\"\nmode = \"move\"\n").unwrap();

    let overrides = SettingsOverrides {
        strategy: Some(StrategyKind::Metadata),
        criteria: Some(vec![Criterion::Name]),
        ..Default::default()
    };
    let settings = Settings::load(Some(&config_path), &overrides).unwrap();

    assert_eq!(settings.strategy, StrategyKind::Metadata);
    assert_eq!(settings.criteria, vec![Criterion::Name]);
    assert_eq!(settings.mode, MoveMode::Move);
}

#[test]
fn test_empty_criteria_is_invalid() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "strategy = \"metadata\"\ncriteria = []\n").unwrap();

    let result = Settings::load(Some(&config_path), &SettingsOverrides::default());
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_empty_criteria_rejected_before_scan() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        strategy: StrategyKind::Metadata,
        criteria: Vec::new(),
        ..Default::default()
    };

    let err = match settings.fingerprint() {
        Err(e) => e,
        Ok(_) => panic!("empty criteria must not build a strategy"),
    };
    assert!(matches!(err, FinderError::InvalidConfiguration(_)));

    // A valid strategy scans the same directory fine.
    let strategy = Settings::default().fingerprint().unwrap();
    let report = DuplicateFinder::new(FinderConfig::default().with_strategy(strategy))
        .find_duplicates(dir.path())
        .unwrap();
    assert!(report.groups.is_empty());
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "strategy = [").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(&config_path));
    let result: Result<Settings, _> = figment.extract();
    assert!(result.is_err());
}

#[test]
fn test_rendered_toml_loads_back() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let settings = Settings {
        strategy: StrategyKind::Metadata,
        criteria: vec![Criterion::Size, Criterion::Modified],
        mode: MoveMode::Copy,
        ..Default::default()
    };
    fs::write(&config_path, settings.to_toml().unwrap()).unwrap();

    let loaded = Settings::load(Some(&config_path), &SettingsOverrides::default()).unwrap();
    assert_eq!(loaded.strategy, settings.strategy);
    assert_eq!(loaded.criteria, settings.criteria);
    assert_eq!(loaded.mode, settings.mode);
}
