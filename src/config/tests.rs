use std::io::Write;

use serial_test::serial;

use super::*;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    file.write_all(contents.as_bytes())
        .expect("write temp config");
    file
}

#[test]
fn defaults_apply_when_nothing_is_configured() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.capacity.get(), DEFAULT_CACHE_CAPACITY);
}

#[test]
fn json_logging_selects_json_format() {
    let mut raw = RawSettings::default();
    raw.logging.json = Some(true);
    raw.logging.level = Some("debug".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(matches!(settings.logging.format, LogFormat::Json));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn zero_cache_capacity_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.capacity = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero capacity");
    assert!(matches!(err, LoadError::Invalid { key: "cache.capacity", .. }));
}

#[test]
#[serial]
fn explicit_file_is_loaded() {
    let file = write_config(
        r#"
[logging]
level = "warn"

[cache]
enabled = false
capacity = 16
"#,
    );

    let settings = load(Some(file.path())).expect("settings from file");
    assert_eq!(settings.logging.level, LevelFilter::WARN);
    assert!(!settings.cache.enabled);
    assert_eq!(settings.cache.capacity.get(), 16);
}

#[test]
#[serial]
fn missing_explicit_file_is_an_error() {
    let err = load(Some(Path::new("/definitely/not/here/worker-cookies.toml")))
        .expect_err("missing file");
    assert!(matches!(err, LoadError::Build(_)));
}

#[test]
#[serial]
fn environment_overrides_file() {
    let file = write_config(
        r#"
[cache]
capacity = 16
"#,
    );

    // SAFETY: serialized with every other test that touches the environment.
    unsafe { std::env::set_var("WORKER_COOKIES__CACHE__CAPACITY", "64") };
    let result = load(Some(file.path()));
    unsafe { std::env::remove_var("WORKER_COOKIES__CACHE__CAPACITY") };

    let settings = result.expect("settings from file and env");
    assert_eq!(settings.cache.capacity.get(), 64);
}
