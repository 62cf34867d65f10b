use std::io::Write;

use tracing::level_filters::LevelFilter;
use worker_cookies::config;
use worker_cookies::infra::error::InfraError;
use worker_cookies::infra::telemetry;

#[test]
fn subscriber_installs_once_from_loaded_settings() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    file.write_all(b"[logging]\nlevel = \"debug\"\njson = true\n")
        .expect("write temp config");

    let settings = config::load(Some(file.path())).expect("settings from file");
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);

    telemetry::init(&settings.logging).expect("first init installs the subscriber");
    tracing::debug!(worker = "w1", "emitted through the installed subscriber");

    let err = telemetry::init(&settings.logging).expect_err("second init is rejected");
    assert!(matches!(err, InfraError::Telemetry(_)));
}
