// tests/config_loading.rs

mod common;
use crate::common::TestResult;

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;

use procrunner::config::{Environment, RawSettings, Settings, load_with_env};
use procrunner::errors::RunnerError;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn settings_file(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[test]
fn test_development_profile_defaults() -> TestResult {
    let file = settings_file("")?;
    let settings = load_with_env(Some(file.path()), env_from(&[]))?;

    assert_eq!(settings.environment, Environment::Development);
    assert!(settings.debug);
    assert_eq!(settings.timeout, None);
    assert_eq!(settings.grace_period, Duration::from_secs(10));
    assert_eq!(settings.temp_workdir, Some(PathBuf::from("temp")));
    assert_eq!(settings.queue.workers, 1);
    Ok(())
}

#[test]
fn test_production_profile_from_env() -> TestResult {
    let file = settings_file("")?;
    let settings = load_with_env(
        Some(file.path()),
        env_from(&[("PROCRUNNER_ENVIRONMENT", "production")]),
    )?;

    assert_eq!(settings.environment, Environment::Production);
    assert!(!settings.debug);
    assert_eq!(settings.temp_workdir, None);
    Ok(())
}

#[test]
fn test_file_values_are_applied() -> TestResult {
    let file = settings_file(
        r#"
timeout_sec = 2.5
grace_period_sec = 1
log_level = "debug"
unrelated_key = "ignored"

[queue]
workers = 4
capacity = 8
"#,
    )?;

    let settings = load_with_env(Some(file.path()), env_from(&[("PROCRUNNER_ENVIRONMENT", "TEST")]))?;

    assert_eq!(settings.timeout, Some(Duration::from_millis(2500)));
    assert_eq!(settings.grace_period, Duration::from_secs(1));
    assert_eq!(settings.log_level, Some(tracing::Level::DEBUG));
    assert_eq!(settings.queue.workers, 4);
    assert_eq!(settings.queue.capacity, 8);
    Ok(())
}

#[test]
fn test_env_overrides_beat_file() -> TestResult {
    let file = settings_file("timeout_sec = 30\n[queue]\nworkers = 2\n")?;
    let settings = load_with_env(
        Some(file.path()),
        env_from(&[
            ("PROCRUNNER_TIMEOUT_SEC", "5"),
            ("PROCRUNNER_WORKERS", "6"),
            ("PROCRUNNER_LOG_LEVEL", "20"),
        ]),
    )?;

    assert_eq!(settings.timeout, Some(Duration::from_secs(5)));
    assert_eq!(settings.queue.workers, 6);
    assert_eq!(settings.log_level, Some(tracing::Level::INFO));
    Ok(())
}

#[test]
fn test_zero_or_none_timeout_means_no_timeout() -> TestResult {
    let file = settings_file("timeout_sec = 0\n")?;
    let settings = load_with_env(Some(file.path()), env_from(&[]))?;
    assert_eq!(settings.timeout, None);

    let file = settings_file("timeout_sec = 30\n")?;
    let settings = load_with_env(Some(file.path()), env_from(&[("PROCRUNNER_TIMEOUT_SEC", "none")]))?;
    assert_eq!(settings.timeout, None);
    Ok(())
}

#[test]
fn test_invalid_environment_is_rejected() {
    let result = load_with_env(None, env_from(&[("PROCRUNNER_ENVIRONMENT", "STAGING")]));

    match result {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("STAGING")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_negative_timeout_is_rejected() -> TestResult {
    let file = settings_file("timeout_sec = -1\n")?;
    let result = load_with_env(Some(file.path()), env_from(&[]));

    match result {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("timeout_sec")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_zero_workers_is_rejected() -> TestResult {
    let file = settings_file("[queue]\nworkers = 0\n")?;
    let result = load_with_env(Some(file.path()), env_from(&[]));

    match result {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("workers")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_bad_env_number_is_rejected() {
    let result = load_with_env(None, env_from(&[("PROCRUNNER_GRACE_PERIOD_SEC", "soon")]));

    match result {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("PROCRUNNER_GRACE_PERIOD_SEC")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_invalid_log_level_is_rejected() -> TestResult {
    let file = settings_file("log_level = \"loud\"\n")?;
    let result = load_with_env(Some(file.path()), env_from(&[]));
    assert!(matches!(result, Err(RunnerError::ConfigError(_))), "got {result:?}");
    Ok(())
}

#[test]
fn test_missing_explicit_file_is_an_io_error() {
    let result = load_with_env(Some(std::path::Path::new("/definitely/not/here.toml")), env_from(&[]));
    assert!(matches!(result, Err(RunnerError::IoError(_))), "got {result:?}");
}

#[test]
fn test_malformed_toml_is_a_toml_error() -> TestResult {
    let file = settings_file("timeout_sec = [not toml")?;
    let result = load_with_env(Some(file.path()), env_from(&[]));
    assert!(matches!(result, Err(RunnerError::TomlError(_))), "got {result:?}");
    Ok(())
}

#[test]
fn test_settings_build_command_specs() -> TestResult {
    let mut raw = RawSettings::profile(Environment::Test);
    raw.timeout_sec = Some(3.0);
    raw.grace_period_sec = Some(0.5);
    let settings = Settings::try_from(raw)?;

    let spec = settings.command(["echo", "hi"]);
    assert_eq!(spec.argv, vec!["echo", "hi"]);
    assert_eq!(spec.timeout, Some(Duration::from_secs(3)));
    assert_eq!(spec.grace_period, Duration::from_millis(500));
    Ok(())
}

#[test]
fn test_environment_parsing_is_case_insensitive() {
    assert_eq!("test".parse::<Environment>(), Ok(Environment::Test));
    assert_eq!(" Production ".parse::<Environment>(), Ok(Environment::Production));
    assert!("dev".parse::<Environment>().is_err());
}
