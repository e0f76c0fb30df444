// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawQueueSection, RawSettings, Settings};
use crate::config::types::Environment;
use crate::errors::{Result, RunnerError};

pub const ENVIRONMENT_VAR: &str = "PROCRUNNER_ENVIRONMENT";

/// Read a settings file and return the raw, unvalidated layer.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawSettings = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load settings from the process environment.
///
/// See [`load_with_env`] for the layering rules.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    load_with_env(path, |key| std::env::var(key).ok())
}

/// Load settings using `env` to look up environment variables.
///
/// Layers, lowest precedence first:
/// 1. profile defaults for `PROCRUNNER_ENVIRONMENT` (default `DEVELOPMENT`);
/// 2. the TOML file: `path` if given (must exist), otherwise
///    [`default_settings_path`] if it exists;
/// 3. `PROCRUNNER_*` variables.
pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let environment = match env(ENVIRONMENT_VAR) {
        Some(s) => s.parse::<Environment>().map_err(RunnerError::ConfigError)?,
        None => Environment::default(),
    };

    let file = match path {
        Some(p) => load_from_path(p)?,
        None => {
            let default = default_settings_path();
            if default.is_file() {
                load_from_path(&default)?
            } else {
                RawSettings::default()
            }
        }
    };

    let raw = RawSettings::profile(environment)
        .merge(file)
        .merge(env_layer(&env)?);

    Settings::try_from(raw)
}

/// `procrunner.toml` in the current working directory.
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("procrunner.toml")
}

fn env_layer<F>(env: &F) -> Result<RawSettings>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(RawSettings {
        environment: None,
        debug: parse_var(env, "PROCRUNNER_DEBUG")?,
        timeout_sec: parse_timeout_var(env, "PROCRUNNER_TIMEOUT_SEC")?,
        grace_period_sec: parse_var(env, "PROCRUNNER_GRACE_PERIOD_SEC")?,
        kill_wait_sec: parse_var(env, "PROCRUNNER_KILL_WAIT_SEC")?,
        temp_workdir: env("PROCRUNNER_TEMP_WORKDIR").map(PathBuf::from),
        log_level: env("PROCRUNNER_LOG_LEVEL"),
        queue: RawQueueSection {
            workers: parse_var(env, "PROCRUNNER_WORKERS")?,
            capacity: parse_var(env, "PROCRUNNER_QUEUE_CAPACITY")?,
        },
    })
}

fn parse_var<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env(key) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RunnerError::ConfigError(format!("invalid {key}='{s}': {e}"))),
    }
}

/// Like [`parse_var`], but an empty value or `none` means "no timeout".
fn parse_timeout_var<F>(env: &F, key: &str) -> Result<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    match env(key) {
        Some(s) if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("none") => Ok(Some(0.0)),
        _ => parse_var(env, key),
    }
}
