// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{QueueSettings, RawSettings, Settings};
use crate::errors::{Result, RunnerError};
use crate::exec::{DEFAULT_GRACE_PERIOD, DEFAULT_KILL_WAIT};
use crate::logging::parse_level_str;

impl TryFrom<RawSettings> for Settings {
    type Error = RunnerError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        let timeout = validate_timeout(raw.timeout_sec)?;
        let grace_period = validate_grace_period(raw.grace_period_sec)?;
        let kill_wait = validate_kill_wait(raw.kill_wait_sec)?;
        let log_level = validate_log_level(raw.log_level.as_deref())?;
        let queue = validate_queue(&raw)?;

        Ok(Settings {
            environment: raw.environment.unwrap_or_default(),
            debug: raw.debug.unwrap_or(false),
            timeout,
            grace_period,
            kill_wait,
            temp_workdir: raw.temp_workdir,
            log_level,
            queue,
        })
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| RunnerError::ConfigError(format!("{name} must be a finite number >= 0 (got {value})")))
}

fn validate_timeout(value: Option<f64>) -> Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(v) if v == 0.0 => Ok(None),
        Some(v) => seconds("timeout_sec", v).map(Some),
    }
}

fn validate_grace_period(value: Option<f64>) -> Result<Duration> {
    value.map_or(Ok(DEFAULT_GRACE_PERIOD), |v| seconds("grace_period_sec", v))
}

fn validate_kill_wait(value: Option<f64>) -> Result<Duration> {
    let Some(v) = value else {
        return Ok(DEFAULT_KILL_WAIT);
    };
    let wait = seconds("kill_wait_sec", v)?;
    if wait.is_zero() {
        return Err(RunnerError::ConfigError(
            "kill_wait_sec must be > 0 (got 0)".to_string(),
        ));
    }
    Ok(wait)
}

fn validate_log_level(value: Option<&str>) -> Result<Option<tracing::Level>> {
    match value {
        None => Ok(None),
        Some(s) => parse_level_str(s).map(Some).ok_or_else(|| {
            RunnerError::ConfigError(format!(
                "invalid log_level '{s}' (expected error, warn, info, debug or trace)"
            ))
        }),
    }
}

fn validate_queue(raw: &RawSettings) -> Result<QueueSettings> {
    let defaults = QueueSettings::default();
    let workers = raw.queue.workers.unwrap_or(defaults.workers);
    let capacity = raw.queue.capacity.unwrap_or(defaults.capacity);

    if workers == 0 {
        return Err(RunnerError::ConfigError(
            "[queue].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    if capacity == 0 {
        return Err(RunnerError::ConfigError(
            "[queue].capacity must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(QueueSettings { workers, capacity })
}
