// src/config/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Deployment profile selected through `PROCRUNNER_ENVIRONMENT`.
///
/// - `Development` (default): debug on, scratch work directory `temp/`.
/// - `Production`: debug off.
/// - `Test`: debug off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Test,
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TEST" => Ok(Environment::Test),
            "DEVELOPMENT" => Ok(Environment::Development),
            "PRODUCTION" => Ok(Environment::Production),
            other => Err(format!(
                "invalid environment: {other} (expected TEST, DEVELOPMENT or PRODUCTION)"
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Test => "TEST",
            Environment::Development => "DEVELOPMENT",
            Environment::Production => "PRODUCTION",
        };
        f.write_str(name)
    }
}
