//! Runtime configuration from defaults, environment, or a JSON file.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::events::MAX_EVENT_CAPACITY;
use crate::identity::CallBudget;

pub const ENV_CALL_TIMEOUT_MS: &str = "ESIGN_CALL_TIMEOUT_MS";
pub const ENV_CALL_FUEL: &str = "ESIGN_CALL_FUEL";
pub const ENV_EVENT_CAPACITY: &str = "ESIGN_EVENT_CAPACITY";
pub const ENV_LOG_DIR: &str = "ESIGN_LOG_DIR";
pub const ENV_JSON_LOGS: &str = "ESIGN_JSON_LOGS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Wall-clock limit for a single identity call.
    pub call_timeout_ms: u64,
    /// Fuel granted to a single identity call.
    pub call_fuel: u64,
    /// Events retained in memory by the journal.
    pub event_capacity: usize,
    pub log_dir: String,
    pub json_logs: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            call_timeout_ms: 250,
            call_fuel: 1_000,
            event_capacity: 1_024,
            log_dir: "logs".to_string(),
            json_logs: false,
        }
    }
}

impl RegistryConfig {
    /// Defaults overridden by any `ESIGN_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = RegistryConfig::default();
        if let Some(v) = parse_var(&lookup, ENV_CALL_TIMEOUT_MS)? {
            config.call_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_CALL_FUEL)? {
            config.call_fuel = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_EVENT_CAPACITY)? {
            config.event_capacity = v;
        }
        if let Some(v) = lookup(ENV_LOG_DIR) {
            config.log_dir = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_JSON_LOGS)? {
            config.json_logs = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: RegistryConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects an event capacity the journal could not allocate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = MAX_EVENT_CAPACITY as u64;
        let value = u64::try_from(self.event_capacity).unwrap_or(u64::MAX);
        if !(1..=max).contains(&value) {
            return Err(ConfigError::OutOfRange {
                field: "event_capacity",
                value,
                min: 1,
                max,
            });
        }
        Ok(())
    }

    pub fn call_budget(&self) -> CallBudget {
        CallBudget {
            timeout: Duration::from_millis(self.call_timeout_ms),
            fuel: self.call_fuel,
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}
