//! Operator configuration
//!
//! Loaded from a JSON settings file with camelCase keys, then overlaid with
//! `SWAN_*` environment variables, then validated. Missing or zero numeric
//! settings fall back to their defaults.

use crate::errors::{Result, SwanError};
use crate::types::offset;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default revalidation interval: one hour
pub const DEFAULT_REVALIDATE_SECONDS: u64 = 3600;

/// Default retention period in days
pub const DEFAULT_DELETE_DAYS: u32 = 90;

/// Default lifetime of storage results handed back to the engine
pub const DEFAULT_RESULTS_TTL_SECONDS: u64 = 300;

/// Longest retention period accepted: one hundred years
pub const MAX_DELETE_DAYS: u32 = 36_500;

/// Longest revalidation interval accepted: the longest retention period
pub const MAX_REVALIDATE_SECONDS: u64 = MAX_DELETE_DAYS as u64 * 24 * 3600;

/// Longest lifetime of storage results accepted: one day
pub const MAX_RESULTS_TTL_SECONDS: u64 = 24 * 3600;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "SWAN_";

/// Whether inbound and stored signatures are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMode {
    /// Every signature must verify against a trusted domain
    Strict,
    /// Trusted local testing: signatures are not checked
    Debug,
}

impl VerificationMode {
    /// Whether signatures must be checked
    pub fn is_strict(&self) -> bool {
        matches!(self, VerificationMode::Strict)
    }
}

/// Values passed through unchanged to the editing user interface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiOptions {
    /// Page title
    pub title: String,
    /// Message shown while an operation progresses
    pub message: String,
    /// Page background colour
    pub background_color: String,
    /// Message text colour
    pub message_color: String,
    /// Progress indicator colour
    pub progress_color: String,
}

/// Operator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorConfig {
    /// Seconds until a caller should revalidate returned data
    pub revalidate_seconds: u64,
    /// Days after which data is removed from the network
    pub delete_days: u32,
    /// Trusted local testing; disables signature verification
    pub debug: bool,
    /// URL scheme of the operator, `http` or `https`
    pub scheme: String,
    /// Seconds storage results remain usable after an operation
    pub results_ttl_seconds: u64,
    /// Page title shown by the user interface
    pub title: String,
    /// Progress message shown by the user interface
    pub message: String,
    /// Background colour used by the user interface
    pub background_color: String,
    /// Message colour used by the user interface
    pub message_color: String,
    /// Progress colour used by the user interface
    pub progress_color: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            revalidate_seconds: DEFAULT_REVALIDATE_SECONDS,
            delete_days: DEFAULT_DELETE_DAYS,
            debug: false,
            scheme: "https".to_string(),
            results_ttl_seconds: DEFAULT_RESULTS_TTL_SECONDS,
            title: String::new(),
            message: String::new(),
            background_color: String::new(),
            message_color: String::new(),
            progress_color: String::new(),
        }
    }
}

impl OperatorConfig {
    /// Parse settings from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(text)
            .map_err(|e| SwanError::invalid(format!("Invalid JSON: {e}")))?;
        config.apply_defaults();
        Ok(config)
    }

    /// Load settings from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SwanError::internal(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Overlay `SWAN_*` environment variables from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Overlay `SWAN_*` variables from the given iterator.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "REVALIDATE_SECONDS" => self.revalidate_seconds = parse_var(&key, &value)?,
                "DELETE_DAYS" => self.delete_days = parse_var(&key, &value)?,
                "RESULTS_TTL_SECONDS" => self.results_ttl_seconds = parse_var(&key, &value)?,
                "DEBUG" => self.debug = parse_var(&key, &value)?,
                "SCHEME" => self.scheme = value,
                _ => tracing::debug!(variable = %key, "ignoring unknown setting"),
            }
        }
        self.apply_defaults();
        Ok(())
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<()> {
        check_range("deleteDays", u64::from(self.delete_days), u64::from(MAX_DELETE_DAYS))?;
        check_range(
            "revalidateSeconds",
            self.revalidate_seconds,
            MAX_REVALIDATE_SECONDS,
        )?;
        check_range(
            "resultsTtlSeconds",
            self.results_ttl_seconds,
            MAX_RESULTS_TTL_SECONDS,
        )?;
        if self.scheme != "http" && self.scheme != "https" {
            return Err(SwanError::invalid(format!(
                "scheme must be http or https, not '{}'",
                self.scheme
            )));
        }
        Ok(())
    }

    fn apply_defaults(&mut self) {
        if self.delete_days == 0 {
            self.delete_days = DEFAULT_DELETE_DAYS;
        }
        if self.revalidate_seconds == 0 {
            self.revalidate_seconds = DEFAULT_REVALIDATE_SECONDS;
        }
        if self.results_ttl_seconds == 0 {
            self.results_ttl_seconds = DEFAULT_RESULTS_TTL_SECONDS;
        }
    }

    /// Revalidation interval
    pub fn revalidate_duration(&self) -> Duration {
        seconds(self.revalidate_seconds)
    }

    /// Retention period
    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.delete_days))
    }

    /// Lifetime of storage results
    pub fn results_ttl(&self) -> Duration {
        seconds(self.results_ttl_seconds)
    }

    /// When data written at `now` will be removed from the network.
    pub fn delete_date(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        offset(now, self.retention())
    }

    /// Signature verification mode implied by `debug`
    pub fn verification_mode(&self) -> VerificationMode {
        if self.debug {
            VerificationMode::Debug
        } else {
            VerificationMode::Strict
        }
    }

    /// Values passed through to the editing user interface
    pub fn ui_options(&self) -> UiOptions {
        UiOptions {
            title: self.title.clone(),
            message: self.message.clone(),
            background_color: self.background_color.clone(),
            message_color: self.message_color.clone(),
            progress_color: self.progress_color.clone(),
        }
    }
}

fn check_range(name: &str, value: u64, max: u64) -> Result<()> {
    if value == 0 {
        return Err(SwanError::invalid(format!("{name} must be at least 1")));
    }
    if value > max {
        return Err(SwanError::invalid(format!("{name} must be at most {max}")));
    }
    Ok(())
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SwanError::invalid(format!("{key} has unusable value '{value}'")))
}

/// Saturates at the largest span `Duration` can hold.
fn seconds(value: u64) -> Duration {
    let max = i64::MAX / 1000;
    Duration::seconds(i64::try_from(value).map_or(max, |v| v.min(max)))
}
