//! Runtime configuration for the core.
//!
//! # Responsibility
//! - Collect data/log locations, log level and trial policy in one object.
//! - Read overrides from `OPTICA_*` environment variables.
//!
//! # Invariants
//! - `data_dir` is always absolute.
//! - Invalid overrides never abort startup; defaults are kept and a warning
//!   is logged.

use crate::license::TrialPolicy;
use crate::logging::default_log_level;
use log::warn;
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "OPTICA_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "OPTICA_LOG_LEVEL";
pub const TRIAL_DAYS_ENV: &str = "OPTICA_TRIAL_DAYS";

const DEFAULT_DATA_DIR_NAME: &str = "optica_data";
const DB_FILE_NAME: &str = "optica.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    pub trial: TrialPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let base = std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir());
        Self {
            data_dir: base.join(DEFAULT_DATA_DIR_NAME),
            log_level: default_log_level().to_string(),
            trial: TrialPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup(name)` for each `OPTICA_*` variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            let dir = PathBuf::from(dir.trim());
            if dir.is_absolute() {
                config.data_dir = dir;
            } else {
                warn!("event=config_load module=config status=ignored var={DATA_DIR_ENV} reason=not_absolute");
            }
        }

        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.log_level = level.trim().to_ascii_lowercase();
        }

        if let Some(days) = lookup(TRIAL_DAYS_ENV) {
            match days.trim().parse::<i64>() {
                Ok(days) if days > 0 => config.trial.trial_days = days,
                _ => warn!(
                    "event=config_load module=config status=ignored var={TRIAL_DAYS_ENV} reason=not_positive_integer"
                ),
            }
        }

        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_product_trial() {
        let config = CoreConfig::from_lookup(|_| None);
        assert_eq!(config.trial.trial_days, 30);
        assert_eq!(config.trial.unlock_secret, "opticage");
        assert!(config.data_dir.is_absolute());
        assert!(config.db_path().ends_with("optica.sqlite3"));
    }

    #[test]
    fn valid_overrides_are_applied() {
        let dir = std::env::temp_dir().join("optica-config-test");
        let dir_str = dir.to_str().unwrap().to_string();
        let config = CoreConfig::from_lookup(lookup_from(&[
            (DATA_DIR_ENV, dir_str.as_str()),
            (LOG_LEVEL_ENV, "WARN"),
            (TRIAL_DAYS_ENV, "7"),
        ]));
        assert_eq!(config.data_dir, dir);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.trial.trial_days, 7);
        assert_eq!(config.log_dir(), dir.join("logs"));
    }

    #[test]
    fn invalid_overrides_keep_defaults() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (DATA_DIR_ENV, "relative/dir"),
            (TRIAL_DAYS_ENV, "-3"),
        ]));
        let defaults = CoreConfig::from_lookup(|_| None);
        assert_eq!(config.data_dir, defaults.data_dir);
        assert_eq!(config.trial.trial_days, 30);
    }
}
