use crate::error::AppError;
use crate::reminder::DEFAULT_REMINDER_DELAY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "AGENDA_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reject to-dos that lack a date and time.
    pub require_schedule: bool,
    pub reminders_enabled: bool,
    pub reminder_delay_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            require_schedule: true,
            reminders_enabled: true,
            reminder_delay_seconds: DEFAULT_REMINDER_DELAY.as_secs(),
        }
    }
}

impl Config {
    pub fn reminder_delay(&self) -> Duration {
        Duration::from_secs(self.reminder_delay_seconds)
    }

    fn validate(self) -> Result<Self, AppError> {
        if self.reminder_delay_seconds == 0 {
            return Err(AppError::invalid_data(
                "reminder_delay_seconds must be greater than zero",
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub require_schedule: Option<bool>,
    pub reminders_enabled: Option<bool>,
    pub reminder_delay_seconds: Option<u64>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("agenda").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("agenda")
            .join(CONFIG_FILE_NAME))
    }
}

/// Loads the config file, falling back to defaults on any problem.
///
/// A missing file is not an error; an unreadable or invalid one is returned
/// in `error` alongside the defaults.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

pub fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "using default config");
            ConfigLoad {
                config: Config::default(),
                error: Some(err),
            }
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.validate()
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(required) = overrides.require_schedule {
        merged.require_schedule = required;
    }
    if let Some(enabled) = overrides.reminders_enabled {
        merged.reminders_enabled = enabled;
    }
    if let Some(seconds) = overrides.reminder_delay_seconds
        && seconds > 0
    {
        merged.reminder_delay_seconds = seconds;
    }
    merged
}
