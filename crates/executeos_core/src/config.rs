//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file, then the
//! `EXECUTEOS_*` environment variables.

use crate::logging::{default_log_level, normalize_level};
use crate::service::plan_service::{GridGeometry, GridInterval, DEFAULT_HOUR_HEIGHT_PX};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "EXECUTEOS_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "EXECUTEOS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "EXECUTEOS_LOG_DIR";

const DATA_DIR_NAME: &str = ".executeos";
const DB_FILE_NAME: &str = "executeos.db";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidGridInterval(u32),
    InvalidHourHeight(f64),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "cannot parse config `{}`: {source}", path.display())
            }
            Self::InvalidGridInterval(minutes) => {
                write!(f, "grid interval must be 15, 30 or 60 minutes, got {minutes}")
            }
            Self::InvalidHourHeight(px) => {
                write!(f, "hour height must be a positive number of pixels, got {px}")
            }
            Self::InvalidLogLevel(level) => write!(f, "unsupported log level `{level}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Must be absolute; relative values are resolved against the working
    /// directory.
    pub log_dir: PathBuf,
    pub grid_interval_minutes: u32,
    pub hour_height_px: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: data_dir.join("logs"),
            grid_interval_minutes: GridInterval::default().minutes(),
            hour_height_px: DEFAULT_HOUR_HEIGHT_PX,
        }
    }
}

impl CoreConfig {
    /// Defaults, then `path` when given, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides fields from `lookup`; blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(db_path) = value(ENV_DB_PATH) {
            self.db_path = PathBuf::from(db_path.trim());
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            self.log_level = level.trim().to_string();
        }
        if let Some(log_dir) = value(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(log_dir.trim());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if GridInterval::from_minutes(self.grid_interval_minutes).is_none() {
            return Err(ConfigError::InvalidGridInterval(self.grid_interval_minutes));
        }
        if !self.hour_height_px.is_finite() || self.hour_height_px <= 0.0 {
            return Err(ConfigError::InvalidHourHeight(self.hour_height_px));
        }
        normalize_level(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))?;
        Ok(())
    }

    pub fn geometry(&self) -> GridGeometry {
        GridGeometry {
            hour_height_px: self.hour_height_px,
            interval: GridInterval::from_minutes(self.grid_interval_minutes).unwrap_or_default(),
        }
    }

    /// Absolute log directory.
    pub fn resolved_log_dir(&self) -> PathBuf {
        if self.log_dir.is_absolute() {
            return self.log_dir.clone();
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&self.log_dir))
            .unwrap_or_else(|_| self.log_dir.clone())
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_values_fill_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"gridIntervalMinutes": 15, "logLevel": "warn"}"#)
            .expect("write config");

        let config = CoreConfig::from_file(&path).expect("parse");
        assert_eq!(config.grid_interval_minutes, 15);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.hour_height_px, DEFAULT_HOUR_HEIGHT_PX);
        assert_eq!(config.geometry().interval, GridInterval::Quarter);
    }

    #[test]
    fn env_overrides_win_and_blank_values_are_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, "/tmp/plan.db"),
            (ENV_LOG_LEVEL, "   "),
            (ENV_LOG_DIR, "/tmp/executeos-logs"),
        ]);
        let mut config = CoreConfig::default();
        let level_before = config.log_level.clone();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/tmp/plan.db"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/executeos-logs"));
        assert_eq!(config.log_level, level_before);
    }

    #[test]
    fn validate_rejects_bad_grid_values() {
        let mut config = CoreConfig {
            grid_interval_minutes: 20,
            ..CoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGridInterval(20))
        ));
        config.grid_interval_minutes = 60;
        config.hour_height_px = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHourHeight(_))
        ));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").expect("write config");
        assert!(matches!(
            CoreConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
