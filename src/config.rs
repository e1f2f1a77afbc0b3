use crate::constants::{DEFAULT_DEBOUNCE_MS, DEFAULT_PUMP_INTERVAL_MS};
use crate::error::{AppError, Result};
use crate::validation::{validate_debounce_ms, validate_pump_interval_ms};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "inputshift.db";

/// User settings read from `config.json`. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub debounce_ms: u64,
    pub pump_interval_ms: u64,
    pub database_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            pump_interval_ms: DEFAULT_PUMP_INTERVAL_MS,
            database_path: None,
        }
    }
}

impl AppConfig {
    /// Load and validate the config at `path`. A missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let config: Self = serde_json::from_str(&contents).map_err(|e| AppError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate().map_err(|e| AppError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_debounce_ms(self.debounce_ms)?;
        validate_pump_interval_ms(self.pump_interval_ms)?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }
}

/// Where inputshift keeps its files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let dirs =
            ProjectDirs::from("com", "inputshift", "InputShift").ok_or(AppError::NoProjectDirs)?;
        Ok(Self {
            config_file: dirs.config_dir().join(CONFIG_FILE),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    /// Database location: the configured override, or the data directory.
    /// Creates the parent directory if needed.
    pub fn database_path(&self, config: &AppConfig) -> Result<PathBuf> {
        let path = config
            .database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DATABASE_FILE));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}
