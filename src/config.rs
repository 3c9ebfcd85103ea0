//! Configuration loader and validator for the catalog backup tool.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub backup: Backup,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// Backup schedule and artifact directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Backup {
    pub dir: String,
    pub interval: u64,
    pub unit: BackupUnit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl Backup {
    pub fn period(&self) -> Duration {
        let secs = match self.unit {
            BackupUnit::Seconds => self.interval,
            BackupUnit::Minutes => self.interval * 60,
            BackupUnit::Hours => self.interval * 3600,
            BackupUnit::Days => self.interval * 86_400,
        };
        Duration::from_secs(secs)
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` and
    /// `backup.dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        fs::create_dir_all(&self.app.data_dir)?;
        fs::create_dir_all(&self.backup.dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.backup.dir.trim().is_empty() {
        return Err(ConfigError::Invalid("backup.dir must be non-empty"));
    }
    if cfg.backup.interval == 0 {
        return Err(ConfigError::Invalid("backup.interval must be > 0"));
    }
    Ok(())
}

/// Canonical example configuration.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

backup:
  dir: "./backup"
  interval: 6
  unit: "hours"
"#
}
