use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppError;

pub const ENV_CONFIG: &str = "NOTIPOLL_CONFIG";
pub const DEFAULT_INTERVAL_SECS: i64 = 5;
pub const MAX_INTERVAL_SECS: i64 = 3600;
pub const DEFAULT_APP_ID: &str = "notipoll";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("interval must be between 1 and {max} seconds, got {0}", max = MAX_INTERVAL_SECS)]
    InvalidInterval(i64),
    #[error("domain is empty")]
    MissingDomain,
    #[error("invalid domain {0:?}")]
    InvalidDomain(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    pub domain: String,
    #[serde(default)]
    pub project: String,
    /// Poll interval in seconds. Signed so that a negative value in the file
    /// is reported as a config error instead of a parse failure.
    #[serde(default = "default_interval")]
    pub interval: i64,
    #[serde(default)]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_app_id")]
    pub app_id: String,
}

fn default_interval() -> i64 {
    DEFAULT_INTERVAL_SECS
}

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

impl ClientConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            project: String::new(),
            interval: DEFAULT_INTERVAL_SECS,
            debug: false,
            api_key: None,
            app_id: default_app_id(),
        }
    }

    pub fn find_and_load(cli_value: Option<PathBuf>) -> Result<(PathBuf, ClientConfig), AppError> {
        let path = resolve_config_path(cli_value)?;
        let cfg = load_config(&path)?;
        Ok((path, cfg))
    }

    /// Normalized base URL of the service.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let trimmed = self.domain.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingDomain);
        }
        if trimmed.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidDomain(trimmed.to_string()));
        }
        Ok(normalize_server_url(trimmed))
    }

    /// Validated poll interval; out-of-range values fall back to the default.
    pub fn interval(&self) -> Duration {
        match validate_interval(self.interval) {
            Ok(d) => d,
            Err(e) => {
                warn!(error=%e, fallback_secs = DEFAULT_INTERVAL_SECS, "invalid poll interval; using default");
                Duration::from_secs(DEFAULT_INTERVAL_SECS as u64)
            }
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            project: self.project.trim().to_string(),
            interval: self.interval(),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// What the monitor needs on every cycle, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub project: String,
    pub interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            project: String::new(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS as u64),
        }
    }
}

pub fn validate_interval(secs: i64) -> Result<Duration, ConfigError> {
    if (1..=MAX_INTERVAL_SECS).contains(&secs) {
        Ok(Duration::from_secs(secs as u64))
    } else {
        Err(ConfigError::InvalidInterval(secs))
    }
}

pub fn resolve_config_path(cli_value: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(p) = cli_value {
        return Ok(p);
    }
    if let Ok(p) = std::env::var(ENV_CONFIG) {
        return Ok(PathBuf::from(p));
    }
    default_config_path().ok_or_else(|| AppError::Config("could not determine config dir".into()))
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "notipoll", "notipoll")
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(project_dirs()?.config_dir().join("config.yaml"))
}

pub fn default_log_dir() -> Option<PathBuf> {
    Some(project_dirs()?.data_local_dir().join("logs"))
}

pub fn load_config(path: &Path) -> Result<ClientConfig, AppError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("read {} failed: {e}", path.display())))?;
    let cfg: ClientConfig = serde_yaml::from_str(&data)
        .map_err(|e| AppError::Config(format!("parse {} failed: {e}", path.display())))?;
    cfg.base_url()
        .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &ClientConfig) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Config(format!("create {} failed: {e}", parent.display())))?;
    }
    let data = serde_yaml::to_string(cfg)
        .map_err(|e| AppError::Config(format!("serialize config failed: {e}")))?;
    std::fs::write(path, data)
        .map_err(|e| AppError::Config(format!("write {} failed: {e}", path.display())))
}

pub fn normalize_server_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", trimmed.trim_end_matches('/'))
    }
}
