use crate::providers::coinmarketcap::SANDBOX_URL;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const API_KEY_VAR: &str = "COINMARKETCAP_API_KEY";
pub const BASE_URL_VAR: &str = "COINMARKETCAP_URL";
pub const TIMEOUT_VAR: &str = "COINMARKETCAP_TIMEOUT_SECS";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

pub const DEFAULT_LOG_LEVEL: &str = "ERROR";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DOTENV_FILE: &str = ".env";
const KNOWN_VARS: [&str; 4] = [API_KEY_VAR, BASE_URL_VAR, TIMEOUT_VAR, LOG_LEVEL_VAR];

/// Optional YAML settings file. Every key may be overridden by the environment.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub log_level: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config file");
        Ok(config)
    }

    /// Reads the platform default settings file, if the user created one.
    pub fn load_default() -> Result<Self> {
        let Ok(path) = AppConfig::default_config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub log_level: String,
    pub timeout: Duration,
}

impl AppConfig {
    /// Loads configuration from the environment, a `.env` file found above the
    /// working directory, and the YAML settings file, in that order of precedence.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let file = match config_path {
            Some(path) => FileConfig::load_from_path(path)?,
            None => FileConfig::load_default()?,
        };

        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let mut vars = match find_dotenv(&cwd) {
            Some(path) => read_dotenv(&path).unwrap_or_else(|e| {
                warn!("Ignoring {}: {e:#}", path.display());
                HashMap::new()
            }),
            None => {
                debug!("No {DOTENV_FILE} file found from {}", cwd.display());
                HashMap::new()
            }
        };
        for key in KNOWN_VARS {
            if let Ok(value) = std::env::var(key) {
                vars.insert(key.to_string(), value);
            }
        }

        Self::resolve(file, &vars)
    }

    /// Merges `vars` over `file` and applies defaults.
    pub fn resolve(file: FileConfig, vars: &HashMap<String, String>) -> Result<Self> {
        let var = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let Some(api_key) = var(API_KEY_VAR).or_else(|| non_empty(file.api_key)) else {
            bail!("{API_KEY_VAR} environment variable is required");
        };

        let base_url = var(BASE_URL_VAR)
            .or_else(|| non_empty(file.base_url))
            .unwrap_or_else(|| SANDBOX_URL.to_string());
        Url::parse(&base_url).with_context(|| format!("Invalid {BASE_URL_VAR}: {base_url}"))?;

        let log_level = var(LOG_LEVEL_VAR)
            .or_else(|| non_empty(file.log_level))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let timeout_secs = match var(TIMEOUT_VAR) {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| format!("Invalid {TIMEOUT_VAR}: {value}"))?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            bail!("{TIMEOUT_VAR} must be greater than zero");
        }

        Ok(AppConfig {
            api_key,
            base_url,
            log_level,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "coinconv", "coinconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }
}

/// Walks from `start` up to the filesystem root looking for a `.env` file.
pub fn find_dotenv(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DOTENV_FILE))
        .find(|candidate| candidate.is_file())
}

/// Reads the known settings from a `.env` file without touching the process
/// environment.
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    debug!("Loading settings from {}", path.display());
    let mut vars = HashMap::new();
    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    for entry in entries {
        let (key, value) = entry.with_context(|| format!("Failed to parse {}", path.display()))?;
        if KNOWN_VARS.contains(&key.as_str()) {
            vars.insert(key, value);
        }
    }
    Ok(vars)
}
