use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::CoreError;
use crate::providers::alphavantage::DEFAULT_BASE_URL;

/// Placeholder replaced with the user's home directory in configured paths.
pub const HOME_PLACEHOLDER: &str = "{home}";

/// Application configuration, stored as JSON.
///
/// ```json
/// {
///   "general": {
///     "trading_log_path": "{home}/.TradingMate/data/trading_log.json",
///     "credentials_filepath": "{home}/.TradingMate/config/.credentials",
///     "debug_log": false,
///     "enable_file_log": false,
///     "log_filepath": "{home}/.TradingMate/log/trading_mate_{timestamp}.log"
///   },
///   "alpha_vantage": {
///     "api_base_uri": "https://www.alphavantage.co/query",
///     "polling_period_sec": 15
///   }
/// }
/// ```
///
/// Credentials live in a separate file and are never written back by [`AppConfig::save`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,

    #[serde(default)]
    pub alpha_vantage: AlphaVantageConfig,

    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub trading_log_path: String,

    #[serde(default)]
    pub credentials_filepath: Option<String>,

    #[serde(default)]
    pub debug_log: bool,

    #[serde(default)]
    pub enable_file_log: bool,

    #[serde(default = "default_log_filepath")]
    pub log_filepath: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaVantageConfig {
    #[serde(default = "default_base_uri")]
    pub api_base_uri: String,

    #[serde(default = "default_polling_period")]
    pub polling_period_sec: u64,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            api_base_uri: default_base_uri(),
            polling_period_sec: default_polling_period(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub av_api_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                trading_log_path: format!("{HOME_PLACEHOLDER}/.TradingMate/data/trading_log.json"),
                credentials_filepath: None,
                debug_log: false,
                enable_file_log: false,
                log_filepath: default_log_filepath(),
            },
            alpha_vantage: AlphaVantageConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl AppConfig {
    /// Load the configuration at `path`, then its credentials file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Configuration(format!(
                "Please configure TradingMate: {} ({e})",
                path.display()
            ))
        })?;
        if contents.trim().is_empty() {
            return Err(CoreError::Configuration(format!(
                "Empty configuration file: {}",
                path.display()
            )));
        }

        let mut config: AppConfig = serde_json::from_str(&contents).map_err(|e| {
            CoreError::Configuration(format!("Malformed configuration {}: {e}", path.display()))
        })?;
        config.load_credentials();
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load from `{home}/.TradingMate/config/config.json`.
    pub fn load_default() -> Result<Self, CoreError> {
        Self::load(&default_config_path())
    }

    /// (Re)read the credentials file. A missing or malformed file leaves an
    /// empty API key; quotes then come from sources that need no key.
    pub fn load_credentials(&mut self) {
        let path = self.credentials_path();
        self.credentials = match std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str::<Credentials>(&s).ok())
        {
            Some(credentials) => credentials,
            None => {
                warn!("Credentials not configured: {}", path.display());
                Credentials::default()
            }
        };
    }

    /// Write the configuration (without credentials) to `path`.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize configuration: {e}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn trading_database_path(&self) -> PathBuf {
        PathBuf::from(expand_home(&self.general.trading_log_path))
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.general
            .credentials_filepath
            .as_deref()
            .map(|p| PathBuf::from(expand_home(p)))
            .unwrap_or_else(default_credentials_path)
    }

    pub fn alpha_vantage_api_key(&self) -> &str {
        &self.credentials.av_api_key
    }

    pub fn alpha_vantage_base_url(&self) -> &str {
        &self.alpha_vantage.api_base_uri
    }

    pub fn alpha_vantage_polling_period(&self) -> Duration {
        Duration::from_secs(self.alpha_vantage.polling_period_sec)
    }

    pub fn debug_log_active(&self) -> bool {
        self.general.debug_log
    }

    pub fn enable_file_log(&self) -> bool {
        self.general.enable_file_log
    }

    /// Configured log file path with `{home}` expanded. `{timestamp}` is
    /// left for the logging setup to fill in.
    pub fn log_filepath(&self) -> String {
        expand_home(&self.general.log_filepath)
    }
}

/// The user's home directory, or the working directory if unknown.
pub fn home_path() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Replace every `{home}` in `path`.
pub fn expand_home(path: &str) -> String {
    path.replace(HOME_PLACEHOLDER, &home_path().to_string_lossy())
}

pub fn default_config_path() -> PathBuf {
    home_path().join(".TradingMate").join("config").join("config.json")
}

pub fn default_credentials_path() -> PathBuf {
    home_path().join(".TradingMate").join("config").join(".credentials")
}

fn default_log_filepath() -> String {
    format!("{HOME_PLACEHOLDER}/.TradingMate/log/trading_mate_{{timestamp}}.log")
}

fn default_base_uri() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_polling_period() -> u64 {
    15
}
