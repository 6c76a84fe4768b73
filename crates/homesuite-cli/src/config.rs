//! Configuration file handling.
//!
//! Reads from `~/.config/homesuite/homesuite.toml`

use anyhow::{Context, Result};
use homesuite_core::KdfCost;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one subdirectory of profiles per tool.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Exchange-rate list fetched by `rates`.
    #[serde(default = "default_rates_url")]
    pub rates_url: String,
    /// RSS feeds read by `feed` when no URL is given.
    #[serde(default)]
    pub feeds: Vec<String>,
    /// Timeout for every HTTP request.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Argon2 memory cost for vault keys, in KiB.
    #[serde(default = "default_kdf_memory_kib")]
    pub kdf_memory_kib: u32,
    /// Argon2 iteration count for vault keys.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("homesuite"))
        .unwrap_or_else(|| PathBuf::from("homesuite-data"))
}

fn default_rates_url() -> String {
    "https://www.cnb.cz/en/financial_markets/foreign_exchange_market/central_bank_exchange_rate_fixing/central_bank_exchange_rate_fixing/daily.txt".to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_kdf_memory_kib() -> u32 {
    KdfCost::default().memory_kib
}

fn default_kdf_iterations() -> u32 {
    KdfCost::default().iterations
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rates_url: default_rates_url(),
            feeds: Vec::new(),
            http_timeout_secs: default_http_timeout_secs(),
            kdf_memory_kib: default_kdf_memory_kib(),
            kdf_iterations: default_kdf_iterations(),
        }
    }
}

impl Config {
    /// Load configuration from the config file.
    ///
    /// If `custom_path` is provided, load from that path.
    /// Otherwise, load from the default XDG config location.
    /// Creates a default config file if it doesn't exist (only for default path).
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self> {
        let is_custom = custom_path.is_some();
        let config_path = match custom_path {
            Some(path) => path,
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            if is_custom {
                anyhow::bail!("Config file not found: {}", config_path.display());
            }
            let config = Config::default();
            config.save_to(&config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::debug!("Loaded config from {}: {:?}", config_path.display(), config);
        Ok(config)
    }

    /// Save configuration to `config_path`, creating its directory.
    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))
    }

    pub fn kdf_cost(&self) -> KdfCost {
        KdfCost {
            memory_kib: self.kdf_memory_kib,
            iterations: self.kdf_iterations,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Get the path to the config file.
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("homesuite").join("homesuite.toml"))
    }
}
