use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

use crate::watch::discount::DiscountSource;
use crate::watch::policy::{DiscountEndPolicy, RewatchPolicy};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub watcher: WatcherConfig,
    pub store: StoreConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    pub sweep_interval_seconds: u64,
    pub lookup_delay_ms: u64,
    pub discount_source: DiscountSource,
    pub on_discount_end: DiscountEndPolicy,
    pub on_rewatch: RewatchPolicy,
}

impl WatcherConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn lookup_delay(&self) -> Duration {
        Duration::from_millis(self.lookup_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    pub country_code: String,
    pub language: String,
    pub request_timeout_seconds: u64,
    pub dlc_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub json_logs: bool,
    pub health_enabled: bool,
    pub health_addr: String,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub telegram_token: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            telegram_token: std::env::var("TELEGRAM_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, overlaying environment variables for secrets.
    pub fn load(path: &Path) -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }

    fn validate(&self) -> Result<()> {
        if self.watcher.sweep_interval_seconds == 0 {
            bail!("watcher.sweep_interval_seconds must be greater than zero");
        }
        Ok(())
    }
}
