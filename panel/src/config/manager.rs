use super::Config;
use crate::constants::defaults;
use crate::errors::ConfigError;
use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    /// Resolve the config directory from `PANEL_CONFIG_DIR`, falling back to `config`
    pub async fn from_env() -> Result<Self> {
        let config_dir = std::env::var(defaults::CONFIG_DIR_ENV)
            .unwrap_or_else(|_| defaults::CONFIG_DIR.to_string());
        Self::new(config_dir).await
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    /// Parsed timezone of the current configuration
    pub fn timezone(&self) -> Tz {
        // validated at load time
        self.current_config.timezone.parse().unwrap_or(Tz::UTC)
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        debug!("Loading main config: {}", main_config_path);

        let main_config_content = fs::read_to_string(&main_config_path).await.map_err(|e| {
            anyhow!(ConfigError::LoadFailed {
                path: main_config_path.clone(),
                reason: e.to_string(),
            })
        })?;

        let config: Config = toml::from_str(&main_config_content).map_err(|e| {
            anyhow!(ConfigError::ParseError {
                reason: e.to_string(),
            })
        })?;

        Self::validate(&config)?;

        info!(
            "Loaded configuration: server root {}, program '{}', timezone {}",
            config.server.root.display(),
            config.server.program,
            config.timezone
        );

        Ok(config)
    }

    fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_key".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if config.server.log_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.log_capacity".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if config.scheduler.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.poll_interval_seconds".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if config.server.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.program".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        config
            .timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "timezone".to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}
