//! Configuration management for librarius

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the persisted collection files.
    pub data_dir: String,
    /// CSV file consulted once to seed the catalog when no works exist yet.
    pub seed_file: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CirculationConfig {
    /// Loan period in days; the due date is always loan date plus this.
    pub loan_period_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AdminConfig {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub circulation: CirculationConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default configuration, if present
            .add_source(File::with_name("config/default").required(false))
            // Add environment variables (with prefix LIBRARIUS_)
            .add_source(
                Environment::with_prefix("LIBRARIUS")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            seed_file: "catalog_seed.csv".to_string(),
        }
    }
}

impl Default for CirculationConfig {
    fn default() -> Self {
        Self { loan_period_days: 14 }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            login: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
