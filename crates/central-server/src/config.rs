//! Service configuration (`spec.md` §6 "Configuration options").

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    pub dirpath: Option<String>,
    pub history: Option<u16>,
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_logging_enabled() -> bool {
    true
}

/// `spec.md` §6: `{db_url, working_dirpath, logging}` are required keys.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub db_url: String,
    pub working_dirpath: String,
    pub logging: LoggingConfig,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_client_id")]
    pub mqtt_client_id: String,
}

fn default_api_port() -> u16 {
    3000
}
fn default_client_id() -> String {
    "central-server".to_string()
}

impl ServerConfig {
    /// Loads from the JSON file at `path` (`spec.md` §6 CLI entry-point
    /// contract). Environment variables under `ACQSVC__` override file
    /// values, mirroring `AgentConfig::load`'s layering.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(true))
            .add_source(
                config::Environment::with_prefix("ACQSVC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
