//! Configuration for the CSV tool (`spec.md` §6 CLI entry-point contract).

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_logging_enabled() -> bool {
    true
}

/// Required keys are `db_url`, `working_dirpath`, `logging`; `working_dirpath`
/// is accepted for parity with `central-server`'s config shape even though
/// this tool has no certificates to materialize there.
#[derive(Debug, Deserialize, Clone)]
pub struct ToolConfig {
    pub db_url: String,
    #[allow(dead_code)]
    pub working_dirpath: String,
    pub logging: LoggingConfig,
}

impl ToolConfig {
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
