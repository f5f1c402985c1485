//! CLI configuration

use runboard_sdk::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunboardConfig {
    /// Pipeline settings
    pub engine: EngineConfig,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,

    pub log_format: LogFormat,

    /// Pretty-print responses
    pub pretty: bool,
}

impl Default for RunboardConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            log_level: "runboard_cli=info,runboard_sdk=info,runboard_runtime=info".to_string(),
            log_format: LogFormat::Text,
            pretty: true,
        }
    }
}

impl RunboardConfig {
    /// Load configuration from `config/runboard.*` and `RUNBOARD_*`
    /// environment variables
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();
        Self::load_from("config/runboard")
    }

    /// Load configuration from the given file base name (extension optional,
    /// file optional) and `RUNBOARD_*` environment variables. Nested keys use
    /// `__`, e.g. `RUNBOARD_ENGINE__RUN_PAGE_SIZE`.
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let name = path.as_ref().to_string_lossy().into_owned();
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(&name).required(false))
            .add_source(
                config::Environment::with_prefix("RUNBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read config: {}", e))?;

        let config: Self = cfg
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e))?;
        config.engine.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunboardConfig::default();
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.pretty);
        assert!(config.log_level.contains("runboard_sdk=info"));
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
