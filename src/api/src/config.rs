//! Configuration for the GridPlay API.

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Pairwise model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Load the pairwise model at startup; when false the grid heuristic is used
    #[serde(default = "default_model_enabled")]
    pub enabled: bool,
    #[serde(default = "default_model_path")]
    pub path: String,
}

fn default_model_enabled() -> bool {
    true
}

fn default_model_path() -> String {
    "data/models/pair_model.json".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: default_model_enabled(),
            path: default_model_path(),
        }
    }
}

/// Battle storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "data/battles.sqlite".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_sample_path")]
    pub sample_path: String,
}

fn default_sample_path() -> String {
    "data/sample_telemetry.json".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sample_path: default_sample_path(),
        }
    }
}

/// Leaderboard sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Rows returned alongside a submission
    #[serde(default = "default_submit_limit")]
    pub submit_limit: usize,
    /// Rows returned by the leaderboard endpoint
    #[serde(default = "default_query_limit")]
    pub query_limit: usize,
}

fn default_submit_limit() -> usize {
    10
}

fn default_query_limit() -> usize {
    50
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            submit_limit: default_submit_limit(),
            query_limit: default_query_limit(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (GRIDPLAY_SERVER__PORT, GRIDPLAY_STORAGE__DB_PATH, ...)
            .add_source(
                config::Environment::with_prefix("GRIDPLAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert!(config.model.enabled);
        assert_eq!(config.leaderboard.submit_limit, 10);
        assert_eq!(config.leaderboard.query_limit, 50);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.db_path, "data/battles.sqlite");
    }
}
