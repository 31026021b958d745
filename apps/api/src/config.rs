//! Server configuration.
//!
//! Layers, later ones win:
//!
//! ```text
//!   built-in defaults
//!         │
//!         ▼
//!   stockroom.toml            (optional; path from STOCKROOM_CONFIG)
//!         │
//!         ▼
//!   STOCKROOM_* environment   (STOCKROOM_PORT=9000, STOCKROOM_DATABASE_PATH=...)
//! ```

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default tracing directives when neither RUST_LOG nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,stockroom=debug,sqlx=warn";

const DEFAULT_CONFIG_FILE: &str = "stockroom.toml";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub max_connections: u32,

    /// Allowed browser origins; empty allows any
    pub cors_allowed_origins: Vec<String>,

    /// tracing EnvFilter directives
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path: PathBuf::from("stockroom.db"),
            max_connections: 5,
            cors_allowed_origins: Vec::new(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then the config file, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("STOCKROOM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let defaults = ServerConfig::default();

        let settings = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port)?
            .set_default("database_path", defaults.database_path.to_string_lossy().into_owned())?
            .set_default("max_connections", defaults.max_connections)?
            .set_default("cors_allowed_origins", defaults.cors_allowed_origins)?
            .set_default("log_filter", defaults.log_filter)?
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("STOCKROOM")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins"),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        Ok(())
    }

    /// Socket address built from `host` and `port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("host".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_zero_port_rejected() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(f)) if f == "port"));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let config = ServerConfig {
            max_connections: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_host_rejected() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.bind_addr().is_err());
    }
}
