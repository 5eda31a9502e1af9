//! Application Configuration
//!
//! Settings are layered with the `config` crate: built-in defaults, then
//! `config/default.*`, then `config/environments/{APP_ENVIRONMENT}.*`, then
//! `APP__SECTION__KEY` environment variables. A bare `DATABASE_URL` overrides
//! `database.url`.

use serde::Deserialize;
use sub_service_database::PostgresConfig;

/// Main configuration for the application
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub database: PostgresConfig,
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for handling a single request
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub log_filter: String,
    pub json_logs: bool,
}

impl Config {
    /// Load configuration from environment variables and config files
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            .set_default("environment", environment.clone())?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::File::with_name(&format!("config/environments/{}", environment))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?;

        builder.build()?.try_deserialize()
    }

    /// Check if the environment is production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.port == 0 {
            return Err(config::ConfigError::Message(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if self.server.timeout_seconds == 0 {
            return Err(config::ConfigError::Message(
                "server.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        self.database
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 30,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "sub_service_api=debug,sub_service_database=debug,tower_http=debug"
                .to_string(),
            json_logs: true,
        }
    }
}
