//! Admin API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

/// Admin API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Socket address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Maximum connections in the SQLite pool
    pub db_max_connections: u32,

    /// JWT secret key for signing session tokens
    pub jwt_secret: String,

    /// Password for the bootstrap `admin` account (first run only)
    pub admin_password: Option<String>,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = AdminConfig {
            bind_addr: env::var("BACKOFFICE_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8470".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BACKOFFICE_BIND_ADDR".to_string()))?,

            database_path: env::var("BACKOFFICE_DATABASE_PATH")
                .unwrap_or_else(|_| "backoffice.db".to_string()),

            db_max_connections: env::var("BACKOFFICE_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("BACKOFFICE_DB_MAX_CONNECTIONS".to_string())
                })?,

            jwt_secret: env::var("BACKOFFICE_JWT_SECRET").unwrap_or_else(|_| {
                // Fallback secret for development only
                // In production, this MUST be set via environment variable
                "backoffice-dev-secret-change-in-production".to_string()
            }),

            admin_password: env::var("BACKOFFICE_ADMIN_PASSWORD").ok(),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "BACKOFFICE_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        // An empty secret would sign tokens anyone can forge
        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "BACKOFFICE_JWT_SECRET".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
