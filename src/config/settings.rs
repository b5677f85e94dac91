//! # Configuration Settings
//!
//! Defines the configuration structure for the Watson registry.

use crate::cipher::CipherKind;
use crate::errors::{Result, WatsonError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Cipher used for sensitive outputs
    #[validate(nested)]
    pub cipher: CipherConfig,
}

impl AppConfig {
    /// Load every section from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
            cipher: CipherConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(WatsonError::from)?;
        self.validate_custom()?;
        Ok(())
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite:") {
            return Err(WatsonError::validation("Database URL must start with 'sqlite:'"));
        }

        self.cipher.validate_selection()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create ServerConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let host = std::env::var("WATSON_API_HOST").unwrap_or(defaults.host);
        let port = match std::env::var("WATSON_API_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| WatsonError::config(format!("Invalid WATSON_API_PORT: {}", e)))?,
            Err(_) => defaults.port,
        };

        Ok(Self { host, port })
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(min = 0, max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/watson.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600, // 10 minutes
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Whether the URL points at an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/watson.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let min_connections = std::env::var("DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);

        let connect_timeout_seconds = std::env::var("DATABASE_CONNECT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let idle_timeout_seconds = std::env::var("DATABASE_IDLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(600);

        let auto_migrate = std::env::var("DATABASE_AUTO_MIGRATE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(true);

        Self {
            url,
            max_connections,
            min_connections,
            connect_timeout_seconds,
            idle_timeout_seconds,
            auto_migrate,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let log_level = std::env::var("WATSON_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json_logging = std::env::var("WATSON_LOG_JSON")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self { log_level, json_logging }
    }
}

/// Selection and parameters of the cipher protecting sensitive outputs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CipherConfig {
    /// Which cipher variant to construct
    pub kind: CipherKind,

    /// Build the cipher once and reuse it instead of constructing it per use
    pub cache: bool,

    /// Base64-encoded 32-byte key for the local AES-256-GCM cipher
    #[serde(skip_serializing)]
    pub local_key_base64: Option<String>,

    /// KMS key identifier (key id, ARN or alias)
    #[validate(length(min = 1, message = "KMS key id cannot be empty"))]
    pub kms_key_id: Option<String>,

    /// Optional KMS endpoint override (e.g. a local emulator)
    #[validate(url(message = "KMS endpoint must be a valid URL"))]
    pub kms_endpoint_url: Option<String>,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            kind: CipherKind::Fail,
            cache: false,
            local_key_base64: None,
            kms_key_id: None,
            kms_endpoint_url: None,
        }
    }
}

impl CipherConfig {
    /// Config selecting the given variant with no further parameters
    pub fn with_kind(kind: CipherKind) -> Self {
        Self { kind, ..Default::default() }
    }

    /// Create CipherConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let kind = match std::env::var("WATSON_CIPHER") {
            Ok(raw) if !raw.trim().is_empty() => {
                raw.trim().parse::<CipherKind>().map_err(WatsonError::config)?
            }
            _ => CipherKind::Fail,
        };

        let cache = std::env::var("WATSON_CIPHER_CACHE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        let non_empty = |name: &str| std::env::var(name).ok().filter(|s| !s.trim().is_empty());

        Ok(Self {
            kind,
            cache,
            local_key_base64: non_empty("WATSON_LOCAL_CIPHER_KEY"),
            // Unprefixed names are accepted from older deployments
            kms_key_id: non_empty("WATSON_AWSKMS_KEY_ID")
                .or_else(|| non_empty("AWSKMS_WRAPPER_KEY_ID")),
            kms_endpoint_url: non_empty("WATSON_AWSKMS_ENDPOINT_URL")
                .or_else(|| non_empty("AWSKMS_ENDPOINT_URL")),
        })
    }

    /// Ensure the parameters required by the selected variant are present
    pub fn validate_selection(&self) -> Result<()> {
        match self.kind {
            CipherKind::Local if self.local_key_base64.is_none() => Err(WatsonError::config(
                "WATSON_LOCAL_CIPHER_KEY must be set when WATSON_CIPHER=local. \
                 Generate a key with: openssl rand -base64 32",
            )),
            CipherKind::AwsKms if self.kms_key_id.is_none() => Err(WatsonError::config(
                "WATSON_AWSKMS_KEY_ID (or AWSKMS_WRAPPER_KEY_ID) must be set when WATSON_CIPHER=aws-kms",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cipher.kind, CipherKind::Fail);
    }

    #[test]
    fn test_server_bind_address() {
        let config = ServerConfig { host: "0.0.0.0".to_string(), port: 9000 };
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_invalid_database_url_scheme() {
        let config = AppConfig {
            database: DatabaseConfig {
                url: "mysql://localhost/watson".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_connections_rejected() {
        let config = AppConfig {
            database: DatabaseConfig { max_connections: 0, ..Default::default() },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_idle_timeout_zero_disables() {
        let config = DatabaseConfig { idle_timeout_seconds: 0, ..Default::default() };
        assert!(config.idle_timeout().is_none());
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_in_memory_detection() {
        let config = DatabaseConfig { url: "sqlite::memory:".to_string(), ..Default::default() };
        assert!(config.is_in_memory());
        assert!(!DatabaseConfig::default().is_in_memory());
    }

    #[test]
    fn test_local_cipher_requires_key() {
        let config = CipherConfig::with_kind(CipherKind::Local);
        assert!(config.validate_selection().is_err());

        let config = CipherConfig {
            local_key_base64: Some("QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI=".to_string()),
            ..CipherConfig::with_kind(CipherKind::Local)
        };
        assert!(config.validate_selection().is_ok());
    }

    #[test]
    fn test_kms_cipher_requires_key_id() {
        let config = CipherConfig::with_kind(CipherKind::AwsKms);
        assert!(config.validate_selection().is_err());

        let config = CipherConfig {
            kms_key_id: Some("alias/watson".to_string()),
            ..CipherConfig::with_kind(CipherKind::AwsKms)
        };
        assert!(config.validate_selection().is_ok());
    }

    #[test]
    fn test_invalid_kms_endpoint_rejected() {
        let config = AppConfig {
            cipher: CipherConfig {
                kms_key_id: Some("alias/watson".to_string()),
                kms_endpoint_url: Some("not a url".to_string()),
                ..CipherConfig::with_kind(CipherKind::AwsKms)
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
