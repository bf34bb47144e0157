//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Directory holding the card and question content files
    pub content_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables, with CLI argument
    /// overrides taking precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if a present variable fails to parse.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        content_dir_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => match std::env::var("SERVER_BIND") {
                Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("{raw} is not a valid socket address"),
                })?,
                Err(_) => "127.0.0.1:6969"
                    .parse()
                    .expect("Default bind address is valid"),
            },
        };

        let content_dir = content_dir_override
            .or_else(|| std::env::var("CONTENT_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("content"));

        Ok(ServerConfig { bind, content_dir })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.content_dir.is_dir() {
            return Err(ConfigError::Invalid {
                var: "CONTENT_DIR".to_string(),
                reason: format!("{} is not a directory", self.content_dir.display()),
            });
        }
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "SERVER_BIND".to_string(),
            reason: "nope is not a valid socket address".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SERVER_BIND"));
        assert!(msg.contains("not a valid socket address"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let bind: SocketAddr = "0.0.0.0:1234".parse().unwrap();
        let config =
            ServerConfig::from_env(Some(bind), Some(PathBuf::from("/tmp/content"))).unwrap();
        assert_eq!(config.bind, bind);
        assert_eq!(config.content_dir, PathBuf::from("/tmp/content"));
    }

    #[test]
    fn test_missing_content_dir_fails_validation() {
        let config = ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            content_dir: PathBuf::from("/definitely/not/a/real/directory"),
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
