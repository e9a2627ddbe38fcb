//! HTTP Server Configuration
//!
//! Host, port, CORS and body-limit settings, plus the process-level
//! [`ProxyConfig`] assembled once from environment variables at startup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;
use crate::store::DatabaseConfig;

/// Default request body cap (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// None of the accepted variables is set
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    /// A variable is set but cannot be used
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 80)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty mirrors any request origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    80
}

fn default_body_limit() -> usize {
    DEFAULT_BODY_LIMIT
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Everything the proxy process needs to start
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub server: HttpServerConfig,
    pub database: DatabaseConfig,
    pub log_level: Severity,
}

impl ProxyConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let env_id = var("TCB_ENV")
            .or_else(|| var("CLOUDBASE_ENV"))
            .ok_or_else(|| ConfigError::MissingEnv("TCB_ENV or CLOUDBASE_ENV".to_string()))?;

        let mut database = DatabaseConfig::new(env_id);
        if let Some(region) = var("CLOUDBASE_REGION").or_else(|| var("TENCENTCLOUD_REGION")) {
            database = database.with_region(region);
        }

        let mut server = HttpServerConfig::default();
        if let Some(host) = var("HOST") {
            server.host = host;
        }
        // An unparsable port falls back to the default rather than failing
        if let Some(port) = var("PORT").and_then(|p| p.trim().parse().ok()) {
            server.port = port;
        }
        if let Some(origins) = var("CORS_ORIGINS") {
            server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(limit) = var("BODY_LIMIT_BYTES") {
            server.body_limit_bytes =
                limit.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    name: "BODY_LIMIT_BYTES".to_string(),
                    reason: format!("'{}' is not a byte count", limit),
                })?;
        }

        let log_level = match var("LOG_LEVEL") {
            Some(level) => level
                .parse::<Severity>()
                .map_err(|e| ConfigError::InvalidValue {
                    name: "LOG_LEVEL".to_string(),
                    reason: e.to_string(),
                })?,
            None => Severity::Info,
        };

        Ok(Self {
            server,
            database,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = HttpServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 80);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.body_limit_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_socket_addr() {
        let config = HttpServerConfig::with_port(8080);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_env_id_required() {
        let err = ProxyConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(_)));
    }

    #[test]
    fn test_env_fallbacks() {
        let config = ProxyConfig::from_lookup(lookup(&[
            ("CLOUDBASE_ENV", "env-b"),
            ("TENCENTCLOUD_REGION", "ap-guangzhou"),
        ]))
        .unwrap();
        assert_eq!(config.database.env_id, "env-b");
        assert_eq!(config.database.region, "ap-guangzhou");

        let config = ProxyConfig::from_lookup(lookup(&[
            ("TCB_ENV", "env-a"),
            ("CLOUDBASE_ENV", "env-b"),
        ]))
        .unwrap();
        assert_eq!(config.database.env_id, "env-a");
        assert_eq!(config.database.region, "ap-shanghai");
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config =
            ProxyConfig::from_lookup(lookup(&[("TCB_ENV", "e"), ("PORT", "http")])).unwrap();
        assert_eq!(config.server.port, 80);

        let config =
            ProxyConfig::from_lookup(lookup(&[("TCB_ENV", "e"), ("PORT", "3000")])).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_cors_origins_split() {
        let config = ProxyConfig::from_lookup(lookup(&[
            ("TCB_ENV", "e"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ]))
        .unwrap();
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ProxyConfig::from_lookup(lookup(&[("TCB_ENV", "e"), ("BODY_LIMIT_BYTES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = ProxyConfig::from_lookup(lookup(&[("TCB_ENV", "e"), ("LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
