//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                     | Default              |
//! |------------------------------|----------------------|
//! | `WEBSHOP_HTTP_PORT`          | `8000`               |
//! | `WEBSHOP_DATABASE_PATH`      | `./data/webshop.db`  |
//! | `WEBSHOP_DB_MAX_CONNECTIONS` | `5`                  |
//! | `WEBSHOP_NO_REPLY_EMAIL`     | `no-reply@localhost` |
//! | `WEBSHOP_PAGE_SIZE`          | `9`                  |
//! | `WEBSHOP_MAX_PAGE_SIZE`      | `100`                |

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// Path of the SQLite database file
    pub database_path: String,

    /// Maximum pooled database connections
    pub db_max_connections: u32,

    /// Sender address of order notification emails
    pub no_reply_email: String,

    /// Products per page when the client sends no `page_size`
    pub page_size: u32,

    /// Upper bound for a client-requested `page_size`
    pub max_page_size: u32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: parse_var(&lookup, "WEBSHOP_HTTP_PORT", "8000")?,

            database_path: lookup("WEBSHOP_DATABASE_PATH")
                .unwrap_or_else(|| "./data/webshop.db".to_string()),

            db_max_connections: parse_var(&lookup, "WEBSHOP_DB_MAX_CONNECTIONS", "5")?,

            no_reply_email: lookup("WEBSHOP_NO_REPLY_EMAIL")
                .unwrap_or_else(|| "no-reply@localhost".to_string()),

            page_size: parse_var(&lookup, "WEBSHOP_PAGE_SIZE", "9")?,

            max_page_size: parse_var(&lookup, "WEBSHOP_MAX_PAGE_SIZE", "100")?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "WEBSHOP_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.max_page_size == 0 {
            return Err(ConfigError::InvalidValue("WEBSHOP_MAX_PAGE_SIZE".to_string()));
        }
        if config.page_size == 0 || config.page_size > config.max_page_size {
            return Err(ConfigError::InvalidValue("WEBSHOP_PAGE_SIZE".to_string()));
        }

        Ok(config)
    }

    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError> {
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.database_path, "./data/webshop.db");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.no_reply_email, "no-reply@localhost");
        assert_eq!(config.page_size, 9);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("WEBSHOP_HTTP_PORT", "9090"),
            ("WEBSHOP_PAGE_SIZE", "20"),
            ("WEBSHOP_NO_REPLY_EMAIL", "shop@example.com"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.no_reply_email, "shop@example.com");
    }

    #[test]
    fn test_invalid_values() {
        for vars in [
            [("WEBSHOP_HTTP_PORT", "http")],
            [("WEBSHOP_HTTP_PORT", "70000")],
            [("WEBSHOP_PAGE_SIZE", "0")],
            [("WEBSHOP_PAGE_SIZE", "500")],
            [("WEBSHOP_DB_MAX_CONNECTIONS", "0")],
        ] {
            let err = ApiConfig::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(_)), "{vars:?}");
        }
    }
}
