//! Server configuration
//!
//! Every setting has a default and can be overridden through a `BOUDOIR_*`
//! environment variable; command-line flags override both.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use boudoir_lib::MarketplaceConfig;
use boudoir_lib::retry::Backoff;
use boudoir_lib::retry::RetryPolicy;
use log::LevelFilter;

use crate::paths;

pub const ENV_ADDR: &str = "BOUDOIR_ADDR";
pub const ENV_DB: &str = "BOUDOIR_DB";
pub const ENV_LOG: &str = "BOUDOIR_LOG";
pub const ENV_SESSION_TTL_HOURS: &str = "BOUDOIR_SESSION_TTL_HOURS";
pub const ENV_DB_RETRIES: &str = "BOUDOIR_DB_RETRIES";
pub const ENV_DB_RETRY_DELAY_MS: &str = "BOUDOIR_DB_RETRY_DELAY_MS";

/// Configuration errors, reported before the server starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Could not determine a data directory; set {ENV_DB}")]
    NoDataDir,
}

/// Settings of one server process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// SQLite database file, or `:memory:`.
    pub db_path: PathBuf,
    pub log_level: LevelFilter,
    /// Default: 168 hours (7 days)
    pub session_ttl_hours: i64,
    /// Default: 3
    pub db_retries: u32,
    /// Default: 1000 ms
    pub db_retry_delay: Duration,
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = match lookup(ENV_DB) {
            Some(path) => PathBuf::from(path),
            None => paths::database().ok_or(ConfigError::NoDataDir)?,
        };

        let defaults = Self::default();
        Ok(Self {
            addr: parse(&lookup, ENV_ADDR)?.unwrap_or(defaults.addr),
            db_path,
            log_level: parse(&lookup, ENV_LOG)?.unwrap_or(defaults.log_level),
            session_ttl_hours: parse(&lookup, ENV_SESSION_TTL_HOURS)?
                .filter(|h: &i64| *h > 0)
                .unwrap_or(defaults.session_ttl_hours),
            db_retries: parse(&lookup, ENV_DB_RETRIES)?.unwrap_or(defaults.db_retries),
            db_retry_delay: parse(&lookup, ENV_DB_RETRY_DELAY_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.db_retry_delay),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .max_retries(self.db_retries)
            .backoff(Backoff::Fixed(self.db_retry_delay))
    }

    pub fn marketplace_config(&self) -> MarketplaceConfig {
        MarketplaceConfig {
            session_ttl: chrono::Duration::hours(self.session_ttl_hours),
            ..MarketplaceConfig::default()
        }
    }

    /// Whether the database lives only in memory.
    pub fn in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        _ => Ok(None),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: PathBuf::from(":memory:"),
            log_level: LevelFilter::Info,
            session_ttl_hours: 24 * 7,
            db_retries: 3,
            db_retry_delay: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[(ENV_DB, ":memory:")])).unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert!(config.in_memory());
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.marketplace_config().session_ttl, chrono::Duration::days(7));
        assert_eq!(config.retry_policy().max_retries, 3);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_ADDR, "0.0.0.0:9000"),
            (ENV_DB, "/tmp/boudoir.db"),
            (ENV_LOG, "debug"),
            (ENV_SESSION_TTL_HOURS, "2"),
            (ENV_DB_RETRIES, "0"),
            (ENV_DB_RETRY_DELAY_MS, "50"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.session_ttl_hours, 2);
        assert_eq!(config.retry_policy().backoff, Backoff::Fixed(Duration::from_millis(50)));
    }

    #[test]
    fn test_invalid_value_names_the_variable() {
        let err = ServerConfig::from_lookup(lookup(&[(ENV_DB, ":memory:"), (ENV_DB_RETRIES, "many")])).unwrap_err();
        assert!(err.to_string().contains(ENV_DB_RETRIES));
    }
}
