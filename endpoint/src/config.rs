use crate::errors::{Error, Result};
use std::fmt;
use std::time::Duration;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// How a request gets hold of a database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Check a connection out of a shared pool.
    Pool,
    /// Open a fresh connection for every request and close it afterwards.
    PerRequest,
}

impl std::str::FromStr for ConnectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pool" | "pooled" => Ok(ConnectionMode::Pool),
            "per-request" | "per_request" | "single" => Ok(ConnectionMode::PerRequest),
            other => Err(Error::Config(format!(
                "CONNECTION_MODE must be 'pool' or 'per-request', got '{}'",
                other
            ))),
        }
    }
}

/// Process configuration, read once at startup and passed down explicitly.
#[derive(Clone)]
pub struct Config {
    pub connection_string: String,
    pub secret: String,
    pub http_addr: String,
    pub connection_mode: ConnectionMode,
    pub pool_max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connection_string = required(&lookup, "CONNECTION_STRING")?;
        let secret = required(&lookup, "SECRET")?;

        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());

        let connection_mode = match lookup("CONNECTION_MODE") {
            Some(mode) => mode.parse()?,
            None => ConnectionMode::Pool,
        };

        let pool_max_connections =
            parse_or(&lookup, "POOL_MAX_CONNECTIONS", DEFAULT_POOL_MAX_CONNECTIONS)?;
        if pool_max_connections == 0 {
            return Err(Error::Config(
                "POOL_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        let acquire_timeout_secs =
            parse_or(&lookup, "ACQUIRE_TIMEOUT_SECS", DEFAULT_ACQUIRE_TIMEOUT_SECS)?;

        Ok(Config {
            connection_string,
            secret,
            http_addr,
            connection_mode,
            pool_max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }

    /// Host part of the connection string, for logging.
    pub fn database_host(&self) -> &str {
        self.connection_string
            .rsplit('@')
            .next()
            .filter(|_| self.connection_string.contains('@'))
            .unwrap_or("***")
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database_host())
            .field("secret", &"<redacted>")
            .field("http_addr", &self.http_addr)
            .field("connection_mode", &self.connection_mode)
            .field("pool_max_connections", &self.pool_max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{} must be set", key))),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("CONNECTION_STRING", "postgres://iot:pass@db:5432/iotdb"),
            ("SECRET", "s3cr3t"),
        ]))
        .unwrap();

        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.connection_mode, ConnectionMode::Pool);
        assert_eq!(config.pool_max_connections, 20);
        assert_eq!(config.acquire_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_connection_string() {
        let result = Config::from_lookup(lookup_from(&[("SECRET", "s3cr3t")]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("CONNECTION_STRING")));
    }

    #[test]
    fn test_empty_secret_is_missing() {
        let result = Config::from_lookup(lookup_from(&[
            ("CONNECTION_STRING", "postgres://localhost/iotdb"),
            ("SECRET", ""),
        ]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("SECRET")));
    }

    #[test]
    fn test_per_request_mode_and_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CONNECTION_STRING", "postgres://localhost/iotdb"),
            ("SECRET", "s3cr3t"),
            ("CONNECTION_MODE", "per-request"),
            ("POOL_MAX_CONNECTIONS", "3"),
            ("ACQUIRE_TIMEOUT_SECS", "2"),
            ("HTTP_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();

        assert_eq!(config.connection_mode, ConnectionMode::PerRequest);
        assert_eq!(config.pool_max_connections, 3);
        assert_eq!(config.acquire_timeout, Duration::from_secs(2));
        assert_eq!(config.http_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_values() {
        let base = [
            ("CONNECTION_STRING", "postgres://localhost/iotdb"),
            ("SECRET", "s3cr3t"),
        ];

        let bad_mode = [base[0], base[1], ("CONNECTION_MODE", "sometimes")];
        assert!(Config::from_lookup(lookup_from(&bad_mode)).is_err());

        let bad_pool = [base[0], base[1], ("POOL_MAX_CONNECTIONS", "lots")];
        assert!(Config::from_lookup(lookup_from(&bad_pool)).is_err());

        let zero_pool = [base[0], base[1], ("POOL_MAX_CONNECTIONS", "0")];
        assert!(Config::from_lookup(lookup_from(&zero_pool)).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_lookup(lookup_from(&[
            ("CONNECTION_STRING", "postgres://iot:hunter2@db:5432/iotdb"),
            ("SECRET", "s3cr3t"),
        ]))
        .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cr3t"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(config.database_host(), "db:5432/iotdb");
    }
}
