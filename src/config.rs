//! Environment-driven service configuration.

use std::{net::SocketAddr, path::PathBuf};

use crate::{codec::DEFAULT_TICKET_PREFIX, runtime::handle::RuntimeConfig};

/// Origins of the scanner frontend during local development.
pub const DEV_ORIGINS: &[&str] = &[
    "http://localhost",
    "http://localhost:5173",
    "http://127.0.0.1",
    "http://127.0.0.1:5173",
    "http://0.0.0.0",
    "http://0.0.0.0:5173",
];

/// Rejected configuration input.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `key` is set but `value` cannot be used.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Environment variable name.
        key: &'static str,
        /// Offending value as read.
        value: String,
    },
}

/// Check-in service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address of the HTTP server.
    pub http_addr: SocketAddr,
    /// Pre-imported registration dataset (read-only).
    pub registration_db: PathBuf,
    /// Attendance journal owned by this process.
    pub attendance_db: PathBuf,
    /// Prefix prepended to scanned ticket digits.
    pub ticket_prefix: String,
    /// Browser origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Bound of the ledger writer's command queue.
    pub ledger_queue: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            registration_db: PathBuf::from("db/registrations.db"),
            attendance_db: PathBuf::from("db/attendance.db"),
            ticket_prefix: DEFAULT_TICKET_PREFIX.to_string(),
            cors_origins: DEV_ORIGINS.iter().map(|o| o.to_string()).collect(),
            log_level: "info".to_string(),
            ledger_queue: RuntimeConfig::default().queue_bound,
        }
    }
}

impl Config {
    /// Reads `CHECKIN_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for unset keys.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("CHECKIN_HTTP_ADDR") {
            config.http_addr = v.parse().map_err(|_| ConfigError::Invalid {
                key: "CHECKIN_HTTP_ADDR",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("CHECKIN_REGISTRATION_DB") {
            config.registration_db = PathBuf::from(v);
        }
        if let Some(v) = lookup("CHECKIN_ATTENDANCE_DB") {
            config.attendance_db = PathBuf::from(v);
        }
        if let Some(v) = lookup("CHECKIN_TICKET_PREFIX") {
            if v.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: "CHECKIN_TICKET_PREFIX",
                    value: v,
                });
            }
            config.ticket_prefix = v.trim().to_string();
        }
        if let Some(v) = lookup("CHECKIN_CORS_ORIGINS") {
            config.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("CHECKIN_LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("CHECKIN_LEDGER_QUEUE") {
            config.ledger_queue = match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "CHECKIN_LEDGER_QUEUE",
                        value: v,
                    });
                }
            };
        }

        Ok(config)
    }

    /// Ledger runtime sizing derived from this config.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            queue_bound: self.ledger_queue,
            ..RuntimeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.http_addr.port(), 8000);
        assert_eq!(config.ticket_prefix, "GOOGA26");
        assert_eq!(config.cors_origins.len(), DEV_ORIGINS.len());
        assert_eq!(config.runtime_config().queue_bound, 256);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = from_pairs(&[
            ("CHECKIN_HTTP_ADDR", "127.0.0.1:9100"),
            ("CHECKIN_ATTENDANCE_DB", "/tmp/att.db"),
            ("CHECKIN_CORS_ORIGINS", "https://desk.example, ,https://b.example"),
            ("CHECKIN_LEDGER_QUEUE", "8"),
        ])
        .unwrap();
        assert_eq!(config.http_addr.port(), 9100);
        assert_eq!(config.attendance_db, PathBuf::from("/tmp/att.db"));
        assert_eq!(
            config.cors_origins,
            vec!["https://desk.example", "https://b.example"]
        );
        assert_eq!(config.ledger_queue, 8);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(from_pairs(&[("CHECKIN_HTTP_ADDR", "nope")]).is_err());
        assert!(from_pairs(&[("CHECKIN_LEDGER_QUEUE", "0")]).is_err());
        assert!(from_pairs(&[("CHECKIN_TICKET_PREFIX", "  ")]).is_err());
    }
}
