//! Settings from the environment (after `.env` is loaded) and tracing setup.

use crate::error::ConfigError;
use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://resource_api.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    /// Server errors reveal their detail to clients.
    pub development: bool,
    pub max_body_bytes: usize,
    pub db_max_connections: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            development: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars().collect())
    }

    /// `DATABASE_URL`, `BIND_ADDR`, `APP_ENV`, `MAX_BODY_BYTES`, `DB_MAX_CONNECTIONS`.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        Ok(Settings {
            database_url: get("DATABASE_URL")
                .map(str::to_string)
                .unwrap_or(defaults.database_url),
            bind_addr: get("BIND_ADDR")
                .map(str::to_string)
                .unwrap_or(defaults.bind_addr),
            development: get("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("development") || v.eq_ignore_ascii_case("dev"))
                .unwrap_or(defaults.development),
            max_body_bytes: parse_or("MAX_BODY_BYTES", get("MAX_BODY_BYTES"), defaults.max_body_bytes)?,
            db_max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                get("DB_MAX_CONNECTIONS"),
                defaults.db_max_connections,
            )?,
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<&str>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidSetting {
            key,
            value: v.to_string(),
        }),
    }
}

/// Install the fmt subscriber; `RUST_LOG` wins over `default_directive`.
pub fn init_tracing(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(Settings::from_vars(HashMap::new()).unwrap(), Settings::default());
    }

    #[test]
    fn reads_every_setting() {
        let s = Settings::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/app"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("APP_ENV", "Development"),
            ("MAX_BODY_BYTES", "2048"),
            ("DB_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(s.database_url, "postgres://localhost/app");
        assert_eq!(s.bind_addr, "0.0.0.0:8080");
        assert!(s.development);
        assert_eq!(s.max_body_bytes, 2048);
        assert_eq!(s.db_max_connections, 12);
    }

    #[test]
    fn production_hides_detail() {
        let s = Settings::from_vars(vars(&[("APP_ENV", "production")])).unwrap();
        assert!(!s.development);
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        let err = Settings::from_vars(vars(&[("MAX_BODY_BYTES", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "MAX_BODY_BYTES", .. }));
    }
}
