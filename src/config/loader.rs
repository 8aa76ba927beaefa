//! Load [`HostConfig`] from environment variables (after `.env`, see `main`).

use crate::config::types::{HostConfig, Preset};
use crate::cors::CorsPolicy;
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

impl HostConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; the preset supplies defaults, individual keys override them.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let preset = match get("APP_PRESET") {
            Some(v) => Preset::from_str(&v)?,
            None => Preset::Bootstrap,
        };
        let mut cfg = HostConfig::preset(preset);

        if let Some(v) = get("APP_TITLE") {
            cfg.title = v;
        }
        if let Some(v) = get("APP_GREETING") {
            cfg.greeting = v;
        }
        if let Some(v) = get("APP_BIND") {
            cfg.bind = SocketAddr::from_str(v.trim()).map_err(|_| ConfigError::InvalidValue {
                key: "APP_BIND",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("APP_CORS") {
            cfg.cors = parse_bool("APP_CORS", &v)?.then(CorsPolicy::permissive);
        }
        if let Some(v) = get("APP_HEALTH") {
            cfg.health = parse_bool("APP_HEALTH", &v)?;
        }
        if let Some(v) = get("APP_SCHEMA_INIT") {
            cfg.schema_init = parse_bool("APP_SCHEMA_INIT", &v)?;
        }
        if let Some(v) = get("APP_BODY_LIMIT") {
            cfg.body_limit = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "APP_BODY_LIMIT",
                value: v.clone(),
            })?;
        }

        cfg.database_url = get("DATABASE_URL");
        if let Some(v) = get("DB_SCHEMA") {
            cfg.db_schema = v;
        }
        if let Some(v) = get("DB_CREATE") {
            cfg.create_database = parse_bool("DB_CREATE", &v)?;
        }
        cfg.catalog_path = get("SCHEMA_CATALOG").map(PathBuf::from);

        if cfg.schema_init && cfg.database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL"));
        }
        Ok(cfg)
    }
}

pub fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
