//! Host configuration and the three entry-point presets.

use crate::cors::CorsPolicy;
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const GREETING: &str = "Backend is running successfully";
pub const GREETING_EXCLAIMED: &str = "Backend is running successfully!";
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// The entry-point variants, as configurations of one host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Plain greeting, no CORS, creates tables at startup.
    Bootstrap,
    /// Exclaimed greeting behind a permissive CORS policy.
    Cors,
    /// Like `Cors`, plus `GET /health`.
    Health,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bootstrap" | "a" => Ok(Preset::Bootstrap),
            "cors" | "b" => Ok(Preset::Cors),
            "health" | "c" => Ok(Preset::Health),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_PRESET",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HostConfig {
    pub title: String,
    pub greeting: String,
    pub health: bool,
    pub cors: Option<CorsPolicy>,
    pub schema_init: bool,
    pub bind: SocketAddr,
    pub database_url: Option<String>,
    pub db_schema: String,
    pub create_database: bool,
    pub catalog_path: Option<PathBuf>,
    pub body_limit: usize,
}

impl HostConfig {
    pub fn preset(preset: Preset) -> Self {
        let (greeting, cors, health, schema_init) = match preset {
            Preset::Bootstrap => (GREETING, false, false, true),
            Preset::Cors => (GREETING_EXCLAIMED, true, false, false),
            Preset::Health => (GREETING_EXCLAIMED, true, true, false),
        };
        Self {
            title: env!("CARGO_PKG_NAME").into(),
            greeting: greeting.into(),
            health,
            cors: cors.then(CorsPolicy::permissive),
            schema_init,
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_url: None,
            db_schema: "public".into(),
            create_database: false,
            catalog_path: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_names() {
        assert_eq!("bootstrap".parse::<Preset>().unwrap(), Preset::Bootstrap);
        assert_eq!(" CORS ".parse::<Preset>().unwrap(), Preset::Cors);
        assert_eq!("c".parse::<Preset>().unwrap(), Preset::Health);
        assert!("d".parse::<Preset>().is_err());
    }

    #[test]
    fn presets_differ_only_where_the_entry_points_did() {
        let a = HostConfig::preset(Preset::Bootstrap);
        assert_eq!(a.greeting, "Backend is running successfully");
        assert!(a.cors.is_none() && !a.health && a.schema_init);

        let b = HostConfig::preset(Preset::Cors);
        assert_eq!(b.greeting, "Backend is running successfully!");
        assert_eq!(b.cors, Some(CorsPolicy::permissive()));
        assert!(!b.health && !b.schema_init);

        let c = HostConfig::preset(Preset::Health);
        assert_eq!(c.greeting, b.greeting);
        assert!(c.cors.is_some() && c.health && !c.schema_init);
        assert_eq!(c.bind.to_string(), DEFAULT_BIND);
    }
}
