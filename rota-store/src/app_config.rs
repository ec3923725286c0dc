use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Without a URL the in-memory store is used
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AvailabilityConfig {
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    #[serde(default = "default_window_months")]
    pub window_months: u32,
    #[serde(default)]
    pub date_level: DateLevelConfig,
}

fn default_polling_interval_ms() -> u64 { 30_000 }
fn default_window_months() -> u32 { 3 }

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: default_polling_interval_ms(),
            window_months: default_window_months(),
            date_level: DateLevelConfig::default(),
        }
    }
}

/// Upper bounds of the "low" and "medium" calendar buckets, in open slots
#[derive(Debug, Deserialize, Clone)]
pub struct DateLevelConfig {
    pub low_max: u32,
    pub medium_max: u32,
}

impl Default for DateLevelConfig {
    fn default() -> Self {
        Self { low_max: 1, medium_max: 3 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 1800,
            sweep_interval_seconds: 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `ROTA__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("ROTA").separator("__"))
            .build()?;

        Self::from_source(s)
    }

    fn from_source(source: config::Config) -> Result<Self, config::ConfigError> {
        let cfg: Self = source.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Intervals feed `tokio::time::interval`, which rejects zero
    fn validate(&self) -> Result<(), config::ConfigError> {
        let zero = [
            ("availability.polling_interval_ms", self.availability.polling_interval_ms),
            ("sessions.ttl_seconds", self.sessions.ttl_seconds),
            ("sessions.sweep_interval_seconds", self.sessions.sweep_interval_seconds),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);

        match zero {
            Some((key, _)) => Err(config::ConfigError::Message(format!("{key} must be greater than zero"))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn try_parse(toml: &str) -> Result<Config, config::ConfigError> {
        let source = config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Config::from_source(source)
    }

    fn parse(toml: &str) -> Config {
        try_parse(toml).unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = parse("[server]\nport = 3000\n");
        assert_eq!(cfg.server.port, 3000);
        assert!(cfg.database.url.is_none());
        assert_eq!(cfg.availability.polling_interval_ms, 30_000);
        assert_eq!(cfg.availability.window_months, 3);
        assert_eq!(cfg.availability.date_level.medium_max, 3);
        assert_eq!(cfg.sessions.ttl_seconds, 1800);
    }

    #[test]
    fn test_overrides() {
        let cfg = parse(
            r#"
            [server]
            port = 8080

            [database]
            url = "postgres://localhost/rota"

            [availability]
            polling_interval_ms = 10000

            [availability.date_level]
            low_max = 2
            medium_max = 6
            "#,
        );
        assert_eq!(cfg.database.url.as_deref(), Some("postgres://localhost/rota"));
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.availability.polling_interval_ms, 10_000);
        assert_eq!(cfg.availability.window_months, 3);
        assert_eq!(cfg.availability.date_level.low_max, 2);
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        let err = try_parse("[server]\nport = 3000\n[availability]\npolling_interval_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("availability.polling_interval_ms"));

        let err = try_parse(
            "[server]\nport = 3000\n[sessions]\nttl_seconds = 600\nsweep_interval_seconds = 0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("sessions.sweep_interval_seconds"));
    }
}
