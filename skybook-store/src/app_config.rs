use serde::Deserialize;
use skybook_core::HashingParams;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: HashingParams,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// Applied as `statement_timeout` and `idle_in_transaction_session_timeout`
    /// to every ledger transaction
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    pub retry_transient: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self { retry_transient: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "skybook=info,sqlx=warn".to_string(),
        }
    }
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_transaction_timeout() -> u64 { 5000 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SKYBOOK__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("SKYBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/skybook"
            "#,
        );
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.transaction_timeout_ms, 5000);
        assert_eq!(config.auth, HashingParams::default());
        assert!(config.booking.retry_transient);
        assert_eq!(config.logging.filter, "skybook=info,sqlx=warn");
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = parse(
            r#"
            [database]
            url = "postgres://db/skybook"
            max_connections = 20
            transaction_timeout_ms = 250

            [auth]
            memory_kib = 1024
            iterations = 1
            parallelism = 1

            [booking]
            retry_transient = false

            [logging]
            filter = "debug"
            "#,
        );
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.transaction_timeout_ms, 250);
        assert_eq!(config.auth.memory_kib, 1024);
        assert!(!config.booking.retry_transient);
        assert_eq!(config.logging.filter, "debug");
    }
}
