use calendar_core::{
    config::{ConfigError, ensure, join_host_port, load_section},
    storage::{CacheTarget, DatabaseTarget},
};
use clap::Parser;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Config file section read by this service.
pub const CONFIG_KEY: &str = "account_service";

/// Command line of the `account-server` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "account-server",
    version,
    about = "gRPC account service for the calendar backend"
)]
pub struct CliArgs {
    /// Path to the TOML configuration file.
    ///
    /// The service reads the `[account_service]` table from it.
    ///
    /// Environment variable: `CALENDAR_CONFIG`
    #[arg(long, env = "CALENDAR_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,
}

/// The `[account_service]` table as written in the file.
///
/// `GRPCHost` / `GRPCPort` are accepted as aliases for the snake_case keys.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(alias = "GRPCHost")]
    pub grpc_host: String,
    #[serde(alias = "GRPCPort")]
    pub grpc_port: u16,
    pub database_url: String,
    pub cache_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_db_connections")]
    pub max_db_connections: u32,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_max_db_connections() -> u32 {
    10
}

const fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

const fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// Validated account service settings. Read once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    pub grpc_addr: String,
    pub database: DatabaseTarget,
    pub cache: CacheTarget,
    pub connect_timeout: Duration,
    pub max_db_connections: u32,
    pub token_ttl: Duration,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout: Duration,
}

impl AccountServiceConfig {
    /// Loads and validates the `[account_service]` section of `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_section::<RawConfig>(path, CONFIG_KEY)?.try_into()
    }
}

impl TryFrom<RawConfig> for AccountServiceConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        ensure(!raw.grpc_host.trim().is_empty(), "grpc_host must not be empty")?;
        ensure(
            raw.connect_timeout_secs > 0,
            "connect_timeout_secs must be greater than 0",
        )?;
        ensure(
            raw.max_db_connections > 0,
            "max_db_connections must be greater than 0",
        )?;
        ensure(raw.token_ttl_secs > 0, "token_ttl_secs must be greater than 0")?;

        Ok(Self {
            grpc_addr: join_host_port(raw.grpc_host.trim(), raw.grpc_port),
            database: raw.database_url.parse()?,
            cache: raw.cache_url.parse()?,
            connect_timeout: Duration::from_secs(raw.connect_timeout_secs),
            max_db_connections: raw.max_db_connections,
            token_ttl: Duration::from_secs(raw.token_ttl_secs),
            shutdown_timeout: Duration::from_secs(raw.shutdown_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_core::config::section_from_str;

    fn parse(doc: &str) -> Result<AccountServiceConfig, ConfigError> {
        section_from_str::<RawConfig>(doc, CONFIG_KEY)?.try_into()
    }

    #[test]
    fn applies_defaults() {
        let config = parse(
            r#"
            [account_service]
            grpc_host = "0.0.0.0"
            grpc_port = 50051
            database_url = "memory://"
            cache_url = "memory://"
            "#,
        )
        .unwrap();

        assert_eq!(config.grpc_addr, "0.0.0.0:50051");
        assert_eq!(config.database, DatabaseTarget::Memory);
        assert_eq!(config.cache, CacheTarget::Memory);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_db_connections, 10);
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn accepts_legacy_key_names() {
        let config = parse(
            r#"
            [account_service]
            GRPCHost = "::1"
            GRPCPort = 6000
            database_url = "postgres://calendar@db/calendar"
            cache_url = "redis://cache:6379/"
            "#,
        )
        .unwrap();

        assert_eq!(config.grpc_addr, "[::1]:6000");
        assert!(matches!(config.database, DatabaseTarget::Postgres(_)));
        assert!(matches!(config.cache, CacheTarget::Redis(_)));
    }

    #[test]
    fn rejects_invalid_values() {
        let base = |extra: &str, db: &str| {
            format!(
                "[account_service]\ngrpc_host = \"127.0.0.1\"\ngrpc_port = 1\ndatabase_url = \"{db}\"\ncache_url = \"memory://\"\n{extra}"
            )
        };

        assert!(matches!(
            parse(&base("connect_timeout_secs = 0", "memory://")),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            parse(&base("", "sqlite://calendar.db")),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            parse(&base("token_ttl_secs = 0", "memory://")),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn missing_keys_are_rejected() {
        let err = parse("[account_service]\ngrpc_host = \"127.0.0.1\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Section { .. }));
    }
}
