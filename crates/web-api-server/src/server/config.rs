use calendar_core::{
    config::{ConfigError, ensure, join_host_port, load_section},
    storage::DatabaseTarget,
};
use clap::Parser;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub const CONFIG_KEY: &str = "web_api_service";

/// Command line of the `web-api-server` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "web-api-server",
    version,
    about = "gRPC and gRPC-Web aggregator for the calendar backend"
)]
pub struct CliArgs {
    /// Path to the TOML configuration file.
    ///
    /// The service reads the `[web_api_service]` table from it.
    ///
    /// Environment variable: `CALENDAR_CONFIG`
    #[arg(long, env = "CALENDAR_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(alias = "GRPCHost")]
    pub grpc_host: String,
    #[serde(alias = "GRPCPort")]
    pub grpc_port: u16,
    pub database_url: String,
    pub account_service_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_db_connections")]
    pub max_db_connections: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_max_db_connections() -> u32 {
    10
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// Validated web-api settings.
#[derive(Debug, Clone)]
pub struct WebApiServiceConfig {
    pub grpc_addr: String,
    pub database: DatabaseTarget,
    pub account_service_url: String,
    pub connect_timeout: Duration,
    pub max_db_connections: u32,
    /// Deadline for each call forwarded to the account service.
    pub request_timeout: Duration,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout: Duration,
}

impl WebApiServiceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_section::<RawConfig>(path, CONFIG_KEY)?.try_into()
    }
}

impl TryFrom<RawConfig> for WebApiServiceConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        ensure(!raw.grpc_host.trim().is_empty(), "grpc_host must not be empty")?;
        // The upstream channel is built without TLS support.
        ensure(
            raw.account_service_url.starts_with("http://"),
            "account_service_url must use http://",
        )?;
        ensure(
            raw.connect_timeout_secs > 0,
            "connect_timeout_secs must be greater than 0",
        )?;
        ensure(
            raw.max_db_connections > 0,
            "max_db_connections must be greater than 0",
        )?;
        ensure(
            raw.request_timeout_secs > 0,
            "request_timeout_secs must be greater than 0",
        )?;

        Ok(Self {
            grpc_addr: join_host_port(raw.grpc_host.trim(), raw.grpc_port),
            database: raw.database_url.parse()?,
            account_service_url: raw.account_service_url,
            connect_timeout: Duration::from_secs(raw.connect_timeout_secs),
            max_db_connections: raw.max_db_connections,
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            shutdown_timeout: Duration::from_secs(raw.shutdown_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_core::config::section_from_str;

    fn parse(doc: &str) -> Result<WebApiServiceConfig, ConfigError> {
        section_from_str::<RawConfig>(doc, CONFIG_KEY)?.try_into()
    }

    #[test]
    fn parses_a_full_section() {
        let config = parse(
            r#"
            [account_service]
            grpc_host = "ignored"

            [web_api_service]
            GRPCHost = "127.0.0.1"
            GRPCPort = 50052
            database_url = "memory://"
            account_service_url = "http://127.0.0.1:50051"
            max_db_connections = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.grpc_addr, "127.0.0.1:50052");
        assert_eq!(config.database, DatabaseTarget::Memory);
        assert_eq!(config.account_service_url, "http://127.0.0.1:50051");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_db_connections, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn account_url_must_be_plaintext() {
        let err = parse(
            r#"
            [web_api_service]
            grpc_host = "127.0.0.1"
            grpc_port = 50052
            database_url = "memory://"
            account_service_url = "https://accounts.internal:50051"
            "#,
        )
        .unwrap_err();
        assert!(
            matches!(&err, ConfigError::Invalid { reason } if reason.contains("http://")),
            "{err}"
        );
    }

    #[test]
    fn account_url_needs_a_scheme() {
        let err = parse(
            r#"
            [web_api_service]
            grpc_host = "127.0.0.1"
            grpc_port = 50052
            database_url = "memory://"
            account_service_url = "127.0.0.1:50051"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn section_must_be_present() {
        let err = parse("[account_service]\ngrpc_host = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { key } if key == CONFIG_KEY));
    }

    #[test]
    fn port_out_of_range_is_rejected() {
        let err = parse(
            r#"
            [web_api_service]
            grpc_host = "127.0.0.1"
            grpc_port = 70000
            database_url = "memory://"
            account_service_url = "http://127.0.0.1:50051"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Section { .. }));
    }
}
