//! Named-section configuration loading.
//!
//! Each service reads one table (for example `[account_service]`) out of a
//! shared TOML file and deserializes it into its own raw config struct. Any
//! failure is a [`ConfigError`]; callers treat it as fatal.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config section `{key}` is missing")]
    MissingSection { key: String },

    #[error("config section `{key}` is invalid: {source}")]
    Section {
        key: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Reads `path` and deserializes the table stored under `key`.
pub fn load_section<T: DeserializeOwned>(path: &Path, key: &str) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    section_from_str(&contents, key).map_err(|err| match err {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Same as [`load_section`] for an in-memory document.
pub fn section_from_str<T: DeserializeOwned>(contents: &str, key: &str) -> Result<T, ConfigError> {
    let mut table: toml::Table = contents.parse().map_err(|source| ConfigError::Parse {
        path: PathBuf::new(),
        source,
    })?;
    let section = table
        .remove(key)
        .ok_or_else(|| ConfigError::MissingSection {
            key: key.to_string(),
        })?;
    section.try_into().map_err(|source| ConfigError::Section {
        key: key.to_string(),
        source,
    })
}

/// Joins a host and port into an address, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

pub fn ensure(condition: bool, reason: impl Into<String>) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            reason: reason.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        grpc_host: String,
        grpc_port: u16,
    }

    #[test]
    fn reads_the_named_section() {
        let doc = r#"
            [other_service]
            grpc_host = "10.0.0.1"
            grpc_port = 1

            [sample_service]
            grpc_host = "127.0.0.1"
            grpc_port = 50051
        "#;
        let sample: Sample = section_from_str(doc, "sample_service").unwrap();
        assert_eq!(
            sample,
            Sample {
                grpc_host: "127.0.0.1".into(),
                grpc_port: 50051,
            }
        );
    }

    #[test]
    fn missing_section_is_an_error() {
        let err = section_from_str::<Sample>("[other]\nx = 1\n", "sample_service").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { key } if key == "sample_service"));
    }

    #[test]
    fn wrong_field_types_are_an_error() {
        let doc = "[sample_service]\ngrpc_host = \"h\"\ngrpc_port = \"not a port\"\n";
        let err = section_from_str::<Sample>(doc, "sample_service").unwrap_err();
        assert!(matches!(err, ConfigError::Section { .. }));
    }

    #[test]
    fn unreadable_and_malformed_files_are_errors() {
        let missing = Path::new("/definitely/not/here.toml");
        assert!(matches!(
            load_section::<Sample>(missing, "sample_service"),
            Err(ConfigError::Read { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is = = not toml").unwrap();
        let err = load_section::<Sample>(file.path(), "sample_service").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path, .. } if path == file.path()));
    }

    #[test]
    fn joins_host_and_port() {
        assert_eq!(join_host_port("0.0.0.0", 50051), "0.0.0.0:50051");
        assert_eq!(join_host_port("::1", 50051), "[::1]:50051");
        assert_eq!(join_host_port("[::1]", 50051), "[::1]:50051");
        assert_eq!(join_host_port("localhost", 0), "localhost:0");
    }
}
