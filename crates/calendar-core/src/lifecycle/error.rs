use crate::config::ConfigError;
use core::time::Duration;
use tokio::task::JoinError;

/// Fatal errors raised before a service starts serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect database: {0}")]
    Database(#[source] sqlx::Error),

    #[error("failed to connect cache: {0}")]
    Cache(#[source] redis::RedisError),

    #[error("failed to prepare schema: {0}")]
    Schema(#[source] crate::Error),

    #[error("timed out connecting to {what} after {after:?}")]
    Timeout { what: &'static str, after: Duration },

    #[error("invalid upstream address {url}: {source}")]
    Upstream {
        url: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

/// Why a supervised task returned.
///
/// Only [`RunError::Signal`] is a graceful outcome; it is the normal way for
/// the signal watcher to end the group.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("received signal {0}")]
    Signal(&'static str),

    #[error("signal handler failed: {0}")]
    SignalHandler(#[source] std::io::Error),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("failed to build reflection service: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),

    #[error("task failed: {0}")]
    Join(#[from] JoinError),
}

impl RunError {
    /// Whether the process should still exit with status 0.
    pub fn is_graceful(&self) -> bool {
        matches!(self, Self::Signal(_))
    }
}
