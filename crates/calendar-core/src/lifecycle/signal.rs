//! SIGINT/SIGTERM as a supervised task.
//!
//! Handlers are installed eagerly by [`SignalWatcher::install`], before the
//! service reports itself healthy, so a signal can never hit the default
//! disposition once clients can see the process. Tokio keeps the handlers
//! registered for the rest of the process lifetime: signals delivered after
//! the watcher has returned (a second Ctrl+C during teardown) are absorbed
//! instead of killing the process half-way through shutdown.

use super::RunError;
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Waits for SIGINT or SIGTERM, or for its token to be cancelled.
pub struct SignalWatcher {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl SignalWatcher {
    /// Installs the process signal handlers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Resolves with [`RunError::Signal`] when a signal arrives, or with
    /// `Ok(())` once `cancel` is cancelled.
    #[cfg(unix)]
    pub async fn wait(mut self, cancel: CancellationToken) -> Result<(), RunError> {
        tokio::select! {
            _ = self.interrupt.recv() => {
                tracing::info!(signal = "SIGINT", "received shutdown signal");
                Err(RunError::Signal("SIGINT"))
            },
            _ = self.terminate.recv() => {
                tracing::info!(signal = "SIGTERM", "received shutdown signal");
                Err(RunError::Signal("SIGTERM"))
            },
            () = cancel.cancelled() => {
                tracing::debug!("signal watcher cancelled");
                Ok(())
            },
        }
    }

    #[cfg(not(unix))]
    pub async fn wait(self, cancel: CancellationToken) -> Result<(), RunError> {
        tokio::select! {
            received = tokio::signal::ctrl_c() => match received {
                Ok(()) => {
                    tracing::info!(signal = "SIGINT", "received shutdown signal");
                    Err(RunError::Signal("SIGINT"))
                }
                Err(err) => Err(RunError::SignalHandler(err)),
            },
            () = cancel.cancelled() => {
                tracing::debug!("signal watcher cancelled");
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[tokio::test]
    async fn cancellation_unblocks_the_watcher() {
        let watcher = SignalWatcher::install().unwrap();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(watcher.wait(cancel.clone()));

        cancel.cancel();
        // A second cancel is a no-op.
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("watcher should return once cancelled")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn already_cancelled_token_returns_immediately() {
        let watcher = SignalWatcher::install().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(watcher.wait(cancel).await.is_ok());
    }

    #[test]
    fn only_signals_are_graceful() {
        assert!(RunError::Signal("SIGTERM").is_graceful());
        assert!(
            !RunError::SignalHandler(std::io::Error::other("no handler")).is_graceful()
        );
    }
}
