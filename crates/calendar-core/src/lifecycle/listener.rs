//! The transport listener and its lifecycle.
//!
//! ```text
//! Created --bind--> Listening --serve--> Serving --close--> Closed
//!    |
//!    +-- bind error: fatal, never retried
//! ```
//!
//! [`GrpcListener::bind`] owns the only listening socket of the process.
//! [`GrpcListener::serve`] hands the accepted connections and a close signal
//! to the caller's server future and reports `Closed` when it returns, whether
//! the close was requested through [`GrpcListener::closer`] or the server
//! stopped on its own. Once closed, in-flight requests get at most the drain
//! timeout to finish before the server future is dropped.

use super::{RunError, StartupError};
use core::time::Duration;
use std::{net::SocketAddr, pin::pin};
use tokio::{net::TcpListener, sync::watch};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// How long a closed listener waits for in-flight requests by default.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a listener is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Listening,
    Serving,
    Closed,
}

/// A bound gRPC listening socket.
#[derive(Debug)]
pub struct GrpcListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: watch::Sender<ServerState>,
    close: CancellationToken,
    drain_timeout: Duration,
}

impl GrpcListener {
    /// Binds `addr`. A failure (port in use, bad address) is fatal.
    pub async fn bind(addr: &str) -> Result<Self, StartupError> {
        let (state, _) = watch::channel(ServerState::Created);
        let bind_error = |source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        state.send_replace(ServerState::Listening);
        tracing::info!(transport = "gRPC", addr = %local_addr, "listening");

        Ok(Self {
            listener,
            local_addr,
            state,
            close: CancellationToken::new(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        })
    }

    /// Bounds how long [`GrpcListener::serve`] keeps draining in-flight
    /// requests after the listener is closed.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// The address actually bound, which differs from the configured one
    /// when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that closes the listener. Cancelling it more than once, or
    /// after the server already stopped, does nothing.
    pub fn closer(&self) -> CancellationToken {
        self.close.clone()
    }

    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Runs `serve` over the accepted connections until it returns.
    ///
    /// `serve` receives the incoming connection stream and a future that
    /// resolves when the listener is closed; it is expected to pass both to
    /// `Router::serve_with_incoming_shutdown`. After the close, the server
    /// has the drain timeout to return; past that it is dropped along with
    /// whatever requests are still pending, and the listener reports `Closed`.
    pub async fn serve<F, Fut>(self, serve: F) -> Result<(), RunError>
    where
        F: FnOnce(TcpListenerStream, WaitForCancellationFutureOwned) -> Fut,
        Fut: Future<Output = Result<(), tonic::transport::Error>>,
    {
        let Self {
            listener,
            local_addr,
            state,
            close,
            drain_timeout,
        } = self;

        state.send_replace(ServerState::Serving);
        tracing::info!(transport = "gRPC", addr = %local_addr, "serving");

        let mut server = pin!(serve(
            TcpListenerStream::new(listener),
            close.clone().cancelled_owned()
        ));
        let result = tokio::select! {
            result = &mut server => result,
            () = close.cancelled() => {
                match tokio::time::timeout(drain_timeout, &mut server).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            transport = "gRPC",
                            addr = %local_addr,
                            timeout = ?drain_timeout,
                            "drain timed out, dropping in-flight requests"
                        );
                        Ok(())
                    }
                }
            }
        };

        close.cancel();
        state.send_replace(ServerState::Closed);
        match &result {
            Ok(()) => tracing::info!(transport = "gRPC", addr = %local_addr, "closed"),
            Err(err) => {
                tracing::error!(transport = "gRPC", addr = %local_addr, error = %err, "closed")
            }
        }

        result.map_err(RunError::from)
    }
}
