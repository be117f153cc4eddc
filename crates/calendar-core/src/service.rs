//! The account capability shared by both services.
//!
//! The account server implements [`AccountService`] over its repository and
//! token store. The web-api server consumes the same trait through
//! [`AccountClient`], which forwards every call over gRPC, so the aggregator's
//! session pass-through never depends on how accounts are stored.

use crate::{
    Result,
    proto::account::{ServiceStatusRequest, account_client},
    types::{Session, Token, User},
};
use core::time::Duration;
use tonic::transport::{Channel, Endpoint};

/// Authentication and session operations.
///
/// Implementations must be safe for unordered concurrent invocation; every
/// in-flight request shares one instance.
#[tonic::async_trait]
pub trait AccountService: Send + Sync + 'static {
    /// Returns the token when it belongs to a live session.
    async fn is_auth(&self, token: Token) -> Result<Token>;

    /// Creates an account and opens a session for it.
    async fn sign_up(&self, user: User) -> Result<Session>;

    /// Opens a session for existing credentials.
    async fn login(&self, user: User) -> Result<Session>;

    /// Closes the session behind `token`. Closing an unknown session succeeds.
    async fn logout(&self, token: Token) -> Result<()>;

    /// Deep status check of the service and its backends.
    async fn service_status(&self) -> Result<i32>;
}

/// [`AccountService`] backed by a remote account server.
///
/// Cloning is cheap: all clones multiplex over the same channel.
#[derive(Clone, Debug)]
pub struct AccountClient {
    inner: account_client::AccountClient<Channel>,
}

impl AccountClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: account_client::AccountClient::new(channel),
        }
    }

    /// Creates a client whose channel connects on first use.
    ///
    /// Only the address is validated here; an unreachable account server
    /// surfaces as `Unavailable` on the first call, bounded by
    /// `connect_timeout`. A server that accepts the connection but never
    /// answers fails the call after `request_timeout`.
    pub fn connect_lazy(
        url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> core::result::Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(url.to_string())?
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .connect_lazy();
        Ok(Self::new(channel))
    }
}

#[tonic::async_trait]
impl AccountService for AccountClient {
    async fn is_auth(&self, token: Token) -> Result<Token> {
        let reply = self
            .inner
            .clone()
            .is_auth(crate::proto::account::Token::from(token))
            .await?;
        Ok(reply.into_inner().into())
    }

    async fn sign_up(&self, user: User) -> Result<Session> {
        let reply = self
            .inner
            .clone()
            .sign_up(crate::proto::account::User::from(user))
            .await?;
        Ok(reply.into_inner().into())
    }

    async fn login(&self, user: User) -> Result<Session> {
        let reply = self
            .inner
            .clone()
            .login(crate::proto::account::User::from(user))
            .await?;
        Ok(reply.into_inner().into())
    }

    async fn logout(&self, token: Token) -> Result<()> {
        self.inner
            .clone()
            .logout(crate::proto::account::Token::from(token))
            .await?;
        Ok(())
    }

    async fn service_status(&self) -> Result<i32> {
        let reply = self
            .inner
            .clone()
            .service_status(ServiceStatusRequest {})
            .await?;
        Ok(reply.into_inner().status)
    }
}
