//! gRPC handler for the `calendar.account.Account` service.
//!
//! [`AccountHandler`] is a thin adapter: it decodes the protobuf request into
//! a domain value, calls the matching endpoint and encodes the reply.
//! Request-level failures are converted to `tonic::Status` through
//! `calendar_core::Error`.

use super::endpoints::Endpoints;
use calendar_core::proto::account::{
    LogoutReply, ServiceStatusReply, ServiceStatusRequest, Session, Token, User,
    account_server::{Account, AccountServer},
};
use tonic::{Request, Response, Status, codec::CompressionEncoding};

#[derive(Clone)]
pub struct AccountHandler {
    endpoints: Endpoints,
}

impl AccountHandler {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }
}

#[tonic::async_trait]
impl Account for AccountHandler {
    async fn is_auth(&self, req: Request<Token>) -> Result<Response<Token>, Status> {
        let token = (self.endpoints.is_auth)(req.into_inner().into()).await?;
        Ok(Response::new(token.into()))
    }

    async fn sign_up(&self, req: Request<User>) -> Result<Response<Session>, Status> {
        let session = (self.endpoints.sign_up)(req.into_inner().into()).await?;
        Ok(Response::new(session.into()))
    }

    async fn login(&self, req: Request<User>) -> Result<Response<Session>, Status> {
        let session = (self.endpoints.login)(req.into_inner().into()).await?;
        Ok(Response::new(session.into()))
    }

    async fn logout(&self, req: Request<Token>) -> Result<Response<LogoutReply>, Status> {
        (self.endpoints.logout)(req.into_inner().into()).await?;
        Ok(Response::new(LogoutReply {}))
    }

    async fn service_status(
        &self,
        _req: Request<ServiceStatusRequest>,
    ) -> Result<Response<ServiceStatusReply>, Status> {
        let status = (self.endpoints.service_status)(()).await?;
        Ok(Response::new(ServiceStatusReply { status }))
    }
}

/// Wraps the handler in the generated server with compression enabled.
pub fn build_account_service(handler: AccountHandler) -> AccountServer<AccountHandler> {
    AccountServer::new(handler)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}
