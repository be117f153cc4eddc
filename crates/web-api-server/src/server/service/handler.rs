//! gRPC handler for the `calendar.webapi.WebApi` service.

use super::endpoints::Endpoints;
use calendar_core::proto::webapi::{
    AddEventReply, AddEventRequest, DeleteEventReply, DeleteEventRequest, ListEventReply,
    ListEventRequest, LogoutReply, Session, Token, User,
    web_api_server::{WebApi, WebApiServer},
};
use tonic::{Request, Response, Status, codec::CompressionEncoding};

#[derive(Clone)]
pub struct WebApiHandler {
    endpoints: Endpoints,
}

impl WebApiHandler {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }
}

#[tonic::async_trait]
impl WebApi for WebApiHandler {
    async fn add_event(
        &self,
        req: Request<AddEventRequest>,
    ) -> Result<Response<AddEventReply>, Status> {
        let Some(event) = req.into_inner().event else {
            return Err(Status::invalid_argument("event is required"));
        };
        let id = (self.endpoints.add_event)(event.into()).await?;
        Ok(Response::new(AddEventReply { id }))
    }

    async fn list_event(
        &self,
        req: Request<ListEventRequest>,
    ) -> Result<Response<ListEventReply>, Status> {
        let events = (self.endpoints.list_event)(req.into_inner().user_id).await?;
        Ok(Response::new(ListEventReply {
            events: events.into_iter().map(Into::into).collect(),
        }))
    }

    async fn delete_event(
        &self,
        req: Request<DeleteEventRequest>,
    ) -> Result<Response<DeleteEventReply>, Status> {
        let DeleteEventRequest { event_id, user_id } = req.into_inner();
        (self.endpoints.delete_event)((event_id, user_id)).await?;
        Ok(Response::new(DeleteEventReply {}))
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
}

pub fn build_web_api_service(handler: WebApiHandler) -> WebApiServer<WebApiHandler> {
    WebApiServer::new(handler)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}
