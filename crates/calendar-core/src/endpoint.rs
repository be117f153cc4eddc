//! Endpoints: one boxed callable per service method.
//!
//! An endpoint set sits between the business-logic trait and the gRPC
//! handler. Handlers only ever see `Endpoint<Req, Resp>` values, so they can be
//! wired to any implementation of the service trait (or to a hand-written
//! closure in tests) without naming it.

use crate::Result;
use futures::future::BoxFuture;
use std::sync::Arc;

/// A single service method, erased to `Req -> Future<Result<Resp>>`.
pub type Endpoint<Req, Resp> = Arc<dyn Fn(Req) -> BoxFuture<'static, Result<Resp>> + Send + Sync>;

/// Builds an [`Endpoint`] that invokes `call` on a shared `service`.
///
/// `call` is usually a method projection such as
/// `|service, token| service.is_auth(token)`.
pub fn endpoint<S, Req, Resp, F>(service: Arc<S>, call: F) -> Endpoint<Req, Resp>
where
    S: ?Sized + Send + Sync + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
    F: for<'a> Fn(&'a S, Req) -> BoxFuture<'a, Result<Resp>> + Send + Sync + 'static,
{
    let call = Arc::new(call);
    Arc::new(move |req| {
        let service = Arc::clone(&service);
        let call = Arc::clone(&call);
        Box::pin(async move { call(&*service, req).await })
    })
}
