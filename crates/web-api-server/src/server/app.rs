//! Bootstrap and supervision of the web-api process.
//!
//! Same shape as the account service: every fallible startup step happens in
//! [`Application::build`], and [`Application::run`] supervises the serve loop
//! and the signal watcher in one [`Group`]. The only upstream, the account
//! service, is reached through a lazily connected channel, so it does not
//! have to be up for this process to start.

use crate::server::{
    calendar::Calendar,
    config::WebApiServiceConfig,
    repository::EventRepository,
    service::{
        endpoints::Endpoints,
        handler::{WebApiHandler, build_web_api_service},
    },
};
use calendar_core::{
    lifecycle::{Group, GrpcListener, RunError, ServerState, SignalWatcher, StartupError},
    proto::{FILE_DESCRIPTOR_SET, webapi::web_api_server::WebApiServer},
    service::AccountClient,
    storage::connect_database,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

type WebApiGrpc = WebApiServer<WebApiHandler>;

pub struct Application {
    handler: WebApiHandler,
    listener: GrpcListener,
    signals: SignalWatcher,
}

impl Application {
    pub async fn build(config: WebApiServiceConfig) -> Result<Self, StartupError> {
        tracing::debug!(?config, "starting web-api service");

        let database = connect_database(
            &config.database,
            config.max_db_connections,
            config.connect_timeout,
        )
        .await?;
        let events = EventRepository::from_database(&database)
            .await
            .map_err(StartupError::Schema)?;

        let accounts = AccountClient::connect_lazy(
            &config.account_service_url,
            config.connect_timeout,
            config.request_timeout,
        )
        .map_err(|source| StartupError::Upstream {
            url: config.account_service_url.clone(),
            source,
        })?;
        tracing::info!(url = %config.account_service_url, "account service client ready");

        let service = Arc::new(Calendar::new(events, Arc::new(accounts)));
        let handler = WebApiHandler::new(Endpoints::new(service));

        let signals = SignalWatcher::install().map_err(StartupError::Signal)?;
        let listener = GrpcListener::bind(&config.grpc_addr)
            .await?
            .with_drain_timeout(config.shutdown_timeout);

        Ok(Self {
            handler,
            listener,
            signals,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn closer(&self) -> CancellationToken {
        self.listener.closer()
    }

    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.listener.state()
    }

    /// Serves gRPC and gRPC-Web until a signal arrives or the listener is
    /// closed.
    pub async fn run(self) -> Result<(), RunError> {
        let Self {
            handler,
            listener,
            signals,
        } = self;

        let (reporter, health_service) = tonic_health::server::health_reporter();
        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        let web_api_service = build_web_api_service(handler);

        let mut group = Group::<RunError>::new();
        {
            let closer = listener.closer();
            let reporter = reporter.clone();
            group.add(
                listener.serve(move |incoming, closed| {
                    Server::builder()
                        .accept_http1(true)
                        .http2_adaptive_window(Some(true))
                        .layer(
                            ServiceBuilder::new()
                                .layer(
                                    CorsLayer::new()
                                        .allow_origin(Any)
                                        .allow_methods(Any)
                                        .allow_headers(Any),
                                )
                                .layer(GrpcWebLayer::new()),
                        )
                        .add_service(health_service)
                        .add_service(reflection)
                        .add_service(web_api_service)
                        .serve_with_incoming_shutdown(incoming, async move {
                            closed.await;
                            reporter.set_not_serving::<WebApiGrpc>().await;
                        })
                }),
                move || closer.cancel(),
            );
        }
        {
            let cancel = CancellationToken::new();
            group.add(signals.wait(cancel.clone()), move || cancel.cancel());
        }

        reporter.set_serving::<WebApiGrpc>().await;
        group.run().await
    }
}
