//! Bootstrap and supervision of the account service process.
//!
//! [`Application::build`] performs every fallible startup step in order:
//! connect the database, connect the cache, compose the service, install the
//! signal handlers and bind the listener. Any failure is a [`StartupError`]
//! and nothing has been served yet.
//!
//! [`Application::run`] registers the account, health and reflection services
//! on one server and supervises two tasks in a [`Group`]: the serve loop and
//! the signal watcher. Whichever returns first tears the other down.

use crate::server::{
    account::Accounts,
    config::AccountServiceConfig,
    repository::AccountRepository,
    service::{
        endpoints::Endpoints,
        handler::{AccountHandler, build_account_service},
    },
    store::TokenStore,
};
use calendar_core::{
    lifecycle::{Group, GrpcListener, RunError, ServerState, SignalWatcher, StartupError},
    proto::{FILE_DESCRIPTOR_SET, account::account_server::AccountServer},
    storage::{connect_cache, connect_database},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

type AccountGrpc = AccountServer<AccountHandler>;

/// A fully wired account service, bound but not yet serving.
pub struct Application {
    handler: AccountHandler,
    listener: GrpcListener,
    signals: SignalWatcher,
}

impl Application {
    pub async fn build(config: AccountServiceConfig) -> Result<Self, StartupError> {
        tracing::debug!(?config, "starting account service");

        let database = connect_database(
            &config.database,
            config.max_db_connections,
            config.connect_timeout,
        )
        .await?;
        let cache = connect_cache(&config.cache, config.connect_timeout).await?;

        let repository = AccountRepository::from_database(&database)
            .await
            .map_err(StartupError::Schema)?;
        let tokens = TokenStore::from_cache(&cache, config.token_ttl);
        let service = Arc::new(Accounts::new(repository, tokens));
        let handler = AccountHandler::new(Endpoints::new(service));

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

    /// Closing this token shuts the whole application down.
    pub fn closer(&self) -> CancellationToken {
        self.listener.closer()
    }

    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.listener.state()
    }

    /// Serves until a signal arrives or the listener is closed.
    ///
    /// A signal surfaces as [`RunError::Signal`]; callers decide how to treat
    /// it with [`RunError::is_graceful`].
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
        let account_service = build_account_service(handler);

        let mut group = Group::<RunError>::new();
        {
            let closer = listener.closer();
            let reporter = reporter.clone();
            group.add(
                listener.serve(move |incoming, closed| {
                    Server::builder()
                        .add_service(health_service)
                        .add_service(reflection)
                        .add_service(account_service)
                        .serve_with_incoming_shutdown(incoming, async move {
                            closed.await;
                            reporter.set_not_serving::<AccountGrpc>().await;
                        })
                }),
                move || closer.cancel(),
            );
        }
        {
            let cancel = CancellationToken::new();
            group.add(signals.wait(cancel.clone()), move || cancel.cancel());
        }

        reporter.set_serving::<AccountGrpc>().await;
        group.run().await
    }
}
