//! The account service process.
//!
//! ## Structure
//!
//! - [`config`] - command line and `[account_service]` settings.
//! - [`repository`] / [`store`] - users and session tokens.
//! - [`account`] - the `AccountService` implementation.
//! - [`service`] - endpoints and the gRPC handler.
//! - [`app`] - startup and supervision.

pub mod account;
pub mod app;
pub mod config;
pub mod repository;
pub mod service;
pub mod store;

pub use app::Application;

use config::{AccountServiceConfig, CliArgs};

/// Runs the service described by `args` to completion.
///
/// Returns `Ok(())` when the process should exit with status 0: a shutdown
/// signal, or the listener being closed. Every other outcome is an error and
/// has already been logged.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let result = serve(args).await;
    if let Err(err) = &result {
        tracing::error!(exit = %err, "account service failed");
    }
    result
}

async fn serve(args: CliArgs) -> anyhow::Result<()> {
    let config = AccountServiceConfig::load(&args.config)?;
    let app = Application::build(config).await?;
    match app.run().await {
        Err(err) if !err.is_graceful() => Err(err.into()),
        Err(err) => {
            tracing::info!(exit = %err, "account service stopped");
            Ok(())
        }
        Ok(()) => {
            tracing::info!(exit = "listener closed", "account service stopped");
            Ok(())
        }
    }
}
