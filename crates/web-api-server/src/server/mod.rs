//! The web-api process.
//!
//! ## Structure
//!
//! - [`config`] - command line and `[web_api_service]` settings.
//! - [`repository`] - calendar events.
//! - [`calendar`] - the `WebApiService` trait and its implementation.
//! - [`service`] - endpoints and the gRPC handler.
//! - [`app`] - startup and supervision.

pub mod app;
pub mod calendar;
pub mod config;
pub mod repository;
pub mod service;

pub use app::Application;

use config::{CliArgs, WebApiServiceConfig};

/// Runs the service described by `args` to completion.
///
/// Returns `Ok(())` for a graceful shutdown; any other outcome is logged and
/// returned as an error.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let result = serve(args).await;
    if let Err(err) = &result {
        tracing::error!(exit = %err, "web-api service failed");
    }
    result
}

async fn serve(args: CliArgs) -> anyhow::Result<()> {
    let config = WebApiServiceConfig::load(&args.config)?;
    let app = Application::build(config).await?;
    match app.run().await {
        Err(err) if !err.is_graceful() => Err(err.into()),
        Err(err) => {
            tracing::info!(exit = %err, "web-api service stopped");
            Ok(())
        }
        Ok(()) => {
            tracing::info!(exit = "listener closed", "web-api service stopped");
            Ok(())
        }
    }
}
