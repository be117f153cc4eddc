//! # Telemetry
//!
//! Every lifecycle event is a `tracing` event written to stderr as a
//! structured line (`key=value` fields by default, JSON with
//! `LOG_FORMAT=json`). The level filter comes from `RUST_LOG` and defaults to
//! `info`.
//!
//! ## Feature matrix
//!
//! - `otel`: additionally exports spans over OTLP/gRPC when
//!   `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//!
//! ## Example usage
//!
//! ```bash
//! RUST_LOG=debug LOG_FORMAT=json cargo run -p account-server
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 cargo run -p account-server --features otel
//! ```

use tracing_subscriber::{EnvFilter, fmt::time::ChronoUtc, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "otel")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "otel")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "otel")]
use opentelemetry_sdk::{Resource, trace as sdktrace};

/// Keeps exporters alive until [`TelemetryProviders::shutdown`].
pub struct TelemetryProviders {
    #[cfg(feature = "otel")]
    tracer_provider: Option<sdktrace::SdkTracerProvider>,
}

impl TelemetryProviders {
    /// Flushes and stops exporters. Called once, right before exit.
    pub fn shutdown(self) {
        #[cfg(feature = "otel")]
        if let Some(provider) = self.tracer_provider {
            if let Err(err) = provider.force_flush() {
                eprintln!("Error flushing traces: {err:#?}");
            }
            if let Err(err) = provider.shutdown() {
                eprintln!("Error shutting down tracer: {err:#?}");
            }
        }
    }
}

fn json_requested() -> bool {
    std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"))
}

/// Installs the global subscriber for `service_name`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or, with `otel`, if the
/// exporter cannot be built.
pub fn init_telemetry(service_name: &'static str) -> anyhow::Result<TelemetryProviders> {
    let json = json_requested();

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(ChronoUtc::rfc_3339())
                .with_target(false)
        }))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_target(false)
        }));

    #[cfg(feature = "otel")]
    let tracer_provider = init_tracer(service_name)?;

    #[cfg(feature = "otel")]
    let registry = registry.with(tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer()
            .with_tracer(provider.tracer(service_name))
            .with_error_records_to_exceptions(true)
    }));

    registry.try_init()?;
    tracing::debug!(service = service_name, "telemetry initialized");

    Ok(TelemetryProviders {
        #[cfg(feature = "otel")]
        tracer_provider,
    })
}

#[cfg(feature = "otel")]
fn init_tracer(service_name: &'static str) -> anyhow::Result<Option<sdktrace::SdkTracerProvider>> {
    use anyhow::Context;

    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok(None);
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(std::time::Duration::from_secs(10))
        .build()
        .context("failed to build span exporter")?;

    let resource = Resource::builder().with_service_name(service_name).build();
    let provider = sdktrace::SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();
    opentelemetry::global::set_tracer_provider(provider.clone());

    Ok(Some(provider))
}
