//! Log output and optional OpenTelemetry trace export.
//!
//! Logs always go to stdout, filtered by `RUST_LOG` (default `info`). When any of the
//! `OTEL_EXPORTER_OTLP_*` variables is set, spans are also exported over OTLP using the
//! protocol named by `OTEL_EXPORTER_OTLP_PROTOCOL` (`http/protobuf` unless `grpc`).

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::ExporterBuildError;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
use opentelemetry_semantic_conventions::SCHEMA_URL;
use opentelemetry_semantic_conventions::attribute::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION};
use std::env;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// OTLP transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryProtocol {
    HttpProtobuf,
    Grpc,
}

impl TelemetryProtocol {
    /// Protocol to export with, or `None` when OTLP export is not configured.
    pub fn from_env() -> Option<Self> {
        let is_enabled = [
            "OTEL_EXPORTER_OTLP_ENDPOINT",
            "OTEL_EXPORTER_OTLP_HEADERS",
            "OTEL_EXPORTER_OTLP_PROTOCOL",
        ]
        .iter()
        .any(|name| env::var(name).is_ok());
        if !is_enabled {
            return None;
        }
        let protocol = env::var("OTEL_EXPORTER_OTLP_PROTOCOL").ok();
        Some(Self::parse(protocol.as_deref()))
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("grpc") => TelemetryProtocol::Grpc,
            _ => TelemetryProtocol::HttpProtobuf,
        }
    }
}

/// Installs the global subscriber and owns the tracer provider for shutdown.
pub struct Telemetry {
    name: &'static str,
    version: &'static str,
    tracer_provider: Option<SdkTracerProvider>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            tracer_provider: None,
        }
    }

    /// Service name reported to the collector.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    /// Installs the global `tracing` subscriber.
    ///
    /// Must be called at most once per process. Fails only if the OTLP exporter cannot
    /// be built from the environment.
    pub fn register(mut self) -> Result<Self, ExporterBuildError> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        match TelemetryProtocol::from_env() {
            Some(protocol) => {
                let tracer_provider = self.tracer_provider(protocol)?;
                let tracer = tracer_provider.tracer(self.name);
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .with(OpenTelemetryLayer::new(tracer))
                    .init();
                tracing::info!(?protocol, "OpenTelemetry trace export is enabled");
                self.tracer_provider = Some(tracer_provider);
            }
            None => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .init();
                tracing::info!("OpenTelemetry is not enabled");
            }
        }
        Ok(self)
    }

    fn resource(&self) -> Resource {
        let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
        Resource::builder()
            .with_service_name(self.name)
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, self.version),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    fn tracer_provider(
        &self,
        protocol: TelemetryProtocol,
    ) -> Result<SdkTracerProvider, ExporterBuildError> {
        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::HttpProtobuf => exporter.with_http().build()?,
            TelemetryProtocol::Grpc => exporter.with_tonic().build()?,
        };
        Ok(SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(self.resource())
            .with_batch_exporter(exporter)
            .build())
    }
}

/// Flushes pending spans on shutdown.
impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.tracer_provider.as_ref() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
