//! Logging and optional OpenTelemetry span export.
//!
//! Logs go to stderr through `tracing-subscriber`, filtered by `RUST_LOG` (default `info`), so
//! stdout stays free for `--json` output. With the `telemetry` feature enabled and any
//! `OTEL_EXPORTER_OTLP_*` variable set, spans are also exported over OTLP.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(feature = "telemetry")]
use otel::TelemetryProtocol;

/// Builder for the process-wide subscriber.
#[derive(Debug, Clone)]
pub struct Telemetry {
    name: &'static str,
    version: &'static str,
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
        }
    }

    /// Service name reported to the OTLP collector.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    fn env_filter() -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }

    fn fmt_layer<S>() -> impl tracing_subscriber::Layer<S>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr)
    }

    /// Installs the global subscriber. Keep the returned guard alive until exit.
    ///
    /// Installing twice is not an error; the second call leaves the first subscriber in place.
    pub fn register(self) -> TelemetryGuard {
        #[cfg(feature = "telemetry")]
        if let Some(protocol) = TelemetryProtocol::from_env() {
            match otel::init_tracer_provider(&protocol, self.name, self.version) {
                Ok(tracer_provider) => {
                    use opentelemetry::trace::TracerProvider as _;
                    let tracer = tracer_provider.tracer(self.name);
                    let registered = tracing_subscriber::registry()
                        .with(Self::env_filter())
                        .with(Self::fmt_layer())
                        .with(tracing_opentelemetry::OpenTelemetryLayer::new(tracer))
                        .try_init()
                        .is_ok();
                    if registered {
                        tracing::info!(?protocol, "OpenTelemetry span export is enabled");
                    }
                    return TelemetryGuard {
                        tracer_provider: Some(tracer_provider),
                    };
                }
                Err(e) => {
                    eprintln!("Failed to build OTLP span exporter, falling back to local logs: {e}");
                }
            }
        }

        let _ = tracing_subscriber::registry()
            .with(Self::env_filter())
            .with(Self::fmt_layer())
            .try_init();
        tracing::debug!(service = self.name, version = self.version, "Local logging only");

        TelemetryGuard {
            #[cfg(feature = "telemetry")]
            tracer_provider: None,
        }
    }
}

/// Flushes exported spans on drop.
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if let Some(tracer_provider) = self.tracer_provider.take()
            && let Err(err) = tracer_provider.shutdown()
        {
            eprintln!("{err:?}");
        }
    }
}

#[cfg(feature = "telemetry")]
mod otel {
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::ExporterBuildError;
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
    use opentelemetry_semantic_conventions::SCHEMA_URL;
    use opentelemetry_semantic_conventions::attribute::{
        DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION,
    };
    use std::env;

    /// OTLP transport.
    #[allow(clippy::upper_case_acronyms)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TelemetryProtocol {
        HTTP,
        GRPC,
    }

    impl TelemetryProtocol {
        /// `None` unless at least one `OTEL_EXPORTER_OTLP_*` variable is set.
        pub fn from_env() -> Option<Self> {
            let is_enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
                || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
                || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
            if !is_enabled {
                return None;
            }
            let protocol = match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
                Ok("grpc") => TelemetryProtocol::GRPC,
                _ => TelemetryProtocol::HTTP,
            };
            Some(protocol)
        }
    }

    fn resource(name: &'static str, version: &'static str) -> Resource {
        let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
        Resource::builder()
            .with_service_name(name)
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, version),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    pub fn init_tracer_provider(
        protocol: &TelemetryProtocol,
        name: &'static str,
        version: &'static str,
    ) -> Result<SdkTracerProvider, ExporterBuildError> {
        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::HTTP => exporter.with_http().build()?,
            TelemetryProtocol::GRPC => exporter.with_tonic().build()?,
        };
        Ok(SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource(name, version))
            .with_batch_exporter(exporter)
            .build())
    }
}
