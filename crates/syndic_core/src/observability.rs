//! Tracing subscriber and OpenTelemetry metrics initialization.

#[cfg(feature = "metrics")]
use opentelemetry::{KeyValue, global, metrics::Counter};
#[cfg(feature = "metrics")]
use opentelemetry_otlp::{MetricExporter as OtlpExporter, WithExportConfig};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
};
#[cfg(feature = "metrics")]
use opentelemetry_stdout::MetricExporter as StdoutExporter;
#[cfg(feature = "metrics")]
use std::sync::{LazyLock, OnceLock};
#[cfg(feature = "metrics")]
use std::time::Duration;
#[cfg(feature = "metrics")]
use tracing::warn;
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

/// Log output format for [`init_tracing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this twice
/// is harmless; the second call is ignored.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    if installed {
        debug!(%format, "Tracing subscriber installed");
    }
}

/// Initialize OpenTelemetry metrics with OTLP or stdout export.
///
/// Checks the `OTEL_EXPORTER` environment variable:
/// - "otlp" -> OTLP exporter to `OTEL_EXPORTER_OTLP_ENDPOINT` (default: http://localhost:4318)
/// - "stdout" or unset -> stdout exporter
///
/// When the `metrics` feature is disabled, this function returns `Ok(())` immediately.
#[instrument(skip_all, fields(service_name))]
pub fn init_metrics(service_name: &'static str, export_interval_secs: u64) -> Result<(), String> {
    #[cfg(not(feature = "metrics"))]
    {
        let _ = export_interval_secs;
        info!(
            service_name = service_name,
            "Metrics feature disabled - skipping metrics initialization"
        );
        Ok(())
    }

    #[cfg(feature = "metrics")]
    {
        info!(
            service_name = service_name,
            export_interval_secs = export_interval_secs,
            "Initializing OpenTelemetry metrics"
        );

        let resource = Resource::builder_empty()
            .with_attributes([KeyValue::new("service.name", service_name)])
            .build();
        let interval = Duration::from_secs(export_interval_secs);

        let exporter_type = std::env::var("OTEL_EXPORTER").unwrap_or_else(|_| "stdout".to_string());
        let meter_provider = match exporter_type.as_str() {
            "otlp" => {
                let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:4318".to_string());
                info!(endpoint = %endpoint, "Using OTLP metrics exporter");

                let exporter = OtlpExporter::builder()
                    .with_http()
                    .with_endpoint(&endpoint)
                    .with_timeout(Duration::from_secs(10))
                    .build()
                    .map_err(|e| format!("Failed to create OTLP exporter: {}", e))?;
                let reader = PeriodicReader::builder(exporter)
                    .with_interval(interval)
                    .build();

                SdkMeterProvider::builder()
                    .with_resource(resource)
                    .with_reader(reader)
                    .build()
            }
            _ => {
                info!("Using stdout metrics exporter");
                let reader = PeriodicReader::builder(StdoutExporter::default())
                    .with_interval(interval)
                    .build();

                SdkMeterProvider::builder()
                    .with_resource(resource)
                    .with_reader(reader)
                    .build()
            }
        };

        let _ = METER_PROVIDER.set(meter_provider.clone());
        global::set_meter_provider(meter_provider);
        debug!("Meter provider registered globally");
        Ok(())
    }
}

#[cfg(feature = "metrics")]
static METER_PROVIDER: OnceLock<SdkMeterProvider> = OnceLock::new();

/// Flush pending metrics and stop the provider installed by [`init_metrics`].
///
/// Call once before the process exits. No-op without the `metrics` feature
/// or when [`init_metrics`] never ran.
pub fn shutdown_metrics() {
    #[cfg(feature = "metrics")]
    if let Some(provider) = METER_PROVIDER.get() {
        match provider.shutdown() {
            Ok(()) => debug!("Meter provider shut down"),
            Err(e) => warn!(error = %e, "Meter provider shutdown failed"),
        }
    }
}

#[cfg(feature = "metrics")]
static PUBLISH_RESULTS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("syndic")
        .u64_counter("syndic_publish_results")
        .with_description("Publish calls by platform, operation and outcome")
        .build()
});

/// Count one publish outcome. No-op without the `metrics` feature.
pub fn record_publish(platform: &str, operation: &str, outcome: &str) {
    #[cfg(feature = "metrics")]
    PUBLISH_RESULTS.add(
        1,
        &[
            KeyValue::new("platform", platform.to_string()),
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("outcome", outcome.to_string()),
        ],
    );

    #[cfg(not(feature = "metrics"))]
    let _ = (platform, operation, outcome);
}
