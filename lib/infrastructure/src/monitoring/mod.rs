pub mod meter;

use std::error::Error;

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{ExporterBuildError, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

//KNOWN ISSUES:
// - EnvFilter on layer-level looses log-statements when combined with the OTLP bridge. Keep separate filters per layer.

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MonitoringConfig {
    pub service_name: String,
    pub app_name: String,
    pub logs: EnvFilterConfig,
    pub traces: EnvFilterConfig,
    pub otlp: Option<OtlpConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnvFilterConfig {
    pub default_level: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct OtlpConfig {
    pub url: Option<String>,
}

impl TryInto<EnvFilter> for EnvFilterConfig {
    type Error = tracing_subscriber::filter::ParseError;

    fn try_into(self) -> Result<EnvFilter, Self::Error> {
        EnvFilter::builder()
            .with_default_directive(self.default_level.parse()?)
            .parse(self.filters.join(","))
    }
}

impl MonitoringConfig {
    pub fn init(&self) -> Result<(), Box<dyn Error>> {
        let log_filter: EnvFilter = self.logs.clone().try_into()?;

        let Some(otlp_config) = &self.otlp else {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(log_filter))
                .init();
            return Ok(());
        };

        let resource = Resource::builder()
            .with_attribute(KeyValue::new("service.name", self.service_name.clone()))
            .with_attribute(KeyValue::new("app.name", self.app_name.clone()))
            .build();

        let logger_provider = init_logs(resource.clone(), otlp_config.url.clone())?;
        let bridge_filter: EnvFilter = self.logs.clone().try_into()?;
        let bridge_layer = OpenTelemetryTracingBridge::new(&logger_provider).with_filter(bridge_filter);

        let tracer = init_traces(resource.clone(), otlp_config.url.clone())?.tracer(self.app_name.to_owned());
        let trace_filter: EnvFilter = self.traces.clone().try_into()?;
        let trace_layer = OpenTelemetryLayer::new(tracer).with_filter(trace_filter);

        opentelemetry::global::set_meter_provider(init_metrics(resource, otlp_config.url.clone())?);

        tracing_subscriber::registry()
            .with(trace_layer)
            .with(bridge_layer)
            .with(tracing_subscriber::fmt::layer().with_filter(log_filter))
            .init();

        Ok(())
    }
}

fn init_traces(resource: Resource, url: Option<String>) -> Result<SdkTracerProvider, ExporterBuildError> {
    let builder = SdkTracerProvider::builder().with_resource(resource);

    match url {
        Some(url) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(url)
                .build()?;
            Ok(builder.with_batch_exporter(exporter).build())
        }
        None => Ok(builder
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build()),
    }
}

fn init_logs(resource: Resource, url: Option<String>) -> Result<SdkLoggerProvider, ExporterBuildError> {
    let builder = SdkLoggerProvider::builder().with_resource(resource);

    match url {
        Some(url) => {
            let exporter = opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(url)
                .build()?;
            Ok(builder.with_batch_exporter(exporter).build())
        }
        None => Ok(builder
            .with_simple_exporter(opentelemetry_stdout::LogExporter::default())
            .build()),
    }
}

fn init_metrics(resource: Resource, url: Option<String>) -> Result<SdkMeterProvider, ExporterBuildError> {
    let builder = SdkMeterProvider::builder().with_resource(resource);

    match url {
        Some(url) => {
            let exporter = opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(url)
                .build()?;
            let reader = PeriodicReader::builder(exporter)
                .with_interval(std::time::Duration::from_secs(15))
                .build();
            Ok(builder.with_reader(reader).build())
        }
        None => {
            let reader = PeriodicReader::builder(opentelemetry_stdout::MetricExporter::default())
                .with_interval(std::time::Duration::from_secs(60))
                .build();
            Ok(builder.with_reader(reader).build())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_accepts_module_directives() {
        let config = EnvFilterConfig {
            default_level: "info".to_string(),
            filters: vec!["esp_windowshades=debug".to_string(), "rumqttc=warn".to_string()],
        };

        let filter: Result<EnvFilter, _> = config.try_into();
        assert!(filter.is_ok());
    }

    #[test]
    fn env_filter_without_directives_uses_default_level() {
        let config = EnvFilterConfig {
            default_level: "warn".to_string(),
            filters: vec![],
        };

        let filter: EnvFilter = config.try_into().unwrap();
        assert!(filter.to_string().contains("warn"));
    }
}
