pub mod exporters;
pub mod tracing;

use std::collections::HashMap;

use serde::Deserialize;

use self::{exporters::ExporterConfig, tracing::TracingConfig};

/// Telemetry configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name reported with traces and metrics
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Additional resource attributes
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
    /// OTLP exporter shared by traces and metrics
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
    /// Trace sampling configuration
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
    /// Seconds between metric exports
    #[serde(default = "default_metrics_interval_seconds")]
    pub metrics_interval_seconds: u64,
}

impl TelemetryConfig {
    /// Whether anything should be exported over OTLP
    pub const fn has_exporter(&self) -> bool {
        self.exporter.is_some()
    }
}

fn default_service_name() -> String {
    "switchyard".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_metrics_interval_seconds() -> u64 {
    30
}
