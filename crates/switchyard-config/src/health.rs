use serde::Deserialize;

/// Thresholds for rolling health metrics and status classification
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthMonitorConfig {
    /// EWMA weight given to the newest outcome when updating success rate
    #[serde(default = "default_alpha")]
    pub success_rate_alpha: f64,
    /// EWMA weight given to the newest latency sample
    #[serde(default = "default_alpha")]
    pub latency_alpha: f64,
    /// Success rate (0 to 100) below which a provider is degraded
    #[serde(default = "default_degraded_success_rate")]
    pub degraded_success_rate: f64,
    /// Latency SLA in milliseconds
    #[serde(default = "default_latency_sla_ms")]
    pub latency_sla_ms: f64,
    /// Multiple of the SLA above which a provider is degraded
    #[serde(default = "default_latency_sla_multiplier")]
    pub latency_sla_multiplier: f64,
    /// Consecutive failures that mark a provider offline
    #[serde(default = "default_offline_consecutive_failures")]
    pub offline_consecutive_failures: u32,
    /// Seconds without a success, while failing, before a provider is offline
    #[serde(default = "default_staleness_seconds")]
    pub staleness_seconds: u64,
    /// Seconds between background probes (0 disables probing)
    #[serde(default = "default_probe_interval_seconds")]
    pub probe_interval_seconds: u64,
    /// Seconds between clock-driven re-classifications of every provider
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,
}

impl HealthMonitorConfig {
    /// Latency above which a provider counts as degraded
    pub fn latency_ceiling_ms(&self) -> f64 {
        self.latency_sla_ms * self.latency_sla_multiplier
    }
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            success_rate_alpha: default_alpha(),
            latency_alpha: default_alpha(),
            degraded_success_rate: default_degraded_success_rate(),
            latency_sla_ms: default_latency_sla_ms(),
            latency_sla_multiplier: default_latency_sla_multiplier(),
            offline_consecutive_failures: default_offline_consecutive_failures(),
            staleness_seconds: default_staleness_seconds(),
            probe_interval_seconds: default_probe_interval_seconds(),
            refresh_interval_seconds: default_refresh_interval_seconds(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_alpha() -> f64 {
    0.2
}

#[allow(clippy::missing_const_for_fn)]
fn default_degraded_success_rate() -> f64 {
    90.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_latency_sla_ms() -> f64 {
    2000.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_latency_sla_multiplier() -> f64 {
    2.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_offline_consecutive_failures() -> u32 {
    5
}

#[allow(clippy::missing_const_for_fn)]
fn default_staleness_seconds() -> u64 {
    300
}

#[allow(clippy::missing_const_for_fn)]
fn default_probe_interval_seconds() -> u64 {
    30
}

#[allow(clippy::missing_const_for_fn)]
fn default_refresh_interval_seconds() -> u64 {
    5
}
