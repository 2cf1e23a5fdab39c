use serde::Deserialize;

/// Routing engine and weight optimizer tuning
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Exclude degraded providers from selection by default
    #[serde(default)]
    pub strict: bool,
    /// Optimizer formula coefficients
    #[serde(default)]
    pub coefficients: OptimizerCoefficients,
}

/// Coefficients of the weight optimizer formulas
///
/// `cost`: `max(floor, 100 - cost_per_1k * cost_scale)`,
/// `latency`: `max(floor, 100 - avg_latency_ms / latency_divisor)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerCoefficients {
    #[serde(default = "default_cost_scale")]
    pub cost_scale: f64,
    #[serde(default = "default_latency_divisor")]
    pub latency_divisor: f64,
    #[serde(default = "default_weight_floor")]
    pub weight_floor: f64,
}

impl Default for OptimizerCoefficients {
    fn default() -> Self {
        Self {
            cost_scale: default_cost_scale(),
            latency_divisor: default_latency_divisor(),
            weight_floor: default_weight_floor(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_cost_scale() -> f64 {
    10_000.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_latency_divisor() -> f64 {
    50.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_weight_floor() -> f64 {
    10.0
}
