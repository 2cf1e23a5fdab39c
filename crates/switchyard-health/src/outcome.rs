use serde::Deserialize;

/// Result of one call to a provider, reported by the request path
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: bool,
    pub latency_ms: f64,
    #[serde(default)]
    pub cost_incurred: f64,
}

impl Outcome {
    pub const fn success(latency_ms: f64) -> Self {
        Self {
            success: true,
            latency_ms,
            cost_incurred: 0.0,
        }
    }

    pub const fn failure(latency_ms: f64) -> Self {
        Self {
            success: false,
            latency_ms,
            cost_incurred: 0.0,
        }
    }

    #[must_use]
    pub const fn with_cost(mut self, cost_incurred: f64) -> Self {
        self.cost_incurred = cost_incurred;
        self
    }

    /// Reason the signal is malformed, if it is
    pub fn defect(&self) -> Option<&'static str> {
        if !self.latency_ms.is_finite() {
            Some("latency is not finite")
        } else if self.latency_ms < 0.0 {
            Some("latency is negative")
        } else if !self.cost_incurred.is_finite() || self.cost_incurred < 0.0 {
            Some("cost is negative or not finite")
        } else {
            None
        }
    }
}
