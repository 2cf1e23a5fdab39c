//! Metric names and instrument helpers shared by the engine crates

use std::time::Instant;

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Instrumentation scope for every switchyard instrument
pub const METER_NAME: &str = "switchyard";

// Routing
pub const ROUTING_DECISION_COUNT: &str = "routing.decision.count";

// Health
pub const HEALTH_OUTCOME_COUNT: &str = "health.outcome.count";
pub const HEALTH_OUTCOME_DROPPED: &str = "health.outcome.dropped";
pub const HEALTH_PROBE_DURATION: &str = "health.probe.duration";

// Events
pub const EVENTS_DROPPED: &str = "events.dropped";

/// The switchyard meter from the global provider
pub fn meter() -> Meter {
    global::meter(METER_NAME)
}

/// Build a monotonic counter
pub fn counter(name: &'static str) -> Counter<u64> {
    meter().u64_counter(name).build()
}

/// Build a histogram measured in seconds
pub fn duration_histogram(name: &'static str) -> Histogram<f64> {
    meter().f64_histogram(name).with_unit("s").build()
}

/// Record a duration measurement on a histogram
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[opentelemetry::KeyValue]) {
    histogram.record(start.elapsed().as_secs_f64(), attributes);
}
