use serde::Deserialize;

/// Live update delivery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// Events buffered per subscriber before the oldest are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Seconds between SSE keep-alive comments
    #[serde(default = "default_keep_alive_seconds")]
    pub keep_alive_seconds: u64,
    /// Seconds between chain analytics broadcasts (0 disables)
    #[serde(default = "default_analytics_interval_seconds")]
    pub analytics_interval_seconds: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            keep_alive_seconds: default_keep_alive_seconds(),
            analytics_interval_seconds: default_analytics_interval_seconds(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_queue_capacity() -> usize {
    256
}

#[allow(clippy::missing_const_for_fn)]
fn default_keep_alive_seconds() -> u64 {
    15
}

#[allow(clippy::missing_const_for_fn)]
fn default_analytics_interval_seconds() -> u64 {
    60
}
