use std::time::Duration;

use serde::Deserialize;

/// Provider test call configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Upper bound on a single test call or probe
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Message sent by completion probes
    #[serde(default = "default_sample_message")]
    pub sample_message: String,
}

impl ValidationConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            sample_message: default_sample_message(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout_ms() -> u64 {
    5000
}

fn default_sample_message() -> String {
    "ping".to_string()
}
