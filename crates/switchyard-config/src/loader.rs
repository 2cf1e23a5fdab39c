use std::collections::HashSet;
use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no providers are configured, thresholds are out
    /// of range, or seeded chains reference unknown providers
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_providers()?;
        self.validate_health()?;
        self.validate_routing()?;
        self.validate_delivery()?;
        self.validate_chains()?;
        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        if self.providers.is_empty() {
            anyhow::bail!("at least one provider must be configured");
        }

        for (name, provider) in &self.providers {
            if !provider.cost_per_1k_tokens.is_finite() || provider.cost_per_1k_tokens < 0.0 {
                anyhow::bail!("provider '{name}' has an invalid cost_per_1k_tokens");
            }
        }

        Ok(())
    }

    fn validate_health(&self) -> anyhow::Result<()> {
        let health = &self.health;

        for (field, alpha) in [
            ("success_rate_alpha", health.success_rate_alpha),
            ("latency_alpha", health.latency_alpha),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                anyhow::bail!("health.{field} must be in (0, 1]");
            }
        }

        if !(0.0..=100.0).contains(&health.degraded_success_rate) {
            anyhow::bail!("health.degraded_success_rate must be between 0 and 100");
        }

        if !health.latency_sla_ms.is_finite() || health.latency_sla_ms <= 0.0 {
            anyhow::bail!("health.latency_sla_ms must be a positive number");
        }

        if !health.latency_sla_multiplier.is_finite() || health.latency_sla_multiplier < 1.0 {
            anyhow::bail!("health.latency_sla_multiplier must be at least 1");
        }

        if health.offline_consecutive_failures == 0 {
            anyhow::bail!("health.offline_consecutive_failures must be greater than 0");
        }

        if health.refresh_interval_seconds == 0 {
            anyhow::bail!("health.refresh_interval_seconds must be greater than 0");
        }

        Ok(())
    }

    fn validate_routing(&self) -> anyhow::Result<()> {
        let coefficients = &self.routing.coefficients;

        for (field, value) in [
            ("cost_scale", coefficients.cost_scale),
            ("latency_divisor", coefficients.latency_divisor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("routing.coefficients.{field} must be a positive number");
            }
        }

        if !(0.0..=100.0).contains(&coefficients.weight_floor) {
            anyhow::bail!("routing.coefficients.weight_floor must be between 0 and 100");
        }

        Ok(())
    }

    fn validate_delivery(&self) -> anyhow::Result<()> {
        if self.events.queue_capacity == 0 {
            anyhow::bail!("events.queue_capacity must be greater than 0");
        }

        if self.validation.timeout_ms == 0 {
            anyhow::bail!("validation.timeout_ms must be greater than 0");
        }

        Ok(())
    }

    fn validate_chains(&self) -> anyhow::Result<()> {
        let mut primaries = HashSet::new();

        for seed in &self.chains {
            if !primaries.insert(seed.primary.as_str()) {
                anyhow::bail!("chain for '{}' is declared more than once", seed.primary);
            }

            for provider in seed.providers() {
                if !self.providers.contains_key(provider) {
                    anyhow::bail!("chain for '{}' references unknown provider '{provider}'", seed.primary);
                }
            }
        }

        Ok(())
    }
}
