//! Provider health tracking for switchyard
//!
//! - **Monitor**: rolling success rate, latency and status per provider,
//!   published as immutable snapshots
//! - **Validation**: bounded test calls that feed the monitor like real traffic
//! - **Probes**: background loops that keep health fresh without traffic
//! - **Refresh**: a clock-driven pass that takes silent failing providers
//!   offline once their failure streak goes stale

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod error;
pub mod monitor;
pub mod outcome;
pub mod probe;
pub mod refresh;
pub mod validation;

pub use error::HealthError;
pub use monitor::{HealthMonitor, HealthObserver, classify};
pub use outcome::Outcome;
pub use probe::{HttpProber, Prober};
pub use refresh::spawn_refresh_loop;
pub use validation::{TestResult, ValidationService, spawn_probe_loop, spawn_probe_loops};
