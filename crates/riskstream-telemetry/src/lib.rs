//! riskstream telemetry
//!
//! Counters for analyzed cases and signal source outcomes. Every recording
//! updates an in-process [`MetricsCollector`] and is mirrored to the
//! `metrics` facade, which is a no-op unless the host installs a recorder.

pub mod metrics;

pub use crate::metrics::{describe_metrics, MetricsCollector, MetricsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{MetricsCollector, MetricsSnapshot};
}
