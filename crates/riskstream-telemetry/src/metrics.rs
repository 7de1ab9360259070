//! Metrics collection and reporting

use riskstream_core::{FactorKind, SignalStatus};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const CASES_TOTAL: &str = "riskstream_cases_total";
pub const SIGNAL_OUTCOMES_TOTAL: &str = "riskstream_signal_outcomes_total";
pub const SIGNAL_LATENCY_US: &str = "riskstream_signal_latency_us";
pub const CASE_LATENCY_US: &str = "riskstream_case_latency_us";

/// Register descriptions for every metric riskstream emits.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    ::metrics::describe_counter!(CASES_TOTAL, "Total number of cases analyzed");
    ::metrics::describe_counter!(
        SIGNAL_OUTCOMES_TOTAL,
        "Signal source outcomes by source and status"
    );
    ::metrics::describe_histogram!(
        SIGNAL_LATENCY_US,
        ::metrics::Unit::Microseconds,
        "Signal source latency in microseconds by source"
    );
    ::metrics::describe_histogram!(
        CASE_LATENCY_US,
        ::metrics::Unit::Microseconds,
        "End-to-end case analysis latency in microseconds"
    );
}

/// Metrics collector shared by every orchestrator run
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    cases: AtomicU64,
    signals_succeeded: AtomicU64,
    signals_skipped: AtomicU64,
    signals_failed: AtomicU64,
    signal_timeouts: AtomicU64,
    case_latency_us: AtomicU64,
    signal_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record a completed case analysis
    pub fn record_case(&self, latency_us: u64) {
        self.inner.cases.fetch_add(1, Ordering::Relaxed);
        self.inner
            .case_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);

        ::metrics::counter!(CASES_TOTAL).increment(1);
        ::metrics::histogram!(CASE_LATENCY_US).record(latency_us as f64);
    }

    /// Record one signal source outcome
    pub fn record_signal(&self, kind: FactorKind, status: SignalStatus, latency_us: u64) {
        let counter = match status {
            SignalStatus::Success => &self.inner.signals_succeeded,
            SignalStatus::Skipped => &self.inner.signals_skipped,
            SignalStatus::Failed => &self.inner.signals_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.inner
            .signal_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);

        ::metrics::counter!(
            SIGNAL_OUTCOMES_TOTAL,
            "source" => kind.key(),
            "status" => status.as_str()
        )
        .increment(1);
        ::metrics::histogram!(SIGNAL_LATENCY_US, "source" => kind.key())
            .record(latency_us as f64);
    }

    /// Record a signal source that hit its deadline
    pub fn record_timeout(&self, kind: FactorKind) {
        self.inner.signal_timeouts.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(
            SIGNAL_OUTCOMES_TOTAL,
            "source" => kind.key(),
            "status" => "timeout"
        )
        .increment(1);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cases: self.inner.cases.load(Ordering::Relaxed),
            signals_succeeded: self.inner.signals_succeeded.load(Ordering::Relaxed),
            signals_skipped: self.inner.signals_skipped.load(Ordering::Relaxed),
            signals_failed: self.inner.signals_failed.load(Ordering::Relaxed),
            signal_timeouts: self.inner.signal_timeouts.load(Ordering::Relaxed),
            case_latency_us: self.inner.case_latency_us.load(Ordering::Relaxed),
            signal_latency_us: self.inner.signal_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub cases: u64,
    pub signals_succeeded: u64,
    pub signals_skipped: u64,
    pub signals_failed: u64,
    /// Subset of `signals_failed` caused by deadlines
    pub signal_timeouts: u64,
    pub case_latency_us: u64,
    pub signal_latency_us: u64,
}

impl MetricsSnapshot {
    /// Signal outcomes of any status
    pub fn signals_total(&self) -> u64 {
        self.signals_succeeded + self.signals_skipped + self.signals_failed
    }

    /// Calculate average latency per case
    pub fn avg_case_latency_us(&self) -> u64 {
        if self.cases == 0 {
            0
        } else {
            self.case_latency_us / self.cases
        }
    }

    /// Share of signal evaluations that failed
    pub fn failure_rate(&self) -> f64 {
        let total = self.signals_total();
        if total == 0 {
            0.0
        } else {
            self.signals_failed as f64 / total as f64
        }
    }
}
