//! Agreement-based confidence

use serde::{Deserialize, Serialize};

/// Confidence reported when no factor carries a signal
pub const NO_SIGNAL_CONFIDENCE: f64 = 0.95;

/// Derives confidence from how much the non-zero factor scores agree.
///
/// `confidence = clamp(1 - variance / variance_scale, floor, ceiling)` over
/// the scores greater than zero (population variance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceEstimator {
    #[serde(default = "default_no_signal")]
    pub no_signal: f64,

    #[serde(default = "default_floor")]
    pub floor: f64,

    #[serde(default = "default_ceiling")]
    pub ceiling: f64,

    #[serde(default = "default_variance_scale")]
    pub variance_scale: f64,
}

fn default_no_signal() -> f64 {
    NO_SIGNAL_CONFIDENCE
}

fn default_floor() -> f64 {
    0.5
}

fn default_ceiling() -> f64 {
    0.95
}

fn default_variance_scale() -> f64 {
    2500.0
}

impl Default for ConfidenceEstimator {
    fn default() -> Self {
        Self {
            no_signal: default_no_signal(),
            floor: default_floor(),
            ceiling: default_ceiling(),
            variance_scale: default_variance_scale(),
        }
    }
}

impl ConfidenceEstimator {
    pub fn estimate(&self, scores: &[f64]) -> f64 {
        let active: Vec<f64> = scores.iter().copied().filter(|s| *s > 0.0).collect();

        if active.is_empty() {
            return self.no_signal;
        }

        let n = active.len() as f64;
        let mean = active.iter().sum::<f64>() / n;
        let variance = active.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        (1.0 - variance / self.variance_scale).clamp(self.floor, self.ceiling)
    }
}
