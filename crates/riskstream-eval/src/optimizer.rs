//! Value-optimal threshold search
//!
//! Each swept threshold is valued as
//! `TP * savings_per_tp - (TP + FP) * cost_per_review`. Thresholds that break
//! a constraint (`max_fpr`, `max_workload`) are excluded; if none remain the
//! outcome is [`OptimizationOutcome::NoFeasibleThreshold`].

use riskstream_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::{default_thresholds, Sample, ThresholdMetrics};

fn default_savings_per_tp() -> f64 {
    1000.0
}

fn default_cost_per_review() -> f64 {
    50.0
}

/// Business value of alerts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueModel {
    /// Loss avoided per caught positive
    #[serde(default = "default_savings_per_tp")]
    pub savings_per_tp: f64,

    /// Cost of one manual review
    #[serde(default = "default_cost_per_review")]
    pub cost_per_review: f64,
}

impl Default for ValueModel {
    fn default() -> Self {
        Self {
            savings_per_tp: default_savings_per_tp(),
            cost_per_review: default_cost_per_review(),
        }
    }
}

/// Operating constraints on a threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fpr: Option<f64>,

    /// Maximum number of reviews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workload: Option<usize>,
}

impl Constraints {
    fn admits(&self, metrics: &ThresholdMetrics) -> bool {
        if matches!(self.max_fpr, Some(max) if metrics.fpr > max) {
            return false;
        }
        !matches!(self.max_workload, Some(max) if metrics.counts.reviews() > max)
    }
}

/// Metrics and value at one feasible threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdValue {
    #[serde(flatten)]
    pub metrics: ThresholdMetrics,
    pub value: f64,
    pub reviews: usize,
    pub savings: f64,
    pub cost: f64,
}

impl ThresholdValue {
    fn compute(metrics: ThresholdMetrics, model: &ValueModel) -> Self {
        let reviews = metrics.counts.reviews();
        let savings = metrics.counts.tp as f64 * model.savings_per_tp;
        let cost = reviews as f64 * model.cost_per_review;
        Self {
            metrics,
            value: savings - cost,
            reviews,
            savings,
            cost,
        }
    }
}

/// Result of the search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationOutcome {
    Optimal { threshold: f64, value: f64 },
    NoFeasibleThreshold,
}

/// Full optimization report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOptimization {
    pub outcome: OptimizationOutcome,
    pub savings_per_tp: f64,
    pub cost_per_review: f64,
    pub max_fpr: Option<f64>,
    pub max_workload: Option<usize>,
    /// Feasible thresholds only
    pub value_sweep: Vec<ThresholdValue>,
}

impl ThresholdOptimization {
    pub fn best_threshold(&self) -> Option<f64> {
        match self.outcome {
            OptimizationOutcome::Optimal { threshold, .. } => Some(threshold),
            OptimizationOutcome::NoFeasibleThreshold => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self.outcome, OptimizationOutcome::Optimal { .. })
    }
}

/// Searches a threshold sweep for the highest-value feasible threshold
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdOptimizer {
    model: ValueModel,
    constraints: Constraints,
    thresholds: Vec<f64>,
}

impl Default for ThresholdOptimizer {
    fn default() -> Self {
        Self {
            model: ValueModel::default(),
            constraints: Constraints::default(),
            thresholds: default_thresholds(),
        }
    }
}

impl ThresholdOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value_model(mut self, model: ValueModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_max_fpr(mut self, max_fpr: f64) -> Self {
        self.constraints.max_fpr = Some(max_fpr);
        self
    }

    pub fn with_max_workload(mut self, max_workload: usize) -> Self {
        self.constraints.max_workload = Some(max_workload);
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.model.savings_per_tp.is_finite() || !self.model.cost_per_review.is_finite() {
            return Err(Error::config("savings_per_tp and cost_per_review must be finite"));
        }
        if let Some(max_fpr) = self.constraints.max_fpr {
            if !(0.0..=1.0).contains(&max_fpr) {
                return Err(Error::config(format!("max_fpr must be within [0, 1], got {max_fpr}")));
            }
        }
        if self.thresholds.is_empty() {
            return Err(Error::config("threshold sweep is empty"));
        }
        Ok(())
    }

    /// Pick the threshold with the highest value. Ties keep the earlier
    /// threshold in the sweep.
    pub fn optimize(&self, samples: &[Sample]) -> ThresholdOptimization {
        let mut best: Option<(f64, f64)> = None;
        let mut value_sweep = Vec::new();

        for &threshold in &self.thresholds {
            let metrics = ThresholdMetrics::compute(samples, threshold);
            if !self.constraints.admits(&metrics) {
                continue;
            }

            let entry = ThresholdValue::compute(metrics, &self.model);
            if best.map_or(true, |(_, value)| entry.value > value) {
                best = Some((threshold, entry.value));
            }
            value_sweep.push(entry);
        }

        let outcome = match best {
            Some((threshold, value)) => OptimizationOutcome::Optimal { threshold, value },
            None => OptimizationOutcome::NoFeasibleThreshold,
        };
        debug!(?outcome, feasible = value_sweep.len(), "Threshold optimization finished");

        ThresholdOptimization {
            outcome,
            savings_per_tp: self.model.savings_per_tp,
            cost_per_review: self.model.cost_per_review,
            max_fpr: self.constraints.max_fpr,
            max_workload: self.constraints.max_workload,
            value_sweep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new(90.0, true),
            Sample::new(70.0, true),
            Sample::new(40.0, true),
            Sample::new(60.0, false),
            Sample::new(30.0, false),
            Sample::new(10.0, false),
        ]
    }

    #[test]
    fn test_value_formula() {
        let opt = ThresholdOptimizer::new()
            .with_thresholds(vec![50.0])
            .optimize(&samples());

        // TP=2 (90, 70), FP=1 (60): 2*1000 - 3*50
        let entry = &opt.value_sweep[0];
        assert_eq!(entry.reviews, 3);
        assert_eq!(entry.value, 1850.0);
        assert_eq!(opt.best_threshold(), Some(50.0));
    }

    #[test]
    fn test_picks_highest_value() {
        let opt = ThresholdOptimizer::new()
            .with_thresholds(vec![20.0, 35.0, 50.0, 80.0])
            .optimize(&samples());

        // 35: TP=3, FP=1 -> 2800; 20: TP=3, FP=2 -> 2750
        assert_eq!(
            opt.outcome,
            OptimizationOutcome::Optimal { threshold: 35.0, value: 2800.0 }
        );
        assert_eq!(opt.value_sweep.len(), 4);
    }

    #[test]
    fn test_ties_keep_lowest_threshold() {
        let opt = ThresholdOptimizer::new()
            .with_thresholds(vec![35.0, 38.0, 50.0])
            .optimize(&samples());
        assert_eq!(opt.best_threshold(), Some(35.0));
    }

    #[test]
    fn test_max_fpr_excludes_thresholds() {
        let opt = ThresholdOptimizer::new()
            .with_thresholds(vec![20.0, 35.0, 65.0])
            .with_max_fpr(0.0)
            .optimize(&samples());

        assert_eq!(opt.best_threshold(), Some(65.0));
        assert!(opt.value_sweep.iter().all(|v| v.metrics.fpr == 0.0));
    }

    #[test]
    fn test_max_workload() {
        let opt = ThresholdOptimizer::new()
            .with_thresholds(vec![20.0, 50.0, 80.0])
            .with_max_workload(1)
            .optimize(&samples());
        assert_eq!(opt.best_threshold(), Some(80.0));
    }

    #[test]
    fn test_no_feasible_threshold() {
        let opt = ThresholdOptimizer::new()
            .with_thresholds(vec![20.0, 35.0])
            .with_max_fpr(0.0)
            .with_max_workload(0)
            .optimize(&samples());

        assert_eq!(opt.outcome, OptimizationOutcome::NoFeasibleThreshold);
        assert!(!opt.is_feasible());
        assert!(opt.value_sweep.is_empty());

        let json = serde_json::to_value(&opt).unwrap();
        assert_eq!(json["outcome"]["status"], "no_feasible_threshold");
    }

    #[test]
    fn test_validate() {
        assert!(ThresholdOptimizer::new().validate().is_ok());
        assert!(ThresholdOptimizer::new().with_max_fpr(1.5).validate().is_err());
        assert!(ThresholdOptimizer::new().with_thresholds(vec![]).validate().is_err());
    }
}
