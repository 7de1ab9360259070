//! riskstream evaluation
//!
//! Offline tooling around the risk decision engine:
//! - Labeled JSON Lines datasets ([`Dataset`])
//! - Precision, recall, F1, FPR sweeps and AUC ([`OperationalReport`])
//! - Platt and isotonic calibration with Brier score and ECE ([`Calibrator`])
//! - Value-optimal thresholds under FPR and workload constraints
//!   ([`ThresholdOptimizer`])
//! - Batch evaluation with skip accounting and per-domain breakdown
//!   ([`Evaluator`])
//! - Score stability under perturbed inputs ([`RobustnessEvaluator`])

pub mod calibration;
pub mod dataset;
pub mod evaluator;
pub mod metrics;
pub mod optimizer;
pub mod robustness;

pub use calibration::{
    brier_score, calibrate, expected_calibration_error, CalibrationMethod, CalibrationOptions,
    CalibrationQuality, CalibrationSummary, Calibrator, IsotonicParams, PlattParams,
};
pub use dataset::{Dataset, LabeledRow};
pub use evaluator::{
    build_report, CaseScorer, EvaluationConfig, EvaluationReport, Evaluator, OptimizationSettings,
    OrchestratedScorer, ScoredRow,
};
pub use metrics::{
    auc, default_thresholds, threshold_sweep, ConfusionCounts, OperationalReport, Sample,
    ThresholdMetrics,
};
pub use optimizer::{
    Constraints, OptimizationOutcome, ThresholdOptimization, ThresholdOptimizer, ThresholdValue,
    ValueModel,
};
pub use robustness::{PerturbationPair, RobustnessEvaluator, RobustnessReport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::calibration::{CalibrationMethod, Calibrator};
    pub use crate::dataset::Dataset;
    pub use crate::evaluator::{CaseScorer, EvaluationConfig, Evaluator, OrchestratedScorer};
    pub use crate::metrics::Sample;
}
