//! Batch evaluation over a labeled dataset
//!
//! Rows are scored by a [`CaseScorer`] in a bounded worker pool. Rows whose
//! case cannot be loaded or scored are counted in `n_skipped` and excluded
//! from every metric; they never abort the run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use riskstream_core::{Error, Result, Vertical};
use riskstream_policy::{PolicyConfig, WeightOverride};
use riskstream_signals::{Extractor, JsonCaseExtractor, Orchestrator, OrchestratorConfig, SignalRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::calibration::{calibrate, CalibrationOptions, CalibrationSummary, Calibrator};
use crate::dataset::{Dataset, LabeledRow};
use crate::metrics::{default_thresholds, OperationalReport, Sample, ThresholdMetrics};
use crate::optimizer::{Constraints, ThresholdOptimization, ThresholdOptimizer, ValueModel};

/// Produces an overall score for a case document
#[async_trait]
pub trait CaseScorer: Send + Sync {
    /// Score the case at `path`. `vertical` overrides the case's own vertical.
    async fn score_case(&self, path: &Path, vertical: Option<Vertical>) -> Result<f64>;
}

/// Scores cases through the full orchestrator, one per vertical
#[derive(Clone)]
pub struct OrchestratedScorer {
    orchestrators: HashMap<Vertical, Orchestrator>,
    extractor: Arc<dyn Extractor>,
}

impl Default for OrchestratedScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratedScorer {
    pub fn new() -> Self {
        Self {
            orchestrators: HashMap::new(),
            extractor: Arc::new(JsonCaseExtractor::new()),
        }
    }

    /// Build orchestrators for every vertical from a policy and a registry
    pub fn from_policy(
        policy: &PolicyConfig,
        registry: &SignalRegistry,
        config: &OrchestratorConfig,
        overrides: Option<&WeightOverride>,
    ) -> Result<Self> {
        let overrides = overrides.filter(|o| !o.is_empty());
        let mut scorer = Self::new();
        let mut last_rejection = None;
        let mut applied = false;

        for vertical in Vertical::ALL {
            let plan = registry.plan(vertical, &policy.weight_table(vertical))?;
            let mut orchestrator =
                Orchestrator::new(plan, policy.scorer(vertical))?.with_config(config.clone())?;

            // Overrides apply to the verticals whose table holds every key
            if let Some(overrides) = overrides {
                match orchestrator.clone().with_weight_override(overrides) {
                    Ok(adjusted) => {
                        orchestrator = adjusted;
                        applied = true;
                    }
                    Err(e @ Error::InvalidWeight { .. }) => return Err(e),
                    Err(e) => {
                        debug!(%vertical, error = %e, "Weight override not applicable");
                        last_rejection = Some(e);
                    }
                }
            }
            scorer = scorer.with_orchestrator(orchestrator);
        }

        match last_rejection {
            Some(e) if !applied => Err(e),
            _ => Ok(scorer),
        }
    }

    /// Register an orchestrator under its plan's vertical
    pub fn with_orchestrator(mut self, orchestrator: Orchestrator) -> Self {
        self.orchestrators.insert(orchestrator.vertical(), orchestrator);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn orchestrator(&self, vertical: Vertical) -> Option<&Orchestrator> {
        self.orchestrators.get(&vertical)
    }
}

#[async_trait]
impl CaseScorer for OrchestratedScorer {
    async fn score_case(&self, path: &Path, vertical: Option<Vertical>) -> Result<f64> {
        let case = self.extractor.extract(path).await?;
        let vertical = vertical.unwrap_or(case.vertical);
        let orchestrator = self
            .orchestrators
            .get(&vertical)
            .ok_or_else(|| Error::config(format!("no orchestrator for vertical {vertical}")))?;

        Ok(orchestrator.analyze(case).await.overall_score())
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_threshold() -> f64 {
    50.0
}

/// Threshold optimization settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSettings {
    #[serde(flatten)]
    pub value: ValueModel,
    #[serde(flatten)]
    pub constraints: Constraints,
}

/// What an evaluation run computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Rows scored concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Single operational threshold reported when not sweeping
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Report at 20, 25, ..., 80 instead of the single threshold
    #[serde(default)]
    pub sweep_thresholds: bool,

    /// Score every row under this vertical and drop rows of other verticals
    #[serde(default)]
    pub vertical: Option<Vertical>,

    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub calibration: Option<CalibrationOptions>,

    /// Where to persist the fitted calibrator
    #[serde(default)]
    pub calibrator_out: Option<PathBuf>,

    #[serde(default)]
    pub optimization: Option<OptimizationSettings>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            threshold: default_threshold(),
            sweep_thresholds: false,
            vertical: None,
            limit: None,
            calibration: None,
            calibrator_out: None,
            optimization: None,
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(Error::config(format!(
                "threshold must be within [0, 100], got {}",
                self.threshold
            )));
        }
        if let Some(calibration) = &self.calibration {
            calibration.validate()?;
        }
        if let Some(settings) = &self.optimization {
            self.optimizer(settings).validate()?;
        }
        Ok(())
    }

    fn thresholds(&self) -> Vec<f64> {
        if self.sweep_thresholds {
            default_thresholds()
        } else {
            vec![self.threshold]
        }
    }

    fn optimizer(&self, settings: &OptimizationSettings) -> ThresholdOptimizer {
        ThresholdOptimizer::new()
            .with_value_model(settings.value)
            .with_constraints(settings.constraints)
    }
}

/// A dataset row and its score, if it could be scored
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub row: LabeledRow,
    pub score: Option<f64>,
}

impl ScoredRow {
    pub fn sample(&self) -> Option<Sample> {
        self.score.map(|score| Sample::new(score, self.row.label))
    }
}

/// Evaluation report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_filter: Option<Vertical>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// AUC, class counts and the operational thresholds
    #[serde(flatten)]
    pub overall: OperationalReport,

    pub n_evaluated: usize,

    /// Rows that could not be parsed, loaded or scored
    pub n_skipped: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_threshold: Option<ThresholdMetrics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationSummary>,

    /// Set when calibration was requested but refused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_optimization: Option<ThresholdOptimization>,

    /// Per-domain reports; present only when rows carry a domain tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_domain: Option<BTreeMap<String, OperationalReport>>,
}

/// Domain used for scored rows without a tag
pub const DEFAULT_DOMAIN: &str = "default";

/// Runs a [`CaseScorer`] over a dataset and builds the report
#[derive(Clone)]
pub struct Evaluator {
    scorer: Arc<dyn CaseScorer>,
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(scorer: Arc<dyn CaseScorer>) -> Self {
        Self {
            scorer,
            config: EvaluationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Load a dataset file and evaluate it
    pub async fn evaluate_path(&self, path: &Path) -> Result<EvaluationReport> {
        let dataset = Dataset::load(path).await?;
        let mut report = self.evaluate(dataset).await?;
        report.dataset = Some(path.to_path_buf());
        Ok(report)
    }

    /// Evaluate a dataset.
    ///
    /// Fails only when no row remains after filtering or no row could be
    /// scored.
    pub async fn evaluate(&self, dataset: Dataset) -> Result<EvaluationReport> {
        let mut dataset = dataset;
        if let Some(vertical) = self.config.vertical {
            dataset = dataset.filter_vertical(vertical);
        }
        if let Some(limit) = self.config.limit {
            dataset = dataset.limit(limit);
        }
        if dataset.is_empty() {
            return Err(Error::dataset("no rows to evaluate"));
        }

        let scored = self.score_rows(&dataset).await;
        let (mut report, calibrator) = assemble(&scored, dataset.unparsed(), &self.config)?;

        if let (Some(calibrator), Some(summary), Some(path)) = (
            calibrator,
            report.calibration.as_mut(),
            self.config.calibrator_out.as_ref(),
        ) {
            calibrator.save(path)?;
            summary.calibrator_saved = Some(path.clone());
        }

        Ok(report)
    }

    /// Score every row with bounded concurrency, preserving row order
    pub async fn score_rows(&self, dataset: &Dataset) -> Vec<ScoredRow> {
        let forced = self.config.vertical;

        let mut scored: Vec<(usize, ScoredRow)> = stream::iter(dataset.rows().iter().enumerate())
            .map(|(index, row)| {
                let scorer = Arc::clone(&self.scorer);
                let path = dataset.resolve(row);
                let vertical = forced.or(row.vertical);
                async move {
                    let score = match scorer.score_case(&path, vertical).await {
                        Ok(score) if score.is_finite() => Some(score),
                        Ok(score) => {
                            warn!(path = %path.display(), score, "Discarding non-finite score");
                            None
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Skipping row");
                            None
                        }
                    };
                    (
                        index,
                        ScoredRow {
                            row: row.clone(),
                            score,
                        },
                    )
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        scored.sort_by_key(|(index, _)| *index);
        scored.into_iter().map(|(_, row)| row).collect()
    }
}

/// Build the report from scored rows.
///
/// `unparsed` lines are added to `n_skipped`. Calibration refusal is recorded
/// in `calibration_error` rather than failing the report.
pub fn build_report(
    scored: &[ScoredRow],
    unparsed: usize,
    config: &EvaluationConfig,
) -> Result<EvaluationReport> {
    assemble(scored, unparsed, config).map(|(report, _)| report)
}

fn assemble(
    scored: &[ScoredRow],
    unparsed: usize,
    config: &EvaluationConfig,
) -> Result<(EvaluationReport, Option<Calibrator>)> {
    let samples: Vec<Sample> = scored.iter().filter_map(ScoredRow::sample).collect();
    if samples.is_empty() {
        return Err(Error::dataset("no valid scores (all rows skipped or failed)"));
    }
    let n_skipped = scored.len() - samples.len() + unparsed;

    let thresholds = config.thresholds();
    let overall = OperationalReport::compute(&samples, &thresholds);
    let at_threshold =
        (!config.sweep_thresholds).then(|| ThresholdMetrics::compute(&samples, config.threshold));

    let (calibrator, calibration, calibration_error) = match &config.calibration {
        Some(options) => match calibrate(&samples, options) {
            Ok((calibrator, summary)) => (Some(calibrator), Some(summary), None),
            Err(Error::InsufficientCalibrationData(reason)) => {
                warn!(%reason, "Calibration refused");
                (None, None, Some(reason))
            }
            Err(e) => return Err(e),
        },
        None => (None, None, None),
    };

    let threshold_optimization = config
        .optimization
        .as_ref()
        .map(|settings| config.optimizer(settings).optimize(&samples));

    let by_domain = domain_reports(scored);

    info!(
        n = samples.len(),
        skipped = n_skipped,
        auc = ?overall.auc,
        "Evaluation finished"
    );

    let report = EvaluationReport {
        generated_at: Utc::now(),
        dataset: None,
        vertical_filter: config.vertical,
        limit: config.limit,
        n_evaluated: samples.len(),
        overall,
        n_skipped,
        at_threshold,
        calibration,
        calibration_error,
        threshold_optimization,
        by_domain,
    };
    Ok((report, calibrator))
}

/// Group scored rows by domain tag. `None` unless some scored row is tagged.
pub fn domain_reports(scored: &[ScoredRow]) -> Option<BTreeMap<String, OperationalReport>> {
    let mut groups: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
    let mut tagged = false;

    for row in scored {
        let Some(sample) = row.sample() else {
            continue;
        };
        tagged |= row.row.domain.is_some();
        let domain = row.row.domain.as_deref().unwrap_or(DEFAULT_DOMAIN);
        groups.entry(domain.to_string()).or_default().push(sample);
    }

    if !tagged {
        return None;
    }

    let thresholds = default_thresholds();
    Some(
        groups
            .into_iter()
            .map(|(domain, samples)| (domain, OperationalReport::compute(&samples, &thresholds)))
            .collect(),
    )
}
