//! Two-phase case orchestrator
//!
//! Signal sources for a case run concurrently in a [`JoinSet`], each wrapped
//! in its own timeout and panic guard. Every outcome is captured as a typed
//! [`SignalResult`] and re-keyed by factor kind before scoring, so neither
//! arrival order nor a misbehaving source changes what the others report.

use futures::FutureExt;
use riskstream_core::{
    Case, Error, FactorKind, FactorSignal, Result, ScoreResult, SignalResult, SignalStatus, SourceReport,
    Vertical,
};
use riskstream_policy::{EnsembleScorer, WeightOverride};
use riskstream_telemetry::MetricsCollector;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::explain::{fallback_reasoning, Explainer, TemplateExplainer};
use crate::extract::{Extractor, JsonCaseExtractor};
use crate::plan::SignalPlan;
use crate::source::SignalSource;

/// Orchestrator tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Deadline for each signal source
    #[serde(default = "default_signal_timeout_ms")]
    pub signal_timeout_ms: u64,

    /// Deadline for each explanation task
    #[serde(default = "default_explanation_timeout_ms")]
    pub explanation_timeout_ms: u64,

    /// Flag descriptions kept as evidence per factor
    #[serde(default = "default_evidence_limit")]
    pub evidence_limit: usize,
}

fn default_signal_timeout_ms() -> u64 {
    30_000
}

fn default_explanation_timeout_ms() -> u64 {
    30_000
}

fn default_evidence_limit() -> usize {
    3
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            signal_timeout_ms: default_signal_timeout_ms(),
            explanation_timeout_ms: default_explanation_timeout_ms(),
            evidence_limit: default_evidence_limit(),
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.signal_timeout_ms == 0 || self.explanation_timeout_ms == 0 {
            return Err(Error::config(
                "orchestrator timeouts must be greater than zero",
            ));
        }
        Ok(())
    }

    fn signal_timeout(&self) -> Duration {
        Duration::from_millis(self.signal_timeout_ms)
    }

    fn explanation_timeout(&self) -> Duration {
        Duration::from_millis(self.explanation_timeout_ms)
    }
}

/// Complete analysis of one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseAnalysis {
    pub case_id: String,
    pub vertical: Vertical,
    pub score: ScoreResult,
    /// Per-source payloads in factor order
    pub sources: Vec<SourceReport>,
    #[serde(default)]
    pub narrative: String,
}

impl CaseAnalysis {
    pub fn overall_score(&self) -> f64 {
        self.score.overall_score
    }

    pub fn source(&self, kind: FactorKind) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.kind == kind)
    }
}

struct Outcome {
    kind: FactorKind,
    result: SignalResult,
    latency_ms: u64,
}

/// Runs a vertical's signal plan for each case and scores the results
#[derive(Clone)]
pub struct Orchestrator {
    plan: SignalPlan,
    scorer: EnsembleScorer,
    explainer: Arc<dyn Explainer>,
    extractor: Arc<dyn Extractor>,
    config: OrchestratorConfig,
    metrics: MetricsCollector,
}

impl Orchestrator {
    /// Create an orchestrator; every source in the plan must be weighted by
    /// the scorer
    pub fn new(plan: SignalPlan, scorer: EnsembleScorer) -> Result<Self> {
        if let Some(kind) = plan.kinds().find(|k| !scorer.supports(*k)) {
            return Err(Error::config(format!(
                "{} plan includes {kind}, which the scorer does not weight",
                plan.vertical()
            )));
        }

        Ok(Self {
            plan,
            scorer,
            explainer: Arc::new(TemplateExplainer::new()),
            extractor: Arc::new(JsonCaseExtractor::new()),
            config: OrchestratorConfig::default(),
            metrics: MetricsCollector::new(),
        })
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Share a metrics collector across orchestrators
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Merge a weight override into the scorer, validating it up front so
    /// that analysis itself cannot fail
    pub fn with_weight_override(mut self, overrides: &WeightOverride) -> Result<Self> {
        self.scorer = self.scorer.with_weight_override(overrides)?;
        Ok(self)
    }

    pub fn vertical(&self) -> Vertical {
        self.plan.vertical()
    }

    pub fn plan(&self) -> &SignalPlan {
        &self.plan
    }

    pub fn scorer(&self) -> &EnsembleScorer {
        &self.scorer
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Extract a case from a document and analyze it.
    ///
    /// Extraction failure is the only error.
    pub async fn analyze_path(&self, path: &Path) -> Result<CaseAnalysis> {
        let case = self.extractor.extract(path).await?;
        Ok(self.analyze(case).await)
    }

    /// Analyze a case. Always completes.
    pub async fn analyze(&self, case: Case) -> CaseAnalysis {
        let start = Instant::now();

        if case.vertical != self.vertical() {
            warn!(
                case_id = %case.case_id,
                case_vertical = %case.vertical,
                plan_vertical = %self.vertical(),
                "Case vertical differs from plan, scoring with plan"
            );
        }

        let case = Arc::new(case);
        let outcomes = self.run_signals(&case).await;

        let mut factors = Vec::with_capacity(outcomes.len());
        let mut sources = Vec::with_capacity(outcomes.len());

        for outcome in outcomes.values() {
            if let Some(factor) =
                to_factor(outcome.kind, &outcome.result, self.config.evidence_limit)
            {
                factors.push(factor);
            }
            sources.push(SourceReport::from_result(
                outcome.kind,
                &outcome.result,
                outcome.latency_ms,
            ));
        }

        let mut score = match self.scorer.score(&factors, None) {
            Ok(score) => score,
            Err(e) => {
                error!(case_id = %case.case_id, error = %e, "Scoring failed, reporting baseline");
                self.scorer.baseline()
            }
        };

        let (reasoning, narrative) = self.explain(&case, &score, &sources).await;
        score.reasoning = reasoning;

        let latency_us = start.elapsed().as_micros() as u64;
        self.metrics.record_case(latency_us);

        info!(
            case_id = %case.case_id,
            vertical = %self.vertical(),
            score = score.overall_score,
            risk_level = %score.risk_level,
            factors = score.risk_factors.len(),
            latency_us,
            "Analysis complete"
        );

        CaseAnalysis {
            case_id: case.case_id.clone(),
            vertical: self.vertical(),
            score,
            sources,
            narrative,
        }
    }

    /// Run every applicable source concurrently and collect one outcome per
    /// planned kind
    async fn run_signals(&self, case: &Arc<Case>) -> BTreeMap<FactorKind, Outcome> {
        let (run, omitted) = self.plan.partition(case);
        let mut outcomes = BTreeMap::new();

        for (kind, reason) in omitted {
            debug!(case_id = %case.case_id, source = %kind, reason, "Source not applicable");
            self.metrics.record_signal(kind, SignalStatus::Skipped, 0);
            outcomes.insert(
                kind,
                Outcome {
                    kind,
                    result: SignalResult::skipped(reason),
                    latency_ms: 0,
                },
            );
        }

        let deadline = self.config.signal_timeout();
        let mut tasks = JoinSet::new();

        for source in &run {
            let source = Arc::clone(source);
            let case = Arc::clone(case);
            let metrics = self.metrics.clone();

            tasks.spawn(async move { evaluate_isolated(source, case, deadline, metrics).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    outcomes.insert(outcome.kind, outcome);
                }
                Err(e) => {
                    error!(case_id = %case.case_id, error = %e, "Signal task did not complete");
                }
            }
        }

        for source in &run {
            let kind = source.kind();
            outcomes.entry(kind).or_insert_with(|| {
                self.metrics.record_signal(kind, SignalStatus::Failed, 0);
                Outcome {
                    kind,
                    result: SignalResult::failed("signal task aborted"),
                    latency_ms: 0,
                }
            });
        }

        outcomes
    }

    /// Reasoning and narrative, concurrently, each with its own fallback
    async fn explain(
        &self,
        case: &Case,
        score: &ScoreResult,
        sources: &[SourceReport],
    ) -> (String, String) {
        let deadline = self.config.explanation_timeout();

        let reasoning = timeout(
            deadline,
            AssertUnwindSafe(self.explainer.reasoning(case, score)).catch_unwind(),
        );
        let narrative = timeout(
            deadline,
            AssertUnwindSafe(self.explainer.narrative(case, score, sources)).catch_unwind(),
        );

        let (reasoning, narrative) = tokio::join!(reasoning, narrative);

        let reasoning = match reasoning {
            Ok(Ok(Ok(text))) => text,
            other => {
                warn!(case_id = %case.case_id, reason = %describe_failure(other), "Reasoning unavailable");
                fallback_reasoning(score)
            }
        };

        let narrative = match narrative {
            Ok(Ok(Ok(text))) => text,
            other => {
                warn!(case_id = %case.case_id, reason = %describe_failure(other), "Narrative unavailable");
                String::new()
            }
        };

        (reasoning, narrative)
    }
}

type Guarded<T> = std::result::Result<
    std::result::Result<Result<T>, Box<dyn Any + Send>>,
    tokio::time::error::Elapsed,
>;

async fn evaluate_isolated(
    source: Arc<dyn SignalSource>,
    case: Arc<Case>,
    deadline: Duration,
    metrics: MetricsCollector,
) -> Outcome {
    let kind = source.kind();
    let start = Instant::now();

    let guarded: Guarded<SignalResult> = timeout(
        deadline,
        AssertUnwindSafe(source.evaluate(&case)).catch_unwind(),
    )
    .await;

    let result = match guarded {
        Ok(Ok(Ok(result))) => validate(result),
        Ok(Ok(Err(e))) => SignalResult::failed(failure_reason(&e)),
        Ok(Err(panic)) => SignalResult::failed(format!("source panicked: {}", panic_message(&*panic))),
        Err(_) => {
            metrics.record_timeout(kind);
            SignalResult::failed(format!("timed out after {}ms", deadline.as_millis()))
        }
    };

    let latency = start.elapsed();
    metrics.record_signal(kind, result.status(), latency.as_micros() as u64);

    match &result {
        SignalResult::Failed { reason } => {
            warn!(case_id = %case.case_id, source = source.name(), reason = %reason, "Signal source failed");
        }
        other => {
            debug!(
                case_id = %case.case_id,
                source = source.name(),
                status = other.status().as_str(),
                score = other.score(),
                "Signal source finished"
            );
        }
    }

    Outcome {
        kind,
        result,
        latency_ms: latency.as_millis() as u64,
    }
}

/// Reject successful results whose score is not a number
/// A source's own error message, without the taxonomy prefix
fn failure_reason(error: &Error) -> String {
    match error {
        Error::Signal(message) => message.clone(),
        other => other.to_string(),
    }
}

fn validate(result: SignalResult) -> SignalResult {
    if let SignalResult::Success { score, .. } = &result {
        if !score.is_finite() {
            return SignalResult::failed(format!("malformed score {score}"));
        }
    }
    result
}

/// Factor for one outcome: skipped sources contribute nothing, failed ones
/// a neutral zero
fn to_factor(kind: FactorKind, result: &SignalResult, evidence_limit: usize) -> Option<FactorSignal> {
    match result {
        SignalResult::Success { flags, summary, .. } => Some(
            FactorSignal::new(kind, result.score())
                .with_description(summary.clone())
                .with_evidence(
                    flags
                        .iter()
                        .take(evidence_limit)
                        .map(|f| f.description.clone())
                        .collect(),
                ),
        ),
        SignalResult::Failed { reason } => Some(FactorSignal::neutral(kind, reason.clone())),
        SignalResult::Skipped { .. } => None,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn describe_failure<T>(guarded: Guarded<T>) -> String {
    match guarded {
        Ok(Ok(Ok(_))) => String::new(),
        Ok(Ok(Err(e))) => e.to_string(),
        Ok(Err(panic)) => format!("panicked: {}", panic_message(&*panic)),
        Err(_) => "timed out".to_string(),
    }
}
