//! Subcommand implementations

use anyhow::{Context, Result};
use riskstream_core::Vertical;
use riskstream_eval::{Calibrator, Evaluator, OrchestratedScorer, RobustnessEvaluator};
use riskstream_policy::WeightOverride;
use riskstream_signals::{Extractor, JsonCaseExtractor, Orchestrator, SignalRegistry};
use riskstream_telemetry::MetricsCollector;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cli::EvaluateArgs;
use crate::config::EngineConfig;

fn load_overrides(path: Option<&Path>) -> Result<Option<WeightOverride>> {
    path.map(|p| {
        WeightOverride::from_file(p)
            .with_context(|| format!("Failed to load weight overrides from {}", p.display()))
    })
    .transpose()
}

/// Print a report as pretty JSON, optionally writing it to a file too
fn emit<T: Serialize>(report: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(path) = output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }
    println!("{json}");
    Ok(())
}

pub async fn analyze(
    config: EngineConfig,
    case_path: &Path,
    vertical: Option<Vertical>,
    weights: Option<&Path>,
) -> Result<()> {
    let mut extractor = JsonCaseExtractor::new();
    if let Some(vertical) = vertical {
        extractor = extractor.with_vertical(vertical);
    }
    let case = extractor.extract(case_path).await?;
    let vertical = case.vertical;

    let registry = SignalRegistry::with_defaults()?;
    let plan = registry.plan(vertical, &config.policy.weight_table(vertical))?;
    let metrics = MetricsCollector::new();

    let mut orchestrator = Orchestrator::new(plan, config.policy.scorer(vertical))?
        .with_config(config.orchestrator)?
        .with_metrics(metrics.clone());
    if let Some(overrides) = load_overrides(weights)? {
        orchestrator = orchestrator.with_weight_override(&overrides)?;
    }

    info!(case_id = %case.case_id, %vertical, mode = %config.policy.mode, "Analyzing case");
    let analysis = orchestrator.analyze(case).await;
    debug!(metrics = ?metrics.snapshot(), "Signal metrics");

    emit(&analysis, None)
}

pub async fn evaluate(mut config: EngineConfig, args: &EvaluateArgs) -> Result<()> {
    config.apply_evaluate_args(args)?;

    let overrides = load_overrides(args.weights.as_deref())?;
    let registry = SignalRegistry::with_defaults()?;
    let scorer = OrchestratedScorer::from_policy(
        &config.policy,
        &registry,
        &config.orchestrator,
        overrides.as_ref(),
    )?;

    info!(
        dataset = %args.dataset.display(),
        mode = %config.policy.mode,
        concurrency = config.evaluation.concurrency,
        "Starting evaluation"
    );
    let evaluator = Evaluator::new(Arc::new(scorer)).with_config(config.evaluation)?;
    let report = evaluator
        .evaluate_path(&args.dataset)
        .await
        .with_context(|| format!("Evaluation of {} failed", args.dataset.display()))?;

    emit(&report, args.output.as_deref())
}

#[derive(Serialize)]
struct CalibratedScore {
    score: f64,
    probability: f64,
}

pub fn calibrate_apply(calibrator_path: &Path, scores: &[f64]) -> Result<()> {
    let calibrator = Calibrator::load(calibrator_path)
        .with_context(|| format!("Failed to load calibrator {}", calibrator_path.display()))?;

    let mapped: Vec<CalibratedScore> = scores
        .iter()
        .map(|&score| CalibratedScore {
            score,
            probability: calibrator.apply(score),
        })
        .collect();

    emit(&mapped, None)
}

pub async fn robustness(
    config: EngineConfig,
    pairs: &Path,
    threshold: f64,
    output: Option<&Path>,
) -> Result<()> {
    let registry = SignalRegistry::with_defaults()?;
    let scorer =
        OrchestratedScorer::from_policy(&config.policy, &registry, &config.orchestrator, None)?;

    let report = RobustnessEvaluator::new(Arc::new(scorer))
        .with_threshold(threshold)
        .with_concurrency(config.evaluation.concurrency)
        .evaluate_path(pairs)
        .await
        .with_context(|| format!("Robustness evaluation of {} failed", pairs.display()))?;

    emit(&report, output)
}
