//! End-to-end evaluation over case documents on disk

use async_trait::async_trait;
use riskstream_core::{Error, Result, Vertical};
use riskstream_eval::{
    CalibrationMethod, CalibrationOptions, Calibrator, CaseScorer, EvaluationConfig, Evaluator,
    OptimizationSettings, OrchestratedScorer, PerturbationPair, RobustnessEvaluator,
};
use riskstream_policy::{PolicyConfig, WeightOverride};
use riskstream_signals::{OrchestratorConfig, SignalRegistry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Writes an insurance case whose only recorded signal is an inconsistency score
fn write_case(dir: &Path, name: &str, inconsistency: f64) -> PathBuf {
    let path = dir.join(name);
    let doc = serde_json::json!({
        "case_id": name,
        "vertical": "insurance",
        "claim_data": {"claim": {"amount": 5000}},
        "raw_text": "claim text",
        "recorded_signals": {
            "inconsistency": {"status": "success", "score": inconsistency, "summary": "recorded"}
        }
    });
    std::fs::write(&path, doc.to_string()).unwrap();
    path
}

fn orchestrated() -> Arc<OrchestratedScorer> {
    let scorer = OrchestratedScorer::from_policy(
        &PolicyConfig::default(),
        &SignalRegistry::with_defaults().unwrap(),
        &OrchestratorConfig::default(),
        None,
    )
    .unwrap();
    Arc::new(scorer)
}

/// Looks scores up by file name
struct TableScorer {
    scores: HashMap<String, f64>,
}

impl TableScorer {
    fn new(entries: &[(&str, f64)]) -> Self {
        Self {
            scores: entries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

#[async_trait]
impl CaseScorer for TableScorer {
    async fn score_case(&self, path: &Path, _vertical: Option<Vertical>) -> Result<f64> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.scores
            .get(name)
            .copied()
            .ok_or_else(|| Error::case_load(name, "not found"))
    }
}

#[tokio::test]
async fn test_orchestrated_scores_follow_renormalized_weights() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_case(dir.path(), "high.json", 80.0);

    // inconsistency 80 at .30 plus claim_characteristics 0 at .15
    let score = orchestrated().score_case(&path, None).await.unwrap();
    assert!((score - 80.0 * 0.30 / 0.45).abs() < 1e-9);
}

#[tokio::test]
async fn test_evaluate_dataset_with_skips_and_domains() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path(), "p1.json", 90.0);
    write_case(dir.path(), "p2.json", 85.0);
    write_case(dir.path(), "n1.json", 10.0);
    write_case(dir.path(), "n2.json", 0.0);

    let dataset = dir.path().join("labels.jsonl");
    std::fs::write(
        &dataset,
        [
            r#"{"input_ref": "p1.json", "label": 1, "domain": "eu"}"#,
            r#"{"input_ref": "p2.json", "label": 1, "domain": "us"}"#,
            r#"{"input": "n1.json", "label_fraud": 0, "region": "eu"}"#,
            r#"{"input_ref": "n2.json", "label": 0}"#,
            r#"{"input_ref": "missing.json", "label": 1}"#,
            "this line is not json",
        ]
        .join("\n"),
    )
    .unwrap();

    let config = EvaluationConfig {
        sweep_thresholds: true,
        calibration: Some(CalibrationOptions::new(CalibrationMethod::Isotonic)),
        calibrator_out: Some(dir.path().join("out/calibrator.json")),
        optimization: Some(OptimizationSettings::default()),
        ..Default::default()
    };
    let evaluator = Evaluator::new(orchestrated()).with_config(config).unwrap();
    let report = evaluator.evaluate_path(&dataset).await.unwrap();

    assert_eq!(report.n_evaluated, 4);
    assert_eq!(report.n_skipped, 2);
    assert_eq!(report.overall.n_positive, 2);
    assert_eq!(report.overall.auc, Some(1.0));
    assert_eq!(report.overall.operational_thresholds.len(), 13);
    assert_eq!(report.dataset.as_deref(), Some(dataset.as_path()));

    let domains = report.by_domain.as_ref().unwrap();
    assert_eq!(domains.len(), 3);
    assert_eq!(domains["eu"].n, 2);
    assert_eq!(domains["default"].n, 1);

    let calibration = report.calibration.as_ref().unwrap();
    let saved = calibration.calibrator_saved.as_ref().unwrap();
    let calibrator = Calibrator::load(saved).unwrap();
    assert_eq!(calibrator.method(), CalibrationMethod::Isotonic);

    assert!(report.threshold_optimization.as_ref().unwrap().is_feasible());
}

#[tokio::test]
async fn test_missing_dataset_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let evaluator = Evaluator::new(orchestrated());
    let result = evaluator.evaluate_path(&dir.path().join("absent.jsonl")).await;
    assert!(matches!(result, Err(Error::Dataset(_))));
}

#[tokio::test]
async fn test_all_rows_skipped_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("labels.jsonl");
    std::fs::write(&dataset, r#"{"input_ref": "gone.json", "label": 1}"#).unwrap();

    let result = Evaluator::new(orchestrated()).evaluate_path(&dataset).await;
    assert!(matches!(result, Err(Error::Dataset(_))));
}

#[tokio::test]
async fn test_vertical_filter_and_limit() {
    let scorer = Arc::new(TableScorer::new(&[("a.json", 70.0), ("b.json", 20.0), ("c.json", 60.0)]));
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("labels.jsonl");
    std::fs::write(
        &dataset,
        [
            r#"{"input_ref": "a.json", "label": 1, "vertical": "medical"}"#,
            r#"{"input_ref": "b.json", "label": 0, "vertical": "medical"}"#,
            r#"{"input_ref": "c.json", "label": 1}"#,
        ]
        .join("\n"),
    )
    .unwrap();

    let config = EvaluationConfig {
        vertical: Some(Vertical::Medical),
        limit: Some(1),
        ..Default::default()
    };
    let report = Evaluator::new(scorer)
        .with_config(config)
        .unwrap()
        .evaluate_path(&dataset)
        .await
        .unwrap();

    assert_eq!(report.n_evaluated, 1);
    assert_eq!(report.vertical_filter, Some(Vertical::Medical));
    assert_eq!(report.at_threshold.unwrap().counts.tp, 1);
}

#[tokio::test]
async fn test_weight_override_must_fit_some_vertical() {
    let registry = SignalRegistry::with_defaults().unwrap();
    let policy = PolicyConfig::default();
    let config = OrchestratorConfig::default();

    let insurance_only = WeightOverride::new().with("network_risk", 0.0);
    assert!(OrchestratedScorer::from_policy(&policy, &registry, &config, Some(&insurance_only)).is_ok());

    let typo = WeightOverride::new().with("inconsistancy", 0.2);
    assert!(OrchestratedScorer::from_policy(&policy, &registry, &config, Some(&typo)).is_err());

    let out_of_range = WeightOverride::new().with("inconsistency", 1.5);
    assert!(matches!(
        OrchestratedScorer::from_policy(&policy, &registry, &config, Some(&out_of_range)),
        Err(Error::InvalidWeight { .. })
    ));
}

#[tokio::test]
async fn test_robustness_over_pairs() {
    let scorer = Arc::new(TableScorer::new(&[
        ("a.json", 60.0),
        ("a2.json", 45.0),
        ("b.json", 20.0),
        ("b2.json", 24.0),
    ]));
    let dir = tempfile::tempdir().unwrap();
    let pairs_path = dir.path().join("pairs.jsonl");
    std::fs::write(
        &pairs_path,
        [
            r#"{"original_ref": "a.json", "perturbed_ref": "a2.json"}"#,
            r#"{"original_ref": "b.json", "perturbed_ref": "b2.json"}"#,
            r#"{"original_ref": "c.json", "perturbed_ref": "c2.json"}"#,
        ]
        .join("\n"),
    )
    .unwrap();

    let report = RobustnessEvaluator::new(scorer)
        .with_threshold(50.0)
        .evaluate_path(&pairs_path)
        .await
        .unwrap();

    assert_eq!(report.n, 2);
    assert_eq!(report.n_skipped, 1);
    assert_eq!(report.flips, 1);
    assert!((report.mean_score_delta - (-15.0 + 4.0) / 2.0).abs() < 1e-9);
    assert!((report.conclusion_flip_rate - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_robustness_without_scorable_pairs() {
    let scorer = Arc::new(TableScorer::new(&[]));
    let result = RobustnessEvaluator::new(scorer)
        .evaluate(&[PerturbationPair::new("x.json", "y.json")], Path::new("."))
        .await;
    assert!(matches!(result, Err(Error::Dataset(_))));
}
