//! Adversarial robustness
//!
//! Compares each case with a perturbed (e.g. paraphrased) rendition of the
//! same case: how far the score moves and how often the alert decision
//! at a fixed threshold flips. Producing the perturbed cases happens outside
//! the engine.

use futures::stream::{self, StreamExt};
use riskstream_core::{Error, Result, Vertical};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::dataset::{read_jsonl, resolve_ref};
use crate::evaluator::CaseScorer;

/// One original case and its perturbed counterpart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationPair {
    #[serde(alias = "original")]
    pub original_ref: String,

    #[serde(alias = "perturbed", alias = "rephrased")]
    pub perturbed_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<Vertical>,
}

impl PerturbationPair {
    pub fn new(original_ref: impl Into<String>, perturbed_ref: impl Into<String>) -> Self {
        Self {
            original_ref: original_ref.into(),
            perturbed_ref: perturbed_ref.into(),
            vertical: None,
        }
    }
}

/// Score movement under perturbation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessReport {
    /// Pairs where both sides were scored
    pub n: usize,
    pub n_skipped: usize,
    pub threshold: f64,
    /// Mean of `perturbed - original`
    pub mean_score_delta: f64,
    pub mean_abs_score_delta: f64,
    /// Fraction of pairs whose alert decision differs
    pub conclusion_flip_rate: f64,
    pub flips: usize,
}

impl RobustnessReport {
    /// Summarise `(original, perturbed)` score pairs
    pub fn from_scores(scores: &[(f64, f64)], n_skipped: usize, threshold: f64) -> Self {
        let n = scores.len();
        if n == 0 {
            return Self {
                n,
                n_skipped,
                threshold,
                mean_score_delta: 0.0,
                mean_abs_score_delta: 0.0,
                conclusion_flip_rate: 0.0,
                flips: 0,
            };
        }

        let deltas = scores.iter().map(|(original, perturbed)| perturbed - original);
        let sum: f64 = deltas.clone().sum();
        let abs_sum: f64 = deltas.map(f64::abs).sum();
        let flips = scores
            .iter()
            .filter(|(original, perturbed)| (*original >= threshold) != (*perturbed >= threshold))
            .count();

        Self {
            n,
            n_skipped,
            threshold,
            mean_score_delta: sum / n as f64,
            mean_abs_score_delta: abs_sum / n as f64,
            conclusion_flip_rate: flips as f64 / n as f64,
            flips,
        }
    }
}

/// Scores perturbation pairs and builds a [`RobustnessReport`]
#[derive(Clone)]
pub struct RobustnessEvaluator {
    scorer: Arc<dyn CaseScorer>,
    threshold: f64,
    concurrency: usize,
}

impl RobustnessEvaluator {
    pub fn new(scorer: Arc<dyn CaseScorer>) -> Self {
        Self {
            scorer,
            threshold: 50.0,
            concurrency: 4,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Load pairs from a JSON Lines file and evaluate them
    pub async fn evaluate_path(&self, path: &Path) -> Result<RobustnessReport> {
        let (pairs, unparsed): (Vec<PerturbationPair>, usize) = read_jsonl(path).await?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut report = self.evaluate(&pairs, &base_dir).await?;
        report.n_skipped += unparsed;
        Ok(report)
    }

    /// Evaluate pairs whose references resolve against `base_dir`.
    ///
    /// A pair is skipped when either side fails to score. Fails when no pair
    /// could be scored.
    pub async fn evaluate(
        &self,
        pairs: &[PerturbationPair],
        base_dir: &Path,
    ) -> Result<RobustnessReport> {
        let results: Vec<Option<(f64, f64)>> = stream::iter(pairs)
            .map(|pair| {
                let scorer = Arc::clone(&self.scorer);
                let original = resolve_ref(base_dir, &pair.original_ref);
                let perturbed = resolve_ref(base_dir, &pair.perturbed_ref);
                async move { score_pair(scorer.as_ref(), &original, &perturbed, pair.vertical).await }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let scores: Vec<(f64, f64)> = results.iter().flatten().copied().collect();
        if scores.is_empty() {
            return Err(Error::dataset("no perturbation pair could be scored"));
        }

        let report = RobustnessReport::from_scores(&scores, pairs.len() - scores.len(), self.threshold);
        info!(
            n = report.n,
            skipped = report.n_skipped,
            flip_rate = report.conclusion_flip_rate,
            "Robustness evaluation finished"
        );
        Ok(report)
    }
}

async fn score_pair(
    scorer: &dyn CaseScorer,
    original: &Path,
    perturbed: &Path,
    vertical: Option<Vertical>,
) -> Option<(f64, f64)> {
    let (a, b) = futures::join!(
        scorer.score_case(original, vertical),
        scorer.score_case(perturbed, vertical)
    );
    match (a, b) {
        (Ok(a), Ok(b)) if a.is_finite() && b.is_finite() => Some((a, b)),
        (Err(e), _) | (_, Err(e)) => {
            warn!(original = %original.display(), error = %e, "Skipping pair");
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_scores() {
        let report = RobustnessReport::from_scores(&[(60.0, 40.0), (30.0, 35.0), (80.0, 82.0)], 1, 50.0);

        assert_eq!(report.n, 3);
        assert_eq!(report.n_skipped, 1);
        assert_eq!(report.flips, 1);
        assert!((report.conclusion_flip_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((report.mean_score_delta - (-20.0 + 5.0 + 2.0) / 3.0).abs() < 1e-12);
        assert!((report.mean_abs_score_delta - 27.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_inclusive_for_flips() {
        let report = RobustnessReport::from_scores(&[(49.9, 50.0)], 0, 50.0);
        assert_eq!(report.flips, 1);
    }

    #[test]
    fn test_pair_aliases() {
        let pair: PerturbationPair =
            serde_json::from_str(r#"{"original": "a.json", "rephrased": "a2.json"}"#).unwrap();
        assert_eq!(pair, PerturbationPair::new("a.json", "a2.json"));
    }
}
