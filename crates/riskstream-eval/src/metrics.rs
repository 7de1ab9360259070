//! Classification metrics over scored, labeled samples
//!
//! A sample is predicted positive when its score is at or above the
//! threshold. Ratios with an empty denominator report 0.0.

use serde::{Deserialize, Serialize};

/// A scored case with its ground-truth label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Overall score, 0-100
    pub score: f64,
    pub label: bool,
}

impl Sample {
    pub fn new(score: f64, label: bool) -> Self {
        Self { score, label }
    }
}

/// Default sweep: 20, 25, ..., 80
pub fn default_thresholds() -> Vec<f64> {
    (20..=80).step_by(5).map(f64::from).collect()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// 2x2 confusion counts at one threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tn: usize,
}

impl ConfusionCounts {
    pub fn at_threshold(samples: &[Sample], threshold: f64) -> Self {
        samples.iter().fold(Self::default(), |mut counts, sample| {
            match (sample.score >= threshold, sample.label) {
                (true, true) => counts.tp += 1,
                (true, false) => counts.fp += 1,
                (false, true) => counts.fn_ += 1,
                (false, false) => counts.tn += 1,
            }
            counts
        })
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }

    /// False positive rate: FP / (FP + TN)
    pub fn fpr(&self) -> f64 {
        ratio(self.fp, self.fp + self.tn)
    }

    /// Cases sent to manual review (every predicted positive)
    pub fn reviews(&self) -> usize {
        self.tp + self.fp
    }
}

/// Operational metrics at one threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMetrics {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub fpr: f64,
    #[serde(flatten)]
    pub counts: ConfusionCounts,
}

impl ThresholdMetrics {
    pub fn compute(samples: &[Sample], threshold: f64) -> Self {
        let counts = ConfusionCounts::at_threshold(samples, threshold);
        Self {
            threshold,
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
            fpr: counts.fpr(),
            counts,
        }
    }
}

/// Metrics at each threshold, in the order given
pub fn threshold_sweep(samples: &[Sample], thresholds: &[f64]) -> Vec<ThresholdMetrics> {
    thresholds
        .iter()
        .map(|&t| ThresholdMetrics::compute(samples, t))
        .collect()
}

/// Highest-F1 entry of a sweep; the first wins on ties
pub fn best_by_f1(sweep: &[ThresholdMetrics]) -> Option<&ThresholdMetrics> {
    sweep.iter().fold(None, |best, m| match best {
        Some(b) if b.f1 >= m.f1 => Some(b),
        _ => Some(m),
    })
}

/// ROC AUC via the Mann-Whitney rank-sum statistic.
///
/// Tied scores share their average rank. `None` when only one class is present.
pub fn auc(samples: &[Sample]) -> Option<f64> {
    let n_pos = samples.iter().filter(|s| s.label).count();
    let n_neg = samples.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut sorted: Vec<&Sample> = samples.iter().collect();
    sorted.sort_by(|a, b| a.score.total_cmp(&b.score));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < sorted.len() {
        let mut end = start;
        while end + 1 < sorted.len() && sorted[end + 1].score == sorted[start].score {
            end += 1;
        }
        // Ranks are 1-based; the tie group spans ranks start+1 ..= end+1
        let average_rank = (start + end) as f64 / 2.0 + 1.0;
        let positives = sorted[start..=end].iter().filter(|s| s.label).count();
        positive_rank_sum += average_rank * positives as f64;
        start = end + 1;
    }

    let u = positive_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos * n_neg) as f64)
}

/// Dataset-wide AUC plus metrics at each operational threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalReport {
    pub auc: Option<f64>,
    pub n: usize,
    pub n_positive: usize,
    pub n_negative: usize,
    pub operational_thresholds: Vec<ThresholdMetrics>,
}

impl OperationalReport {
    pub fn compute(samples: &[Sample], thresholds: &[f64]) -> Self {
        let n_positive = samples.iter().filter(|s| s.label).count();
        Self {
            auc: auc(samples),
            n: samples.len(),
            n_positive,
            n_negative: samples.len() - n_positive,
            operational_thresholds: threshold_sweep(samples, thresholds),
        }
    }

    /// Metrics at one threshold, if it was part of the sweep
    pub fn at(&self, threshold: f64) -> Option<&ThresholdMetrics> {
        self.operational_thresholds
            .iter()
            .find(|m| m.threshold == threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(pairs: &[(f64, bool)]) -> Vec<Sample> {
        pairs.iter().map(|&(s, l)| Sample::new(s, l)).collect()
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds = default_thresholds();
        assert_eq!(thresholds.len(), 13);
        assert_eq!(thresholds[0], 20.0);
        assert_eq!(thresholds[12], 80.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let counts = ConfusionCounts::at_threshold(&samples(&[(50.0, true), (50.0, false)]), 50.0);
        assert_eq!(counts.tp, 1);
        assert_eq!(counts.fp, 1);
        assert_eq!(counts.reviews(), 2);
    }

    #[test]
    fn test_empty_denominators_report_zero() {
        let m = ThresholdMetrics::compute(&samples(&[(10.0, false), (20.0, false)]), 90.0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.fpr, 0.0);
        assert_eq!(m.counts.tn, 2);
    }

    #[test]
    fn test_auc_perfect_and_inverted() {
        let perfect = samples(&[(10.0, false), (20.0, false), (80.0, true), (90.0, true)]);
        assert_eq!(auc(&perfect), Some(1.0));

        let inverted = samples(&[(10.0, true), (20.0, true), (80.0, false), (90.0, false)]);
        assert_eq!(auc(&inverted), Some(0.0));
    }

    #[test]
    fn test_auc_ties_count_half() {
        let tied = samples(&[(50.0, true), (50.0, false)]);
        assert_eq!(auc(&tied), Some(0.5));
    }

    #[test]
    fn test_auc_single_class() {
        assert_eq!(auc(&samples(&[(10.0, true), (90.0, true)])), None);
        assert_eq!(auc(&[]), None);
    }

    #[test]
    fn test_best_by_f1_prefers_first() {
        let s = samples(&[(30.0, true), (60.0, false)]);
        let sweep = threshold_sweep(&s, &[20.0, 25.0, 70.0]);
        let best = best_by_f1(&sweep).unwrap();
        assert_eq!(best.threshold, 20.0);
    }

    #[test]
    fn test_report_counts() {
        let s = samples(&[(10.0, false), (60.0, true), (70.0, false)]);
        let report = OperationalReport::compute(&s, &default_thresholds());
        assert_eq!(report.n, 3);
        assert_eq!(report.n_positive, 1);
        assert_eq!(report.n_negative, 2);
        assert_eq!(report.operational_thresholds.len(), 13);
        assert!(report.at(50.0).is_some());
        assert!(report.at(52.0).is_none());
    }

    #[test]
    fn test_metrics_serialize_with_fn_key() {
        let m = ThresholdMetrics::compute(&samples(&[(10.0, true)]), 50.0);
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["fn"], 1);
        assert_eq!(json["threshold"], 50.0);
    }
}
