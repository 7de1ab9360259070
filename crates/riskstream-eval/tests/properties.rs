//! Metric and calibration properties

use proptest::prelude::*;
use riskstream_eval::{
    auc, default_thresholds, threshold_sweep, CalibrationMethod, Calibrator, Sample,
    ThresholdMetrics,
};

fn labeled_scores() -> impl Strategy<Value = Vec<Sample>> {
    prop::collection::vec((0.0f64..=100.0, any::<bool>()), 2..60)
        .prop_map(|pairs| pairs.into_iter().map(|(s, l)| Sample::new(s, l)).collect())
}

fn two_class_scores() -> impl Strategy<Value = Vec<Sample>> {
    labeled_scores().prop_map(|mut samples| {
        samples[0].label = true;
        samples[1].label = false;
        samples
    })
}

#[test]
fn test_scenario_b_confusion_at_50() {
    let labels = [1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
    let scores = [90.0, 80.0, 40.0, 70.0, 60.0, 50.0, 30.0, 20.0, 10.0, 5.0];
    let samples: Vec<Sample> = scores
        .iter()
        .zip(labels)
        .map(|(&s, l)| Sample::new(s, l == 1))
        .collect();

    let m = ThresholdMetrics::compute(&samples, 50.0);
    assert_eq!((m.counts.tp, m.counts.fp, m.counts.fn_, m.counts.tn), (2, 3, 1, 4));
    assert!((m.precision - 0.4).abs() < 1e-9);
    assert!((m.recall - 2.0 / 3.0).abs() < 1e-9);
    assert!((m.fpr - 3.0 / 7.0).abs() < 1e-9);
    assert!((m.f1 - 0.5).abs() < 1e-9);
}

proptest! {
    #[test]
    fn recall_and_fpr_never_increase_with_threshold(samples in labeled_scores()) {
        let sweep = threshold_sweep(&samples, &default_thresholds());
        for pair in sweep.windows(2) {
            prop_assert!(pair[1].recall <= pair[0].recall);
            prop_assert!(pair[1].fpr <= pair[0].fpr);
            prop_assert!(pair[1].counts.reviews() <= pair[0].counts.reviews());
        }
    }

    #[test]
    fn confusion_counts_partition_the_samples(samples in labeled_scores(), threshold in 0.0f64..=100.0) {
        let m = ThresholdMetrics::compute(&samples, threshold);
        let c = m.counts;
        prop_assert_eq!(c.tp + c.fp + c.fn_ + c.tn, samples.len());
    }

    #[test]
    fn auc_is_a_probability(samples in two_class_scores()) {
        let value = auc(&samples).unwrap();
        prop_assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn calibrated_output_is_a_probability(
        samples in two_class_scores(),
        score in 0.0f64..=100.0,
    ) {
        for method in [CalibrationMethod::Platt, CalibrationMethod::Isotonic] {
            let calibrator = Calibrator::fit(method, &samples).unwrap();
            let p = calibrator.apply(score);
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn isotonic_is_monotone(samples in two_class_scores(), a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
        let calibrator = Calibrator::fit(CalibrationMethod::Isotonic, &samples).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calibrator.apply(lo) <= calibrator.apply(hi) + 1e-12);
    }
}
