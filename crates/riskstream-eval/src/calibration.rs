//! Score calibration
//!
//! Maps raw 0-100 scores to empirical probabilities of the positive label.
//!
//! | Method   | Fit                                   | Stored as                 |
//! |----------|---------------------------------------|---------------------------|
//! | Platt    | 1-D logistic regression, Newton steps | `{a, b}`                  |
//! | Isotonic | pool-adjacent-violators               | 101 `[x, p]` breakpoints  |
//!
//! Scores are rescaled to `[0, 1]` before fitting and lookup. Fitting refuses
//! single-class data with [`Error::InsufficientCalibrationData`].
//!
//! Quality is reported as the Brier score and the Expected Calibration Error
//! over 10 equal-width bins.

use riskstream_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::metrics::Sample;

/// Breakpoints stored by isotonic calibrators: 0.00, 0.01, ..., 1.00
pub const GRID_POINTS: usize = 101;

/// Equal-width bins used by the calibration error
pub const ECE_BINS: usize = 10;

/// Scores shown in the summary's example mapping
pub const EXAMPLE_SCORES: [f64; 4] = [25.0, 50.0, 70.0, 90.0];

const NEWTON_MAX_ITER: usize = 100;
const NEWTON_MIN_STEP: f64 = 1e-10;
const NEWTON_TOLERANCE: f64 = 1e-5;
const HESSIAN_RIDGE: f64 = 1e-12;

/// Calibration method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMethod {
    #[default]
    Platt,
    Isotonic,
}

impl fmt::Display for CalibrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platt => f.write_str("platt"),
            Self::Isotonic => f.write_str("isotonic"),
        }
    }
}

impl FromStr for CalibrationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "platt" => Ok(Self::Platt),
            "isotonic" => Ok(Self::Isotonic),
            other => Err(Error::config(format!("unknown calibration method '{other}'"))),
        }
    }
}

/// Logistic parameters: `p = sigmoid(a * s + b)` on rescaled scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattParams {
    pub a: f64,
    pub b: f64,
}

/// Monotone step function resampled onto a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicParams {
    /// `(rescaled score, probability)` pairs, ascending in score
    pub breakpoints: Vec<(f64, f64)>,
}

/// A fitted calibrator, persisted as `{"method": ..., "params": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "lowercase")]
pub enum Calibrator {
    Platt(PlattParams),
    Isotonic(IsotonicParams),
}

impl Calibrator {
    /// Fit a calibrator of the given method
    pub fn fit(method: CalibrationMethod, samples: &[Sample]) -> Result<Self> {
        match method {
            CalibrationMethod::Platt => Self::fit_platt(samples),
            CalibrationMethod::Isotonic => Self::fit_isotonic(samples),
        }
    }

    /// Fit logistic parameters by Newton-Raphson on the log-loss.
    ///
    /// Targets use Platt's prior correction, `(N+ + 1) / (N+ + 2)` for
    /// positives and `1 / (N- + 2)` for negatives, so separable data still
    /// yields finite parameters.
    pub fn fit_platt(samples: &[Sample]) -> Result<Self> {
        let (n_pos, n_neg) = class_counts(samples)?;
        let hi = (n_pos as f64 + 1.0) / (n_pos as f64 + 2.0);
        let lo = 1.0 / (n_neg as f64 + 2.0);

        let data: Vec<(f64, f64)> = samples
            .iter()
            .map(|s| (rescale(s.score), if s.label { hi } else { lo }))
            .collect();

        let mut a = 0.0;
        let mut b = ((n_pos as f64 + 1.0) / (n_neg as f64 + 1.0)).ln();
        let mut loss = log_loss(&data, a, b);

        for iteration in 0..NEWTON_MAX_ITER {
            let (mut ga, mut gb) = (0.0, 0.0);
            let (mut haa, mut hab, mut hbb) = (HESSIAN_RIDGE, 0.0, HESSIAN_RIDGE);

            for &(x, t) in &data {
                let p = sigmoid(a * x + b);
                let d = p - t;
                ga += d * x;
                gb += d;
                let w = p * (1.0 - p);
                haa += w * x * x;
                hab += w * x;
                hbb += w;
            }

            if ga.abs() < NEWTON_TOLERANCE && gb.abs() < NEWTON_TOLERANCE {
                debug!(iteration, a, b, "Platt fit converged");
                break;
            }

            let det = haa * hbb - hab * hab;
            if !(det.is_finite() && det > 0.0) {
                break;
            }
            let da = -(hbb * ga - hab * gb) / det;
            let db = -(haa * gb - hab * ga) / det;
            let slope = ga * da + gb * db;

            let mut step = 1.0;
            let mut improved = false;
            while step >= NEWTON_MIN_STEP {
                let (na, nb) = (a + step * da, b + step * db);
                let candidate = log_loss(&data, na, nb);
                if candidate < loss + 1e-4 * step * slope {
                    a = na;
                    b = nb;
                    loss = candidate;
                    improved = true;
                    break;
                }
                step /= 2.0;
            }
            if !improved {
                break;
            }
        }

        if !(a.is_finite() && b.is_finite()) {
            return Err(Error::internal(format!("Platt fit diverged (a={a}, b={b})")));
        }
        Ok(Self::Platt(PlattParams { a, b }))
    }

    /// Fit a monotone non-decreasing mapping with pool-adjacent-violators,
    /// then resample it onto the 101-point grid.
    pub fn fit_isotonic(samples: &[Sample]) -> Result<Self> {
        class_counts(samples)?;

        let mut points: Vec<(f64, f64)> = samples
            .iter()
            .map(|s| (rescale(s.score), if s.label { 1.0 } else { 0.0 }))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let fitted = pool_adjacent_violators(&points);
        let breakpoints = (0..GRID_POINTS)
            .map(|i| {
                let x = i as f64 / (GRID_POINTS - 1) as f64;
                (x, interpolate(&fitted, x))
            })
            .collect();

        Ok(Self::Isotonic(IsotonicParams { breakpoints }))
    }

    pub fn method(&self) -> CalibrationMethod {
        match self {
            Self::Platt(_) => CalibrationMethod::Platt,
            Self::Isotonic(_) => CalibrationMethod::Isotonic,
        }
    }

    /// Calibrated probability for a raw 0-100 score. Always within `[0, 1]`.
    pub fn apply(&self, score: f64) -> f64 {
        let x = rescale(score);
        let p = match self {
            Self::Platt(params) => sigmoid(params.a * x + params.b),
            Self::Isotonic(params) => interpolate(&params.breakpoints, x),
        };
        if p.is_nan() {
            0.0
        } else {
            p.clamp(0.0, 1.0)
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Platt(PlattParams { a, b }) => {
                if !(a.is_finite() && b.is_finite()) {
                    return Err(Error::config("Platt parameters must be finite"));
                }
            }
            Self::Isotonic(IsotonicParams { breakpoints }) => {
                if breakpoints.is_empty() {
                    return Err(Error::config("isotonic calibrator has no breakpoints"));
                }
                for pair in breakpoints.windows(2) {
                    if pair[1].0 < pair[0].0 || pair[1].1 < pair[0].1 {
                        return Err(Error::config("isotonic breakpoints must be non-decreasing"));
                    }
                }
                if breakpoints
                    .iter()
                    .any(|&(x, p)| !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&p))
                {
                    return Err(Error::config("isotonic breakpoints must lie within [0, 1]"));
                }
            }
        }
        Ok(())
    }

    /// Write the calibrator as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), method = %self.method(), "Saved calibrator");
        Ok(())
    }

    /// Load and validate a calibrator
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let calibrator: Self = serde_json::from_str(&content)?;
        calibrator.validate()?;
        Ok(calibrator)
    }
}

fn class_counts(samples: &[Sample]) -> Result<(usize, usize)> {
    let n_pos = samples.iter().filter(|s| s.label).count();
    let n_neg = samples.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(Error::insufficient_data(format!(
            "need both labels, got {n_pos} positive and {n_neg} negative"
        )));
    }
    Ok((n_pos, n_neg))
}

fn rescale(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0) / 100.0
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

fn log_loss(data: &[(f64, f64)], a: f64, b: f64) -> f64 {
    data.iter()
        .map(|&(x, t)| {
            let z = a * x + b;
            t * softplus(-z) + (1.0 - t) * softplus(z)
        })
        .sum()
}

/// PAVA over points sorted by x. Equal inputs are pooled first.
///
/// Returns the fitted function as `(x, value)` knots, ascending and distinct
/// in x, suitable for [`interpolate`].
fn pool_adjacent_violators(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    // (label sum, count, lowest x, highest x)
    let mut blocks: Vec<(f64, f64, f64, f64)> = Vec::new();

    for &(x, y) in points {
        match blocks.last_mut() {
            Some(last) if last.3 == x => {
                last.0 += y;
                last.1 += 1.0;
            }
            _ => blocks.push((y, 1.0, x, x)),
        }

        while blocks.len() >= 2 {
            let n = blocks.len();
            let (prev, last) = (blocks[n - 2], blocks[n - 1]);
            if prev.0 / prev.1 <= last.0 / last.1 {
                break;
            }
            blocks[n - 2] = (prev.0 + last.0, prev.1 + last.1, prev.2, last.3);
            blocks.pop();
        }
    }

    let mut knots = Vec::with_capacity(blocks.len() * 2);
    for (sum, count, lo, hi) in blocks {
        let value = sum / count;
        knots.push((lo, value));
        if hi > lo {
            knots.push((hi, value));
        }
    }
    knots
}

/// Piecewise-linear lookup between knots, clamped outside their range
fn interpolate(knots: &[(f64, f64)], x: f64) -> f64 {
    let (first, last) = match (knots.first(), knots.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return x,
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }

    let idx = knots.partition_point(|k| k.0 <= x);
    let (x0, p0) = knots[idx - 1];
    let (x1, p1) = knots[idx];
    if x1 == x0 {
        return p1;
    }
    p0 + (x - x0) / (x1 - x0) * (p1 - p0)
}

/// Mean squared error between probabilities and labels. 0.0 when empty.
pub fn brier_score(probabilities: &[f64], labels: &[bool]) -> f64 {
    let n = probabilities.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = probabilities
        .iter()
        .zip(labels)
        .map(|(&p, &y)| (p - if y { 1.0 } else { 0.0 }).powi(2))
        .sum();
    sum / n as f64
}

/// Expected Calibration Error over `bins` equal-width bins.
///
/// Bins are half-open `[lo, hi)` except the last, which includes 1.0.
pub fn expected_calibration_error(probabilities: &[f64], labels: &[bool], bins: usize) -> f64 {
    let n = probabilities.len().min(labels.len());
    if n == 0 || bins == 0 {
        return 0.0;
    }

    let mut prob_sums = vec![0.0; bins];
    let mut label_sums = vec![0.0; bins];
    let mut counts = vec![0usize; bins];

    for (&p, &y) in probabilities.iter().zip(labels) {
        let p = p.clamp(0.0, 1.0);
        let bin = ((p * bins as f64) as usize).min(bins - 1);
        prob_sums[bin] += p;
        label_sums[bin] += if y { 1.0 } else { 0.0 };
        counts[bin] += 1;
    }

    let weighted: f64 = (0..bins)
        .filter(|&bin| counts[bin] > 0)
        .map(|bin| {
            let count = counts[bin] as f64;
            count * (label_sums[bin] / count - prob_sums[bin] / count).abs()
        })
        .sum();
    weighted / n as f64
}

/// Brier score and ECE of a calibrator over a sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationQuality {
    pub n: usize,
    pub brier_score: f64,
    pub ece: f64,
}

impl CalibrationQuality {
    pub fn measure(calibrator: &Calibrator, samples: &[Sample]) -> Self {
        let probabilities: Vec<f64> = samples.iter().map(|s| calibrator.apply(s.score)).collect();
        let labels: Vec<bool> = samples.iter().map(|s| s.label).collect();
        Self {
            n: samples.len(),
            brier_score: brier_score(&probabilities, &labels),
            ece: expected_calibration_error(&probabilities, &labels, ECE_BINS),
        }
    }
}

/// Calibration section of an evaluation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSummary {
    pub method: CalibrationMethod,
    /// Samples the calibrator was fitted on
    pub n: usize,
    /// Measured on the fitted set
    pub brier_score: f64,
    pub ece: f64,
    /// `(raw score, calibrated probability)`
    pub example_mapping: Vec<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holdout: Option<CalibrationQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibrator_saved: Option<PathBuf>,
}

/// How to fit and assess a calibrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOptions {
    #[serde(default)]
    pub method: CalibrationMethod,

    /// Fraction of each class, taken from that class's tail, held out from fitting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holdout_fraction: Option<f64>,
}

impl CalibrationOptions {
    pub fn new(method: CalibrationMethod) -> Self {
        Self {
            method,
            holdout_fraction: None,
        }
    }

    pub fn with_holdout(mut self, fraction: f64) -> Self {
        self.holdout_fraction = Some(fraction);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(fraction) = self.holdout_fraction {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(Error::config(format!(
                    "holdout_fraction must be within (0, 1), got {fraction}"
                )));
            }
        }
        Ok(())
    }
}

/// Split off the last `fraction` of each class, keeping file order.
///
/// At least one sample of every class present stays in the fit set, so a
/// label-sorted dataset still fits on both classes.
fn holdout_split(samples: &[Sample], fraction: f64) -> (Vec<Sample>, Vec<Sample>) {
    let quota = |n: usize| {
        if n == 0 {
            0
        } else {
            ((n as f64 * fraction).round() as usize).min(n - 1)
        }
    };
    let positives = samples.iter().filter(|s| s.label).count();
    let mut left_pos = quota(positives);
    let mut left_neg = quota(samples.len() - positives);

    let mut fit = Vec::with_capacity(samples.len());
    let mut holdout = Vec::with_capacity(left_pos + left_neg);
    for sample in samples.iter().rev() {
        let left = if sample.label { &mut left_pos } else { &mut left_neg };
        if *left > 0 {
            *left -= 1;
            holdout.push(*sample);
        } else {
            fit.push(*sample);
        }
    }
    fit.reverse();
    holdout.reverse();
    (fit, holdout)
}

/// Fit a calibrator and summarise its quality
pub fn calibrate(
    samples: &[Sample],
    options: &CalibrationOptions,
) -> Result<(Calibrator, CalibrationSummary)> {
    options.validate()?;

    let (fit_set, holdout_set) = match options.holdout_fraction {
        Some(fraction) => holdout_split(samples, fraction),
        None => (samples.to_vec(), Vec::new()),
    };

    let calibrator = Calibrator::fit(options.method, &fit_set)?;
    let fitted = CalibrationQuality::measure(&calibrator, &fit_set);
    let holdout = (!holdout_set.is_empty())
        .then(|| CalibrationQuality::measure(&calibrator, &holdout_set));

    let example_mapping = EXAMPLE_SCORES
        .iter()
        .map(|&score| (score, calibrator.apply(score)))
        .collect();

    info!(
        method = %options.method,
        n = fitted.n,
        brier = fitted.brier_score,
        ece = fitted.ece,
        holdout = holdout_set.len(),
        "Fitted calibrator"
    );

    let summary = CalibrationSummary {
        method: options.method,
        n: fitted.n,
        brier_score: fitted.brier_score,
        ece: fitted.ece,
        example_mapping,
        holdout,
        calibrator_saved: None,
    };
    Ok((calibrator, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded() -> Vec<Sample> {
        let mut samples = Vec::new();
        for i in 0..50 {
            let score = i as f64 * 2.0;
            // Positive rate rises with score
            samples.push(Sample::new(score, i % 5 < (i * 5 / 50)));
        }
        samples
    }

    #[test]
    fn test_single_class_is_refused() {
        let samples = vec![Sample::new(10.0, true), Sample::new(90.0, true)];
        for method in [CalibrationMethod::Platt, CalibrationMethod::Isotonic] {
            let result = Calibrator::fit(method, &samples);
            assert!(matches!(result, Err(Error::InsufficientCalibrationData(_))));
        }
        assert!(Calibrator::fit_platt(&[]).is_err());
    }

    #[test]
    fn test_platt_is_increasing_for_informative_scores() {
        let calibrator = Calibrator::fit_platt(&graded()).unwrap();
        let Calibrator::Platt(params) = &calibrator else {
            panic!("expected Platt");
        };
        assert!(params.a > 0.0);
        assert!(calibrator.apply(90.0) > calibrator.apply(50.0));
        assert!(calibrator.apply(50.0) > calibrator.apply(10.0));
    }

    #[test]
    fn test_platt_separable_data_stays_finite() {
        let samples = vec![
            Sample::new(10.0, false),
            Sample::new(20.0, false),
            Sample::new(80.0, true),
            Sample::new(90.0, true),
        ];
        let calibrator = Calibrator::fit_platt(&samples).unwrap();
        assert!(calibrator.validate().is_ok());
        assert!(calibrator.apply(90.0) > 0.5);
        assert!(calibrator.apply(10.0) < 0.5);
    }

    #[test]
    fn test_isotonic_grid_and_monotonicity() {
        let calibrator = Calibrator::fit_isotonic(&graded()).unwrap();
        let Calibrator::Isotonic(params) = &calibrator else {
            panic!("expected isotonic");
        };
        assert_eq!(params.breakpoints.len(), GRID_POINTS);
        assert_eq!(params.breakpoints[0].0, 0.0);
        assert_eq!(params.breakpoints[100].0, 1.0);
        assert!(params.breakpoints.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_pava_pools_violators() {
        let knots = pool_adjacent_violators(&[(0.1, 0.0), (0.2, 1.0), (0.3, 0.0), (0.4, 1.0)]);
        // 0.2 and 0.3 pool to 0.5
        assert_eq!(knots, vec![(0.1, 0.0), (0.2, 0.5), (0.3, 0.5), (0.4, 1.0)]);
    }

    #[test]
    fn test_pava_pools_ties() {
        let knots = pool_adjacent_violators(&[(0.5, 0.0), (0.5, 1.0), (0.9, 1.0)]);
        assert_eq!(knots, vec![(0.5, 0.5), (0.9, 1.0)]);
    }

    #[test]
    fn test_interpolate_clamps_and_interpolates() {
        let knots = [(0.2, 0.1), (0.6, 0.5)];
        assert_eq!(interpolate(&knots, 0.0), 0.1);
        assert_eq!(interpolate(&knots, 1.0), 0.5);
        assert!((interpolate(&knots, 0.4) - 0.3).abs() < 1e-12);
        assert_eq!(interpolate(&[], 0.3), 0.3);
    }

    #[test]
    fn test_apply_clamps_out_of_range_scores() {
        let calibrator = Calibrator::Platt(PlattParams { a: 4.0, b: -2.0 });
        assert_eq!(calibrator.apply(150.0), calibrator.apply(100.0));
        assert_eq!(calibrator.apply(-5.0), calibrator.apply(0.0));
        assert!((calibrator.apply(50.0) - 0.5).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&calibrator.apply(f64::NAN)));
    }

    #[test]
    fn test_brier_and_ece() {
        let probabilities = [0.9, 0.1, 0.8, 0.3];
        let labels = [true, false, true, false];
        let brier = brier_score(&probabilities, &labels);
        assert!((brier - (0.01 + 0.01 + 0.04 + 0.09) / 4.0).abs() < 1e-12);

        // Perfectly confident and correct
        assert_eq!(expected_calibration_error(&[1.0, 0.0], &[true, false], ECE_BINS), 0.0);
        // Always 0.5 on a single positive
        assert!((expected_calibration_error(&[0.5], &[true], ECE_BINS) - 0.5).abs() < 1e-12);
        assert_eq!(brier_score(&[], &[]), 0.0);
    }

    #[test]
    fn test_persisted_format() {
        let platt = Calibrator::Platt(PlattParams { a: 3.5, b: -1.25 });
        let json = serde_json::to_value(&platt).unwrap();
        assert_eq!(json["method"], "platt");
        assert_eq!(json["params"]["a"], 3.5);

        let iso = Calibrator::Isotonic(IsotonicParams {
            breakpoints: vec![(0.0, 0.1), (1.0, 0.9)],
        });
        let json = serde_json::to_value(&iso).unwrap();
        assert_eq!(json["method"], "isotonic");
        assert_eq!(json["params"]["breakpoints"][1][1], 0.9);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/calibrator.json");

        let calibrator = Calibrator::fit_isotonic(&graded()).unwrap();
        calibrator.save(&path).unwrap();
        let loaded = Calibrator::load(&path).unwrap();
        assert_eq!(loaded, calibrator);
    }

    #[test]
    fn test_load_rejects_non_monotone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"method": "isotonic", "params": {"breakpoints": [[0.0, 0.8], [1.0, 0.2]]}}"#,
        )
        .unwrap();
        assert!(matches!(Calibrator::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_calibrate_with_holdout() {
        let samples = graded();
        let options = CalibrationOptions::new(CalibrationMethod::Isotonic).with_holdout(0.2);
        let (_, summary) = calibrate(&samples, &options).unwrap();

        assert_eq!(summary.n, 40);
        assert_eq!(summary.holdout.map(|h| h.n), Some(10));
        assert_eq!(summary.example_mapping.len(), 4);
        assert_eq!(summary.example_mapping[0].0, 25.0);
        assert!(summary.brier_score >= 0.0 && summary.brier_score <= 1.0);
    }

    #[test]
    fn test_holdout_on_label_sorted_data_keeps_both_classes() {
        let mut samples: Vec<Sample> = (0..10).map(|i| Sample::new(i as f64 * 5.0, false)).collect();
        samples.extend((0..10).map(|i| Sample::new(50.0 + i as f64 * 5.0, true)));

        let options = CalibrationOptions::new(CalibrationMethod::Platt).with_holdout(0.3);
        let (_, summary) = calibrate(&samples, &options).unwrap();
        assert_eq!(summary.n, 14);
        assert_eq!(summary.holdout.map(|h| h.n), Some(6));

        let (fit, holdout) = holdout_split(&samples, 0.3);
        assert_eq!(fit.iter().filter(|s| s.label).count(), 7);
        assert_eq!(holdout.iter().filter(|s| !s.label).count(), 3);
        assert_eq!(holdout[0], Sample::new(35.0, false));
    }

    #[test]
    fn test_holdout_never_empties_a_class() {
        let samples = vec![
            Sample::new(10.0, false),
            Sample::new(20.0, false),
            Sample::new(80.0, true),
        ];
        let (fit, holdout) = holdout_split(&samples, 0.9);
        assert_eq!(fit, vec![Sample::new(10.0, false), Sample::new(80.0, true)]);
        assert_eq!(holdout, vec![Sample::new(20.0, false)]);
    }

    #[test]
    fn test_calibrate_rejects_bad_holdout() {
        let options = CalibrationOptions::new(CalibrationMethod::Platt).with_holdout(1.0);
        assert!(matches!(calibrate(&graded(), &options), Err(Error::Config(_))));
    }
}
