use clap::{Args, Parser, Subcommand};
use riskstream_core::Vertical;
use riskstream_eval::CalibrationMethod;
use riskstream_policy::DecisionMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "riskstream")]
#[command(
    author,
    version,
    about = "Risk decision engine: case scoring, evaluation and calibration"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "riskstream.yaml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one case document and print the analysis
    Analyze {
        /// Case document (JSON)
        case: PathBuf,

        /// Score under this vertical instead of the case's own
        #[arg(long, value_parser = parse_vertical)]
        vertical: Option<Vertical>,

        /// Decision mode: standard or strict
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<DecisionMode>,

        /// JSON file with weight overrides
        #[arg(short, long)]
        weights: Option<PathBuf>,
    },

    /// Score a labeled dataset and report operational metrics
    Evaluate(EvaluateArgs),

    /// Work with fitted calibrators
    Calibrate {
        #[command(subcommand)]
        action: CalibrateAction,
    },

    /// Measure score stability over original/perturbed case pairs
    Robustness {
        /// JSON Lines file of {original_ref, perturbed_ref}
        #[arg(long)]
        pairs: PathBuf,

        /// Alert threshold for flip counting
        #[arg(short, long, default_value = "50")]
        threshold: f64,

        /// Write the report here as well as to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct EvaluateArgs {
    /// Labeled JSON Lines dataset
    #[arg(short, long)]
    pub dataset: PathBuf,

    /// Write the report here as well as to stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only evaluate rows of this vertical
    #[arg(long, value_parser = parse_vertical)]
    pub vertical: Option<Vertical>,

    /// Evaluate at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,

    /// Decision threshold (default 50)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Report at 20, 25, ..., 80 instead of a single threshold
    #[arg(long)]
    pub sweep_thresholds: bool,

    /// JSON file with weight overrides
    #[arg(short, long)]
    pub weights: Option<PathBuf>,

    /// Decision mode: standard or strict
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<DecisionMode>,

    /// Fit and report a calibrator
    #[arg(long)]
    pub calibrate: bool,

    /// Calibration method: platt or isotonic
    #[arg(long, value_parser = parse_method)]
    pub calibration_method: Option<CalibrationMethod>,

    /// Save the fitted calibrator to this path
    #[arg(long)]
    pub calibrator_out: Option<PathBuf>,

    /// Hold out the last fraction of each class to assess calibration
    #[arg(long)]
    pub holdout_fraction: Option<f64>,

    /// Report the value-optimal threshold
    #[arg(long)]
    pub optimize_threshold: bool,

    /// Savings per true positive (default 1000)
    #[arg(long)]
    pub savings_per_tp: Option<f64>,

    /// Cost per manual review (default 50)
    #[arg(long)]
    pub cost_per_review: Option<f64>,

    /// Maximum false positive rate for threshold optimization
    #[arg(long)]
    pub max_fpr: Option<f64>,

    /// Maximum number of reviews for threshold optimization
    #[arg(long)]
    pub max_workload: Option<usize>,

    /// Rows scored concurrently (default 4)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum CalibrateAction {
    /// Map raw scores to calibrated probabilities
    Apply {
        /// Calibrator JSON file
        #[arg(long)]
        calibrator: PathBuf,

        /// Raw scores, 0-100
        #[arg(required = true, allow_negative_numbers = true)]
        scores: Vec<f64>,
    },
}

fn parse_vertical(s: &str) -> Result<Vertical, String> {
    s.parse().map_err(|e: riskstream_core::Error| e.to_string())
}

fn parse_mode(s: &str) -> Result<DecisionMode, String> {
    s.parse().map_err(|e: riskstream_core::Error| e.to_string())
}

fn parse_method(s: &str) -> Result<CalibrationMethod, String> {
    s.parse().map_err(|e: riskstream_core::Error| e.to_string())
}
