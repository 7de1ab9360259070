//! Engine configuration

use anyhow::Context;
use riskstream_eval::{CalibrationOptions, EvaluationConfig, OptimizationSettings};
use riskstream_policy::{DecisionMode, PolicyConfig};
use riskstream_signals::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::cli::EvaluateArgs;

/// Everything the binary reads from `--config`
///
/// ```yaml
/// policy:
///   mode: strict
/// orchestrator:
///   signal_timeout_ms: 5000
/// evaluation:
///   concurrency: 8
///   sweep_thresholds: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl EngineConfig {
    /// Load configuration from file, or use defaults when it does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Self = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!(path = %path.display(), "Configuration loaded");
            config
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.policy.validate().context("Invalid policy")?;
        self.orchestrator
            .validate()
            .context("Invalid orchestrator settings")?;
        self.evaluation
            .validate()
            .context("Invalid evaluation settings")?;
        Ok(())
    }

    pub fn apply_mode(&mut self, mode: Option<DecisionMode>) {
        if let Some(mode) = mode {
            self.policy.mode = mode;
        }
    }

    /// Apply `evaluate` flags over the file settings
    pub fn apply_evaluate_args(&mut self, args: &EvaluateArgs) -> anyhow::Result<()> {
        self.apply_mode(args.mode);

        let eval = &mut self.evaluation;
        if let Some(threshold) = args.threshold {
            eval.threshold = threshold;
        }
        if args.sweep_thresholds {
            eval.sweep_thresholds = true;
        }
        if args.vertical.is_some() {
            eval.vertical = args.vertical;
        }
        if args.limit.is_some() {
            eval.limit = args.limit;
        }
        if let Some(concurrency) = args.concurrency {
            eval.concurrency = concurrency;
        }

        if args.calibrate || args.calibration_method.is_some() || args.holdout_fraction.is_some() {
            let calibration = eval.calibration.get_or_insert_with(CalibrationOptions::default);
            if let Some(method) = args.calibration_method {
                calibration.method = method;
            }
            if args.holdout_fraction.is_some() {
                calibration.holdout_fraction = args.holdout_fraction;
            }
        }
        if args.calibrator_out.is_some() {
            eval.calibrator_out = args.calibrator_out.clone();
        }

        let optimizing = args.optimize_threshold
            || args.savings_per_tp.is_some()
            || args.cost_per_review.is_some()
            || args.max_fpr.is_some()
            || args.max_workload.is_some();
        if optimizing {
            let settings = eval.optimization.get_or_insert_with(OptimizationSettings::default);
            if let Some(savings) = args.savings_per_tp {
                settings.value.savings_per_tp = savings;
            }
            if let Some(cost) = args.cost_per_review {
                settings.value.cost_per_review = cost;
            }
            if args.max_fpr.is_some() {
                settings.constraints.max_fpr = args.max_fpr;
            }
            if args.max_workload.is_some() {
                settings.constraints.max_workload = args.max_workload;
            }
        }

        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskstream_core::Vertical;
    use riskstream_eval::CalibrationMethod;
    use std::path::PathBuf;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.evaluation.concurrency, 4);
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riskstream.yaml");
        std::fs::write(
            &path,
            r#"
policy:
  mode: strict
orchestrator:
  signal_timeout_ms: 5000
evaluation:
  concurrency: 8
  sweep_thresholds: true
  optimization:
    savings_per_tp: 500
    max_fpr: 0.1
"#,
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.policy.mode, DecisionMode::Strict);
        assert_eq!(config.orchestrator.signal_timeout_ms, 5000);
        assert_eq!(config.orchestrator.evidence_limit, 3);
        assert_eq!(config.evaluation.concurrency, 8);
        assert!(config.evaluation.sweep_thresholds);

        let optimization = config.evaluation.optimization.unwrap();
        assert_eq!(optimization.value.savings_per_tp, 500.0);
        assert_eq!(optimization.value.cost_per_review, 50.0);
        assert_eq!(optimization.constraints.max_fpr, Some(0.1));
    }

    #[test]
    fn test_example_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../riskstream.example.yaml");
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.policy.mode, DecisionMode::Standard);
        assert!(config.evaluation.calibration.is_some());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riskstream.yaml");
        std::fs::write(&path, "orchestrator:\n  signal_timeout_ms: 0\n").unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }

    #[test]
    fn test_evaluate_flags_override_file() {
        let mut config = EngineConfig::default();
        let args = EvaluateArgs {
            dataset: PathBuf::from("labels.jsonl"),
            threshold: Some(60.0),
            vertical: Some(Vertical::Medical),
            calibration_method: Some(CalibrationMethod::Isotonic),
            max_workload: Some(25),
            mode: Some(DecisionMode::Strict),
            ..Default::default()
        };
        config.apply_evaluate_args(&args).unwrap();

        assert_eq!(config.policy.mode, DecisionMode::Strict);
        assert_eq!(config.evaluation.threshold, 60.0);
        assert_eq!(config.evaluation.vertical, Some(Vertical::Medical));
        assert_eq!(
            config.evaluation.calibration.map(|c| c.method),
            Some(CalibrationMethod::Isotonic)
        );
        assert_eq!(
            config.evaluation.optimization.and_then(|o| o.constraints.max_workload),
            Some(25)
        );
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let mut config = EngineConfig::default();
        let args = EvaluateArgs {
            holdout_fraction: Some(1.5),
            ..Default::default()
        };
        assert!(config.apply_evaluate_args(&args).is_err());
    }
}
