//! YAML policy configuration

use riskstream_core::{Error, Result, Vertical};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::confidence::ConfidenceEstimator;
use crate::profile::{DecisionMode, DecisionProfile, ProfileSet};
use crate::scorer::EnsembleScorer;
use crate::weights::WeightTable;

/// Scoring policy: decision mode, weight tables, profiles, confidence
///
/// ```yaml
/// mode: strict
/// weights:
///   mortgage:
///     inconsistency: 0.4
///     income_verification: 0.4
///     property_valuation: 0.2
/// profiles:
///   strict:
///     name: strict
///     thresholds:
///       cutpoints:
///         - { min_score: 20, level: medium }
///         - { min_score: 40, level: high }
///         - { min_score: 60, level: critical }
///     ...
/// ```
///
/// Verticals missing from `weights` use the built-in table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub mode: DecisionMode,

    #[serde(default)]
    pub weights: BTreeMap<Vertical, WeightTable>,

    #[serde(default)]
    pub profiles: ProfileSet,

    #[serde(default)]
    pub confidence: ConfidenceEstimator,
}

impl PolicyConfig {
    /// Parse and validate a policy from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PolicyConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid policy: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a policy from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        for table in self.weights.values() {
            table.validate()?;
        }
        self.profiles.validate()?;

        let c = &self.confidence;
        if !(0.0..=1.0).contains(&c.floor)
            || !(0.0..=1.0).contains(&c.ceiling)
            || c.floor > c.ceiling
            || !(0.0..=1.0).contains(&c.no_signal)
            || c.variance_scale.is_nan()
            || c.variance_scale <= 0.0
        {
            return Err(Error::config(format!("invalid confidence settings: {c:?}")));
        }

        Ok(())
    }

    /// Weight table for a vertical
    pub fn weight_table(&self, vertical: Vertical) -> WeightTable {
        self.weights
            .get(&vertical)
            .cloned()
            .unwrap_or_else(|| WeightTable::for_vertical(vertical))
    }

    /// Decision profile for a vertical under the configured mode
    pub fn profile(&self, vertical: Vertical) -> &DecisionProfile {
        self.profiles.select(self.mode, vertical)
    }

    /// Build the scorer for a vertical
    pub fn scorer(&self, vertical: Vertical) -> EnsembleScorer {
        EnsembleScorer::new(self.weight_table(vertical), self.profile(vertical).clone())
            .with_confidence(self.confidence)
    }
}
