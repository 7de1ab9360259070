//! Base weight tables and caller-supplied overrides

use riskstream_core::{Error, FactorKind, Result, Vertical};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Deviation from 1.0 tolerated before weights are renormalized
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Base weights keyed by factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: BTreeMap<FactorKind, f64>,
}

impl WeightTable {
    /// Build a table, rejecting weights outside [0, 1]
    pub fn new(weights: impl IntoIterator<Item = (FactorKind, f64)>) -> Result<Self> {
        let table = Self {
            weights: weights.into_iter().collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Default table for a vertical
    pub fn for_vertical(vertical: Vertical) -> Self {
        match vertical {
            Vertical::Insurance => Self::insurance(),
            Vertical::Medical => Self::medical(),
            Vertical::Mortgage => Self::mortgage(),
            Vertical::IdentityDocument => Self::identity_document(),
            Vertical::AiContent => Self::ai_content(),
        }
    }

    /// General claim mode
    pub fn insurance() -> Self {
        Self::from_static(&[
            (FactorKind::Inconsistency, 0.30),
            (FactorKind::PatternMatch, 0.25),
            (FactorKind::NetworkRisk, 0.15),
            (FactorKind::ClaimCharacteristics, 0.15),
            (FactorKind::ImageAuthenticity, 0.10),
            (FactorKind::DocumentQuality, 0.05),
        ])
    }

    pub fn medical() -> Self {
        Self::from_static(&[
            (FactorKind::BillingIntegrity, 0.30),
            (FactorKind::ClinicalConsistency, 0.25),
            (FactorKind::Inconsistency, 0.20),
            (FactorKind::Eligibility, 0.15),
            (FactorKind::ClaimCharacteristics, 0.10),
        ])
    }

    pub fn mortgage() -> Self {
        Self::from_static(&[
            (FactorKind::Inconsistency, 0.35),
            (FactorKind::IncomeVerification, 0.35),
            (FactorKind::PropertyValuation, 0.30),
        ])
    }

    /// Identity-document mode: image forensics dominate
    pub fn identity_document() -> Self {
        Self::from_static(&[
            (FactorKind::ImageAuthenticity, 0.35),
            (FactorKind::IdConsistency, 0.30),
            (FactorKind::TemplateMatch, 0.20),
            (FactorKind::Metadata, 0.15),
        ])
    }

    pub fn ai_content() -> Self {
        Self::from_static(&[
            (FactorKind::AiText, 0.50),
            (FactorKind::AiImage, 0.35),
            (FactorKind::Metadata, 0.15),
        ])
    }

    fn from_static(entries: &[(FactorKind, f64)]) -> Self {
        Self {
            weights: entries.iter().copied().collect(),
        }
    }

    /// Weight for a factor, if the table knows it
    pub fn get(&self, kind: FactorKind) -> Option<f64> {
        self.weights.get(&kind).copied()
    }

    pub fn contains(&self, kind: FactorKind) -> bool {
        self.weights.contains_key(&kind)
    }

    /// Factors known to this table, in key order
    pub fn kinds(&self) -> impl Iterator<Item = FactorKind> + '_ {
        self.weights.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of all base weights
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Check every weight is finite and within [0, 1]
    pub fn validate(&self) -> Result<()> {
        for (kind, weight) in &self.weights {
            check_weight(kind.key(), *weight)?;
        }
        Ok(())
    }

    /// Merge an override map: overridden keys win, the rest fall back to
    /// this table. Keys must name factors present in this table.
    pub fn with_override(&self, overrides: &WeightOverride) -> Result<WeightTable> {
        let mut merged = self.clone();

        for (key, weight) in &overrides.entries {
            let kind: FactorKind = key.parse()?;
            if !self.contains(kind) {
                return Err(Error::unknown_factor(format!(
                    "'{key}' is not part of the active weight table"
                )));
            }
            check_weight(key, *weight)?;
            merged.weights.insert(kind, *weight);
        }

        Ok(merged)
    }
}

fn check_weight(factor: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidWeight {
            factor: factor.to_string(),
            value,
        })
    }
}

/// Caller-supplied weight overrides, validated when merged into a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightOverride {
    entries: BTreeMap<String, f64>,
}

impl WeightOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override entry
    pub fn with(mut self, factor: impl Into<String>, weight: f64) -> Self {
        self.entries.insert(factor.into(), weight);
        self
    }

    /// Load overrides from a JSON object file (`{"inconsistency": 0.4}`)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(String, f64)> for WeightOverride {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Rescale weights so they sum to 1.0.
///
/// Weights already summing to 1.0 within [`WEIGHT_TOLERANCE`] are returned
/// unchanged. A zero total falls back to equal weights.
pub fn renormalize(weights: &[f64]) -> Vec<f64> {
    if weights.is_empty() {
        return Vec::new();
    }

    let total: f64 = weights.iter().sum();

    if total <= 0.0 || !total.is_finite() {
        let equal = 1.0 / weights.len() as f64;
        return vec![equal; weights.len()];
    }

    if (total - 1.0).abs() <= WEIGHT_TOLERANCE {
        return weights.to_vec();
    }

    weights.iter().map(|w| w / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_sum_to_one() {
        for vertical in Vertical::ALL {
            let table = WeightTable::for_vertical(vertical);
            assert!(
                (table.total() - 1.0).abs() < 1e-9,
                "{vertical} table sums to {}",
                table.total()
            );
            table.validate().unwrap();
        }
    }

    #[test]
    fn test_renormalize_partial_set() {
        let weights = renormalize(&[0.30, 0.25, 0.15]);

        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((weights[0] - 0.30 / 0.70).abs() < 1e-12);
        assert!((weights[1] - 0.25 / 0.70).abs() < 1e-12);
        assert!((weights[2] - 0.15 / 0.70).abs() < 1e-12);
    }

    #[test]
    fn test_renormalize_zero_total_uses_equal_weights() {
        assert_eq!(renormalize(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert!(renormalize(&[]).is_empty());
    }

    #[test]
    fn test_override_wins_and_others_fall_back() {
        let table = WeightTable::insurance();
        let overrides = WeightOverride::new().with("inconsistency", 0.5);

        let merged = table.with_override(&overrides).unwrap();
        assert_eq!(merged.get(FactorKind::Inconsistency), Some(0.5));
        assert_eq!(merged.get(FactorKind::PatternMatch), Some(0.25));
    }

    #[test]
    fn test_override_rejects_typo() {
        let overrides = WeightOverride::new().with("pattern_matches", 0.5);
        let err = WeightTable::insurance().with_override(&overrides).unwrap_err();
        assert!(matches!(err, Error::UnknownFactor(_)));
    }

    #[test]
    fn test_override_rejects_factor_outside_table() {
        let overrides = WeightOverride::new().with("billing_integrity", 0.2);
        let err = WeightTable::mortgage().with_override(&overrides).unwrap_err();
        assert!(matches!(err, Error::UnknownFactor(_)));
    }

    #[test]
    fn test_override_rejects_out_of_range_weight() {
        let overrides = WeightOverride::new().with("inconsistency", 1.5);
        let err = WeightTable::insurance().with_override(&overrides).unwrap_err();
        assert!(matches!(err, Error::InvalidWeight { value, .. } if value == 1.5));
    }

    #[test]
    fn test_override_from_json() {
        let overrides: WeightOverride =
            serde_json::from_str(r#"{"network_risk": 0.0, "pattern_match": 0.4}"#).unwrap();
        assert_eq!(overrides.len(), 2);

        let merged = WeightTable::insurance().with_override(&overrides).unwrap();
        assert_eq!(merged.get(FactorKind::NetworkRisk), Some(0.0));
    }
}
