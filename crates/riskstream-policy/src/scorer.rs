//! Weighted ensemble scorer

use riskstream_core::{Error, FactorKind, FactorSignal, Result, RiskFactor, ScoreResult, Vertical};
use tracing::debug;

use crate::confidence::ConfidenceEstimator;
use crate::profile::{DecisionMode, DecisionProfile};
use crate::weights::{renormalize, WeightOverride, WeightTable};

/// Combines present factor signals into one [`ScoreResult`].
///
/// Scoring is a pure function of the factor list, the weight table, the
/// optional override map, and the decision profile. Factors are sorted by
/// kind before summation so arrival order never changes the result.
#[derive(Debug, Clone)]
pub struct EnsembleScorer {
    weights: WeightTable,
    profile: DecisionProfile,
    confidence: ConfidenceEstimator,
}

impl EnsembleScorer {
    pub fn new(weights: WeightTable, profile: DecisionProfile) -> Self {
        Self {
            weights,
            profile,
            confidence: ConfidenceEstimator::default(),
        }
    }

    /// Scorer with the built-in table and profile for a vertical
    pub fn for_vertical(vertical: Vertical, mode: DecisionMode) -> Self {
        Self::new(
            WeightTable::for_vertical(vertical),
            DecisionProfile::select(mode, vertical),
        )
    }

    pub fn with_confidence(mut self, confidence: ConfidenceEstimator) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn profile(&self) -> &DecisionProfile {
        &self.profile
    }

    /// Copy of this scorer with an override map merged into its table
    pub fn with_weight_override(&self, overrides: &WeightOverride) -> Result<Self> {
        Ok(Self {
            weights: self.weights.with_override(overrides)?,
            profile: self.profile.clone(),
            confidence: self.confidence,
        })
    }

    /// Whether the active weight table knows this factor
    pub fn supports(&self, kind: FactorKind) -> bool {
        self.weights.contains(kind)
    }

    /// Score the present factors.
    ///
    /// Fails only on caller errors: an override naming an unknown factor or
    /// carrying an invalid weight, or a factor outside the active table.
    pub fn score(
        &self,
        signals: &[FactorSignal],
        overrides: Option<&WeightOverride>,
    ) -> Result<ScoreResult> {
        let table = match overrides {
            Some(o) if !o.is_empty() => self.weights.with_override(o)?,
            _ => self.weights.clone(),
        };

        let mut ordered: Vec<&FactorSignal> = signals.iter().collect();
        ordered.sort_by_key(|s| s.kind);

        for pair in ordered.windows(2) {
            if pair[0].kind == pair[1].kind {
                return Err(Error::internal(format!(
                    "factor {} reported more than once",
                    pair[0].kind
                )));
            }
        }

        let base: Vec<f64> = ordered
            .iter()
            .map(|s| {
                table.get(s.kind).ok_or_else(|| {
                    Error::unknown_factor(format!(
                        "{} has no weight in the active table",
                        s.kind
                    ))
                })
            })
            .collect::<Result<_>>()?;

        let weights = renormalize(&base);

        let risk_factors: Vec<RiskFactor> = ordered
            .iter()
            .zip(weights)
            .map(|(signal, weight)| RiskFactor {
                kind: signal.kind,
                name: signal.kind.display_name().to_string(),
                score: clamp_score(signal.score),
                weight,
                description: signal.description.clone(),
                evidence: signal.evidence.clone(),
            })
            .collect();

        Ok(self.assemble(risk_factors))
    }

    /// Result for a case with no factors at all
    pub fn baseline(&self) -> ScoreResult {
        self.assemble(Vec::new())
    }

    fn assemble(&self, risk_factors: Vec<RiskFactor>) -> ScoreResult {
        let raw_score = clamp_score(risk_factors.iter().map(RiskFactor::weighted_score).sum());
        let overall_score = self.profile.adjust(raw_score);
        let risk_level = self.profile.classify(overall_score);

        let scores: Vec<f64> = risk_factors.iter().map(|f| f.score).collect();
        let confidence = self.confidence.estimate(&scores);

        let recommendation = self.profile.recommendation(risk_level);

        debug!(
            factors = risk_factors.len(),
            raw_score,
            overall_score,
            risk_level = %risk_level,
            confidence,
            profile = %self.profile.name,
            "Scored case"
        );

        ScoreResult {
            overall_score,
            raw_score,
            risk_level,
            confidence,
            risk_factors,
            decision: recommendation.decision,
            recommendation: recommendation.text.clone(),
            reasoning: String::new(),
            profile: self.profile.name.clone(),
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
