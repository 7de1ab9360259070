//! Explanation phase: reasoning and narrative text

use async_trait::async_trait;
use riskstream_core::{Case, Result, ScoreResult, SignalStatus, SourceReport};
use std::fmt::Write;

/// Produces the human-facing text attached to a scored case.
///
/// Both methods run concurrently after scoring; a failure in either one
/// falls back to a fixed text and never affects the score.
#[async_trait]
pub trait Explainer: Send + Sync {
    /// Short reasoning attached to the score
    async fn reasoning(&self, case: &Case, score: &ScoreResult) -> Result<String>;

    /// Longer investigation narrative
    async fn narrative(
        &self,
        case: &Case,
        score: &ScoreResult,
        sources: &[SourceReport],
    ) -> Result<String>;
}

/// Reasoning used when the explainer fails or times out
pub fn fallback_reasoning(score: &ScoreResult) -> String {
    format!("Case scored {:.0}/100.", score.overall_score)
}

/// Deterministic explainer built from the score breakdown
#[derive(Debug, Clone, Default)]
pub struct TemplateExplainer;

impl TemplateExplainer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Explainer for TemplateExplainer {
    async fn reasoning(&self, _case: &Case, score: &ScoreResult) -> Result<String> {
        let mut text = format!(
            "Case scored {:.0}/100 ({} risk) from {} factors.",
            score.overall_score,
            score.risk_level,
            score.risk_factors.len()
        );

        let strongest = score
            .risk_factors
            .iter()
            .filter(|f| f.score > 0.0)
            .max_by(|a, b| a.weighted_score().total_cmp(&b.weighted_score()));

        match strongest {
            Some(factor) => {
                let _ = write!(
                    text,
                    " Largest contribution: {} at {:.0}/100.",
                    factor.name, factor.score
                );
            }
            None => text.push_str(" No factor reported risk."),
        }

        Ok(text)
    }

    async fn narrative(
        &self,
        case: &Case,
        score: &ScoreResult,
        sources: &[SourceReport],
    ) -> Result<String> {
        let mut text = String::new();

        let _ = writeln!(
            text,
            "Case {} ({}) assessed at {:.1}/100, {} risk, confidence {:.2}.",
            case.case_id, case.vertical, score.overall_score, score.risk_level, score.confidence
        );

        for factor in &score.risk_factors {
            let _ = writeln!(
                text,
                "- {}: {:.0}/100 (weight {:.2}){}",
                factor.name,
                factor.score,
                factor.weight,
                if factor.description.is_empty() {
                    String::new()
                } else {
                    format!(" {}", factor.description)
                }
            );
            for evidence in &factor.evidence {
                let _ = writeln!(text, "    * {evidence}");
            }
        }

        let failed: Vec<&str> = sources
            .iter()
            .filter(|s| s.status == SignalStatus::Failed)
            .map(|s| s.kind.key())
            .collect();
        if !failed.is_empty() {
            let _ = writeln!(text, "Unavailable signals: {}.", failed.join(", "));
        }

        let _ = write!(text, "Recommendation: {}", score.recommendation);
        Ok(text)
    }
}
