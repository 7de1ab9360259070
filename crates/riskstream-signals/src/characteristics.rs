//! Local claim-characteristics heuristic
//!
//! Scores properties inherent to the claim itself, without any external
//! model: unusually large amounts and soft-tissue injuries that are hard to
//! verify.

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use riskstream_core::{Case, Error, FactorKind, Result, Severity, SignalFlag, SignalResult};
use serde_json::Value;

use crate::source::SignalSource;

const DEFAULT_SOFT_TISSUE_TERMS: [&str; 6] = [
    "whiplash",
    "soft tissue",
    "strain",
    "sprain",
    "neck pain",
    "back pain",
];

pub struct ClaimCharacteristicsSource {
    soft_tissue: AhoCorasick,
    amount_threshold: f64,
    amount_points: f64,
    injury_points: f64,
}

impl ClaimCharacteristicsSource {
    pub fn new() -> Result<Self> {
        Self::with_terms(DEFAULT_SOFT_TISSUE_TERMS)
    }

    /// Build with a custom soft-tissue vocabulary
    pub fn with_terms<I, P>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let soft_tissue = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(terms)
            .map_err(|e| Error::signal(format!("Failed to build soft tissue matcher: {e}")))?;

        Ok(Self {
            soft_tissue,
            amount_threshold: 100_000.0,
            amount_points: 20.0,
            injury_points: 15.0,
        })
    }

    /// Amounts strictly above this add points
    pub fn with_amount_threshold(mut self, threshold: f64) -> Self {
        self.amount_threshold = threshold;
        self
    }

    fn claim_amount(case: &Case) -> Option<f64> {
        match case.field("claim.amount")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.replace([',', '$'], "").trim().parse().ok(),
            _ => None,
        }
    }
}

#[async_trait]
impl SignalSource for ClaimCharacteristicsSource {
    async fn evaluate(&self, case: &Case) -> Result<SignalResult> {
        let mut flags = Vec::new();
        let mut score = 0.0;

        if let Some(amount) = Self::claim_amount(case) {
            if amount > self.amount_threshold {
                score += self.amount_points;
                flags.push(SignalFlag::new(
                    "high_claim_amount",
                    Severity::Medium,
                    format!("High claim amount: ${amount:.2}"),
                ));
            }
        }

        let injuries = case
            .field("medical.injuries")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();

        if let Some(injury) = injuries.iter().find(|i| self.soft_tissue.is_match(**i)) {
            score += self.injury_points;
            flags.push(SignalFlag::new(
                "soft_tissue_injury",
                Severity::Medium,
                format!("Soft tissue injury: {injury}"),
            ));
        }

        let summary = format!("{} risk flags", flags.len());
        Ok(SignalResult::success(f64::min(score, 100.0), summary).with_flags(flags))
    }

    fn kind(&self) -> FactorKind {
        FactorKind::ClaimCharacteristics
    }

    fn name(&self) -> &str {
        "claim_characteristics_local"
    }
}
