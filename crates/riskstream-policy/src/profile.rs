//! Decision profiles: risk level cutpoints, recommendations, and the
//! strict-mode borderline nudge

use riskstream_core::{Decision, Error, Result, RiskLevel, Vertical};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which family of decision profiles is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMode {
    #[default]
    Standard,
    Strict,
}

impl fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl std::str::FromStr for DecisionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "default" => Ok(Self::Standard),
            "strict" | "rigid" => Ok(Self::Strict),
            other => Err(Error::config(format!("unknown decision mode '{other}'"))),
        }
    }
}

/// Lowest score at which a risk level applies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cutpoint {
    pub min_score: f64,
    pub level: RiskLevel,
}

/// Increasing list of cutpoints, evaluated highest first.
/// Scores below every cutpoint classify as [`RiskLevel::Low`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    cutpoints: Vec<Cutpoint>,
}

impl ThresholdProfile {
    /// Build a profile from the medium/high/critical cutpoints
    pub fn new(medium: f64, high: f64, critical: f64) -> Result<Self> {
        Self::from_cutpoints(vec![
            Cutpoint {
                min_score: medium,
                level: RiskLevel::Medium,
            },
            Cutpoint {
                min_score: high,
                level: RiskLevel::High,
            },
            Cutpoint {
                min_score: critical,
                level: RiskLevel::Critical,
            },
        ])
    }

    /// Build a profile from an explicit cutpoint list
    pub fn from_cutpoints(cutpoints: Vec<Cutpoint>) -> Result<Self> {
        let profile = Self { cutpoints };
        profile.validate()?;
        Ok(profile)
    }

    pub fn standard() -> Self {
        Self::fixed(25.0, 50.0, 75.0)
    }

    pub fn strict() -> Self {
        Self::fixed(15.0, 40.0, 60.0)
    }

    pub fn strict_identity() -> Self {
        Self::fixed(10.0, 30.0, 50.0)
    }

    fn fixed(medium: f64, high: f64, critical: f64) -> Self {
        Self {
            cutpoints: vec![
                Cutpoint {
                    min_score: medium,
                    level: RiskLevel::Medium,
                },
                Cutpoint {
                    min_score: high,
                    level: RiskLevel::High,
                },
                Cutpoint {
                    min_score: critical,
                    level: RiskLevel::Critical,
                },
            ],
        }
    }

    /// Cutpoints must be in [0, 100] and strictly increasing in both score
    /// and level
    pub fn validate(&self) -> Result<()> {
        for cut in &self.cutpoints {
            if !cut.min_score.is_finite() || !(0.0..=100.0).contains(&cut.min_score) {
                return Err(Error::config(format!(
                    "cutpoint for {} must be within [0, 100], got {}",
                    cut.level, cut.min_score
                )));
            }
        }

        for pair in self.cutpoints.windows(2) {
            if pair[1].min_score <= pair[0].min_score || pair[1].level <= pair[0].level {
                return Err(Error::config(format!(
                    "cutpoints must increase: {} at {} is followed by {} at {}",
                    pair[0].level, pair[0].min_score, pair[1].level, pair[1].min_score
                )));
            }
        }

        Ok(())
    }

    /// Map a score to its risk level
    pub fn classify(&self, score: f64) -> RiskLevel {
        self.cutpoints
            .iter()
            .rev()
            .find(|cut| score >= cut.min_score)
            .map(|cut| cut.level)
            .unwrap_or(RiskLevel::Low)
    }

    /// Minimum score for a level, if it has a cutpoint
    pub fn cutpoint(&self, level: RiskLevel) -> Option<f64> {
        self.cutpoints
            .iter()
            .find(|cut| cut.level == level)
            .map(|cut| cut.min_score)
    }

    pub fn cutpoints(&self) -> &[Cutpoint] {
        &self.cutpoints
    }
}

/// Decision and display text for one risk level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub decision: Decision,
    pub text: String,
}

impl Recommendation {
    fn new(decision: Decision, text: &str) -> Self {
        Self {
            decision,
            text: text.to_string(),
        }
    }
}

/// Static lookup from risk level to recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationTable {
    pub low: Recommendation,
    pub medium: Recommendation,
    pub high: Recommendation,
    pub critical: Recommendation,
}

impl RecommendationTable {
    pub fn standard() -> Self {
        Self {
            low: Recommendation::new(Decision::Approve, "APPROVE - Proceed with standard processing"),
            medium: Recommendation::new(Decision::Review, "REVIEW - Additional documentation required"),
            high: Recommendation::new(Decision::Investigate, "INVESTIGATE - Assign to fraud analyst"),
            critical: Recommendation::new(
                Decision::Deny,
                "DENY - Refer to special investigations immediately",
            ),
        }
    }

    /// Every level requires a human in the loop
    pub fn strict() -> Self {
        Self {
            low: Recommendation::new(Decision::Review, "REVIEW - Standard manual sign-off required"),
            medium: Recommendation::new(
                Decision::Review,
                "REVIEW - Manual review required before approval",
            ),
            high: Recommendation::new(Decision::Investigate, "INVESTIGATE - Mandatory analyst review"),
            critical: Recommendation::new(Decision::Deny, "DENY - Escalate to special investigations"),
        }
    }

    pub fn for_level(&self, level: RiskLevel) -> &Recommendation {
        match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
            RiskLevel::Critical => &self.critical,
        }
    }
}

/// Upward nudge applied to scores in `[lower, upper)`, capped at 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderlineNudge {
    pub lower: f64,
    pub upper: f64,
    pub amount: f64,
}

impl BorderlineNudge {
    /// Strict-mode default: pushes [10, 15) over the strict medium cutpoint
    pub const STRICT: BorderlineNudge = BorderlineNudge {
        lower: 10.0,
        upper: 15.0,
        amount: 5.0,
    };

    pub const STRICT_IDENTITY: BorderlineNudge = BorderlineNudge {
        lower: 5.0,
        upper: 10.0,
        amount: 5.0,
    };

    pub fn applies(&self, score: f64) -> bool {
        score >= self.lower && score < self.upper
    }

    pub fn apply(&self, score: f64) -> f64 {
        if self.applies(score) {
            (score + self.amount).min(100.0)
        } else {
            score
        }
    }

    pub fn validate(&self) -> Result<()> {
        let finite = self.lower.is_finite() && self.upper.is_finite() && self.amount.is_finite();
        if !finite || self.lower <= 0.0 || self.upper <= self.lower || self.amount < 0.0 {
            return Err(Error::config(format!(
                "borderline nudge needs 0 < lower < upper and amount >= 0, got {self:?}"
            )));
        }
        Ok(())
    }
}

/// Everything the scorer needs to turn a score into a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionProfile {
    pub name: String,
    pub thresholds: ThresholdProfile,
    pub recommendations: RecommendationTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nudge: Option<BorderlineNudge>,
}

impl DecisionProfile {
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            thresholds: ThresholdProfile::standard(),
            recommendations: RecommendationTable::standard(),
            nudge: None,
        }
    }

    pub fn strict() -> Self {
        Self {
            name: "strict".to_string(),
            thresholds: ThresholdProfile::strict(),
            recommendations: RecommendationTable::strict(),
            nudge: Some(BorderlineNudge::STRICT),
        }
    }

    pub fn strict_identity() -> Self {
        Self {
            name: "strict_identity".to_string(),
            thresholds: ThresholdProfile::strict_identity(),
            recommendations: RecommendationTable::strict(),
            nudge: Some(BorderlineNudge::STRICT_IDENTITY),
        }
    }

    /// Default profile for a mode and vertical
    pub fn select(mode: DecisionMode, vertical: Vertical) -> Self {
        ProfileSet::default().select(mode, vertical).clone()
    }

    /// Replace the nudge (or remove it with `None`)
    pub fn with_nudge(mut self, nudge: Option<BorderlineNudge>) -> Self {
        self.nudge = nudge;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if let Some(nudge) = &self.nudge {
            nudge.validate()?;
        }
        Ok(())
    }

    /// Apply the nudge, if any
    pub fn adjust(&self, score: f64) -> f64 {
        self.nudge.map_or(score, |n| n.apply(score))
    }

    pub fn classify(&self, score: f64) -> RiskLevel {
        self.thresholds.classify(score)
    }

    pub fn recommendation(&self, level: RiskLevel) -> &Recommendation {
        self.recommendations.for_level(level)
    }
}

/// The configured profiles and the rule for choosing among them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(default = "DecisionProfile::standard")]
    pub standard: DecisionProfile,

    #[serde(default = "DecisionProfile::strict")]
    pub strict: DecisionProfile,

    /// Strict profile for identity-document cases
    #[serde(default = "DecisionProfile::strict_identity")]
    pub strict_identity: DecisionProfile,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self {
            standard: DecisionProfile::standard(),
            strict: DecisionProfile::strict(),
            strict_identity: DecisionProfile::strict_identity(),
        }
    }
}

impl ProfileSet {
    pub fn select(&self, mode: DecisionMode, vertical: Vertical) -> &DecisionProfile {
        match (mode, vertical) {
            (DecisionMode::Standard, _) => &self.standard,
            (DecisionMode::Strict, Vertical::IdentityDocument) => &self.strict_identity,
            (DecisionMode::Strict, _) => &self.strict,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.standard.validate()?;
        self.strict.validate()?;
        self.strict_identity.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_levels() {
        let profile = ThresholdProfile::standard();
        assert_eq!(profile.classify(80.0), RiskLevel::Critical);
        assert_eq!(profile.classify(75.0), RiskLevel::Critical);
        assert_eq!(profile.classify(60.0), RiskLevel::High);
        assert_eq!(profile.classify(30.0), RiskLevel::Medium);
        assert_eq!(profile.classify(10.0), RiskLevel::Low);
        assert_eq!(profile.classify(0.0), RiskLevel::Low);
    }

    #[test]
    fn test_strict_is_stricter_than_standard() {
        let standard = ThresholdProfile::standard();
        let strict = ThresholdProfile::strict();
        let identity = ThresholdProfile::strict_identity();

        for level in [RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical] {
            assert!(strict.cutpoint(level) < standard.cutpoint(level));
            assert!(identity.cutpoint(level) < strict.cutpoint(level));
        }
    }

    #[test]
    fn test_profile_selection() {
        assert_eq!(
            DecisionProfile::select(DecisionMode::Standard, Vertical::IdentityDocument).name,
            "standard"
        );
        assert_eq!(
            DecisionProfile::select(DecisionMode::Strict, Vertical::Insurance).name,
            "strict"
        );
        assert_eq!(
            DecisionProfile::select(DecisionMode::Strict, Vertical::IdentityDocument).name,
            "strict_identity"
        );
    }

    #[test]
    fn test_non_increasing_cutpoints_rejected() {
        assert!(ThresholdProfile::new(50.0, 40.0, 75.0).is_err());
        assert!(ThresholdProfile::new(25.0, 50.0, 120.0).is_err());
        assert!(ThresholdProfile::new(20.0, 45.0, 70.0).is_ok());
    }

    #[test]
    fn test_nudge_band() {
        let nudge = BorderlineNudge::STRICT;
        assert_eq!(nudge.apply(0.0), 0.0);
        assert_eq!(nudge.apply(9.9), 9.9);
        assert_eq!(nudge.apply(10.0), 15.0);
        assert_eq!(nudge.apply(14.0), 19.0);
        assert_eq!(nudge.apply(15.0), 15.0);

        let capped = BorderlineNudge {
            lower: 97.0,
            upper: 99.0,
            amount: 5.0,
        };
        assert_eq!(capped.apply(98.0), 100.0);
    }

    #[test]
    fn test_strict_low_still_requires_review() {
        let profile = DecisionProfile::strict();
        assert_eq!(profile.recommendation(RiskLevel::Low).decision, Decision::Review);
        assert_eq!(
            DecisionProfile::standard().recommendation(RiskLevel::Low).decision,
            Decision::Approve
        );
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("rigid".parse::<DecisionMode>().unwrap(), DecisionMode::Strict);
        assert!("lenient".parse::<DecisionMode>().is_err());
    }
}
