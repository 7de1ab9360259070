//! Core types for riskstream

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// A risk dimension contributed by one signal source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Inconsistency,
    PatternMatch,
    NetworkRisk,
    DocumentQuality,
    ClaimCharacteristics,
    ImageAuthenticity,
    IdConsistency,
    TemplateMatch,
    Metadata,
    BillingIntegrity,
    ClinicalConsistency,
    Eligibility,
    IncomeVerification,
    PropertyValuation,
    AiText,
    AiImage,
}

impl FactorKind {
    /// Every known factor kind
    pub const ALL: [FactorKind; 16] = [
        Self::Inconsistency,
        Self::PatternMatch,
        Self::NetworkRisk,
        Self::DocumentQuality,
        Self::ClaimCharacteristics,
        Self::ImageAuthenticity,
        Self::IdConsistency,
        Self::TemplateMatch,
        Self::Metadata,
        Self::BillingIntegrity,
        Self::ClinicalConsistency,
        Self::Eligibility,
        Self::IncomeVerification,
        Self::PropertyValuation,
        Self::AiText,
        Self::AiImage,
    ];

    /// Configuration key (snake_case)
    pub fn key(&self) -> &'static str {
        match self {
            Self::Inconsistency => "inconsistency",
            Self::PatternMatch => "pattern_match",
            Self::NetworkRisk => "network_risk",
            Self::DocumentQuality => "document_quality",
            Self::ClaimCharacteristics => "claim_characteristics",
            Self::ImageAuthenticity => "image_authenticity",
            Self::IdConsistency => "id_consistency",
            Self::TemplateMatch => "template_match",
            Self::Metadata => "metadata",
            Self::BillingIntegrity => "billing_integrity",
            Self::ClinicalConsistency => "clinical_consistency",
            Self::Eligibility => "eligibility",
            Self::IncomeVerification => "income_verification",
            Self::PropertyValuation => "property_valuation",
            Self::AiText => "ai_text",
            Self::AiImage => "ai_image",
        }
    }

    /// Human-readable factor name shown in score breakdowns
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Inconsistency => "Inconsistencies",
            Self::PatternMatch => "Fraud Pattern Match",
            Self::NetworkRisk => "Network/Ring Risk",
            Self::DocumentQuality => "Document Quality",
            Self::ClaimCharacteristics => "Claim Characteristics",
            Self::ImageAuthenticity => "Image Authenticity",
            Self::IdConsistency => "ID Consistency",
            Self::TemplateMatch => "Template Match",
            Self::Metadata => "Metadata Integrity",
            Self::BillingIntegrity => "Billing Integrity",
            Self::ClinicalConsistency => "Clinical Consistency",
            Self::Eligibility => "Eligibility",
            Self::IncomeVerification => "Income Verification",
            Self::PropertyValuation => "Property Valuation",
            Self::AiText => "AI-Generated Text",
            Self::AiImage => "AI-Generated Imagery",
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FactorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.key() == needle)
            .ok_or_else(|| Error::unknown_factor(needle))
    }
}

/// Business vertical a case belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Vertical {
    /// Insurance claims (the general scoring mode)
    #[default]
    #[serde(alias = "auto")]
    Insurance,
    Medical,
    Mortgage,
    #[serde(alias = "photo_id")]
    IdentityDocument,
    AiContent,
}

impl Vertical {
    /// Every known vertical
    pub const ALL: [Vertical; 5] = [
        Self::Insurance,
        Self::Medical,
        Self::Mortgage,
        Self::IdentityDocument,
        Self::AiContent,
    ];

    /// Configuration key (snake_case)
    pub fn key(&self) -> &'static str {
        match self {
            Self::Insurance => "insurance",
            Self::Medical => "medical",
            Self::Mortgage => "mortgage",
            Self::IdentityDocument => "identity_document",
            Self::AiContent => "ai_content",
        }
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Vertical {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insurance" | "auto" => Ok(Self::Insurance),
            "medical" => Ok(Self::Medical),
            "mortgage" => Ok(Self::Mortgage),
            "identity_document" | "photo_id" => Ok(Self::IdentityDocument),
            "ai_content" => Ok(Self::AiContent),
            other => Err(Error::config(format!("unknown vertical '{other}'"))),
        }
    }
}

/// Discrete risk level, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome handed to the caller alongside the recommendation text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Review,
    Investigate,
    Deny,
}

/// Severity of an individual signal flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A finding reported by a signal source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFlag {
    /// Flag category (e.g. "date_mismatch")
    #[serde(rename = "type", default)]
    pub flag_type: String,

    /// Severity level
    #[serde(default)]
    pub severity: Severity,

    /// Human-readable description, used as evidence
    #[serde(default)]
    pub description: String,

    /// Source confidence in this flag (0.0-1.0)
    #[serde(default)]
    pub confidence: f64,
}

impl SignalFlag {
    /// Create a new flag
    pub fn new(flag_type: impl Into<String>, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            flag_type: flag_type.into(),
            severity,
            description: description.into(),
            confidence: 1.0,
        }
    }

    /// Set the confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Status of a signal source evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Success,
    Skipped,
    Failed,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Normalized output of a signal source
///
/// Serialized with a `status` tag; `"error"` is accepted as an alias for
/// `failed` when reading recorded outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SignalResult {
    /// The source produced a score
    Success {
        score: f64,
        #[serde(default)]
        flags: Vec<SignalFlag>,
        #[serde(default)]
        summary: String,
    },

    /// The source did not apply to this case
    Skipped {
        #[serde(default)]
        reason: String,
    },

    /// The source errored, timed out, or produced unusable output
    #[serde(alias = "error")]
    Failed {
        #[serde(default, alias = "error")]
        reason: String,
    },
}

impl SignalResult {
    /// Create a successful result without flags
    pub fn success(score: f64, summary: impl Into<String>) -> Self {
        Self::Success {
            score,
            flags: Vec::new(),
            summary: summary.into(),
        }
    }

    /// Create a skipped result
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Create a failed result
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Attach flags to a successful result; no-op for other variants
    pub fn with_flags(mut self, new_flags: Vec<SignalFlag>) -> Self {
        if let Self::Success { flags, .. } = &mut self {
            *flags = new_flags;
        }
        self
    }

    pub fn status(&self) -> SignalStatus {
        match self {
            Self::Success { .. } => SignalStatus::Success,
            Self::Skipped { .. } => SignalStatus::Skipped,
            Self::Failed { .. } => SignalStatus::Failed,
        }
    }

    /// Score in [0, 100]; zero for anything but success
    pub fn score(&self) -> f64 {
        match self {
            Self::Success { score, .. } if score.is_finite() => score.clamp(0.0, 100.0),
            _ => 0.0,
        }
    }

    pub fn flags(&self) -> &[SignalFlag] {
        match self {
            Self::Success { flags, .. } => flags,
            _ => &[],
        }
    }

    /// Summary for successes, reason otherwise
    pub fn summary(&self) -> &str {
        match self {
            Self::Success { summary, .. } => summary,
            Self::Skipped { reason } | Self::Failed { reason } => reason,
        }
    }
}

/// Kind of auxiliary asset attached to a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Document,
}

/// Auxiliary asset (image, scanned document) attached to a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseAsset {
    pub kind: AssetKind,
    pub path: PathBuf,
}

impl CaseAsset {
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: AssetKind::Image,
            path: path.into(),
        }
    }
}

/// A submitted case after extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    /// Case identifier; generated when absent
    #[serde(default = "generate_case_id")]
    pub case_id: String,

    /// Vertical the case belongs to
    #[serde(default)]
    pub vertical: Vertical,

    /// Structured fields extracted from the submission
    #[serde(default, alias = "claim_data", alias = "application_data")]
    pub fields: serde_json::Value,

    /// Raw text of the submission
    #[serde(default)]
    pub raw_text: String,

    /// Auxiliary assets such as images
    #[serde(default)]
    pub assets: Vec<CaseAsset>,

    /// Previously recorded signal outputs, keyed by factor name.
    ///
    /// Kept as raw JSON: each entry is decoded by the source that replays
    /// it, so a malformed entry only fails that source.
    #[serde(default, alias = "signals", skip_serializing_if = "BTreeMap::is_empty")]
    pub recorded_signals: BTreeMap<String, serde_json::Value>,
}

fn generate_case_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Case {
    /// Create a new case from structured fields and raw text
    pub fn new(vertical: Vertical, fields: serde_json::Value, raw_text: impl Into<String>) -> Self {
        let mut case = Self {
            case_id: generate_case_id(),
            vertical,
            fields,
            raw_text: raw_text.into(),
            assets: Vec::new(),
            recorded_signals: BTreeMap::new(),
        };
        case.normalize();
        case
    }

    /// Parse a case document, filling in derived defaults
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let mut case: Case = serde_json::from_str(json)?;
        case.normalize();
        Ok(case)
    }

    /// Set the case identifier
    pub fn with_id(mut self, case_id: impl Into<String>) -> Self {
        self.case_id = case_id.into();
        self
    }

    /// Attach an image asset
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.assets.push(CaseAsset::image(path));
        self
    }

    /// Attach a recorded signal output
    pub fn with_recorded(mut self, kind: FactorKind, result: SignalResult) -> Self {
        let value = serde_json::to_value(&result).unwrap_or(serde_json::Value::Null);
        self.recorded_signals.insert(kind.key().to_string(), value);
        self
    }

    /// Decode the recorded output for a factor, if one was recorded
    pub fn recorded(&self, kind: FactorKind) -> Option<crate::Result<SignalResult>> {
        self.recorded_signals
            .get(kind.key())
            .map(|value| SignalResult::deserialize(value).map_err(crate::Error::from))
    }

    /// Whether any image asset is attached
    pub fn has_images(&self) -> bool {
        self.assets.iter().any(|a| a.kind == AssetKind::Image)
    }

    /// Image asset paths in submission order
    pub fn image_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.assets
            .iter()
            .filter(|a| a.kind == AssetKind::Image)
            .map(|a| &a.path)
    }

    /// Look up a nested field by dotted path (e.g. `claim.amount`)
    pub fn field(&self, dotted: &str) -> Option<&serde_json::Value> {
        dotted
            .split('.')
            .try_fold(&self.fields, |value, key| value.get(key))
    }

    fn normalize(&mut self) {
        if self.fields.is_null() {
            self.fields = serde_json::Value::Object(serde_json::Map::new());
        }
        if self.raw_text.trim().is_empty() {
            self.raw_text = serde_json::to_string_pretty(&self.fields).unwrap_or_default();
        }
    }
}

/// Unweighted factor produced from one source's result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSignal {
    pub kind: FactorKind,
    pub score: f64,
    pub description: String,
    pub evidence: Vec<String>,
}

impl FactorSignal {
    pub fn new(kind: FactorKind, score: f64) -> Self {
        Self {
            kind,
            score,
            description: String::new(),
            evidence: Vec::new(),
        }
    }

    /// Neutral stand-in for a failed source: zero score, no evidence
    pub fn neutral(kind: FactorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            score: 0.0,
            description: reason.into(),
            evidence: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// A weighted contribution to the overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: FactorKind,

    /// Display name
    pub name: String,

    /// Score in [0, 100]
    pub score: f64,

    /// Renormalized weight in [0, 1]
    pub weight: f64,

    pub description: String,

    #[serde(default)]
    pub evidence: Vec<String>,
}

impl RiskFactor {
    /// Contribution of this factor to the overall score
    pub fn weighted_score(&self) -> f64 {
        self.score * self.weight
    }
}

/// Scored assessment of one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Final score in [0, 100], after any profile nudge
    pub overall_score: f64,

    /// Weighted sum before any profile nudge
    pub raw_score: f64,

    pub risk_level: RiskLevel,

    /// Agreement-based confidence
    pub confidence: f64,

    pub risk_factors: Vec<RiskFactor>,

    pub decision: Decision,

    pub recommendation: String,

    /// Filled by the explanation phase
    #[serde(default)]
    pub reasoning: String,

    /// Name of the decision profile that produced this result
    pub profile: String,
}

impl ScoreResult {
    /// Sum of the factor weights (1.0 whenever any factor is present)
    pub fn weight_sum(&self) -> f64 {
        self.risk_factors.iter().map(|f| f.weight).sum()
    }

    /// Look up a factor by kind
    pub fn factor(&self, kind: FactorKind) -> Option<&RiskFactor> {
        self.risk_factors.iter().find(|f| f.kind == kind)
    }
}

/// Per-source payload handed back to callers for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub kind: FactorKind,
    pub status: SignalStatus,
    pub score: f64,
    pub flags: Vec<SignalFlag>,
    pub summary: String,
    pub latency_ms: u64,
}

impl SourceReport {
    pub fn from_result(kind: FactorKind, result: &SignalResult, latency_ms: u64) -> Self {
        Self {
            kind,
            status: result.status(),
            score: result.score(),
            flags: result.flags().to_vec(),
            summary: result.summary().to_string(),
            latency_ms,
        }
    }
}
