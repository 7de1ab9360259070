//! riskstream policy
//!
//! Declarative scoring policy for the risk decision engine.
//!
//! A policy specifies:
//! - Base weight tables per vertical, with validated per-call overrides
//! - Decision profiles (risk level cutpoints, recommendations, borderline nudge)
//! - The agreement-based confidence estimator
//!
//! The [`EnsembleScorer`] combines these into a pure function from factor
//! signals to a [`riskstream_core::ScoreResult`].

pub mod config;
pub mod confidence;
pub mod profile;
pub mod scorer;
pub mod weights;

pub use config::PolicyConfig;
pub use confidence::{ConfidenceEstimator, NO_SIGNAL_CONFIDENCE};
pub use profile::{
    BorderlineNudge, Cutpoint, DecisionMode, DecisionProfile, ProfileSet, Recommendation,
    RecommendationTable, ThresholdProfile,
};
pub use scorer::EnsembleScorer;
pub use weights::{renormalize, WeightOverride, WeightTable, WEIGHT_TOLERANCE};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::PolicyConfig;
    pub use crate::profile::{DecisionMode, DecisionProfile, ThresholdProfile};
    pub use crate::scorer::EnsembleScorer;
    pub use crate::weights::{WeightOverride, WeightTable};
}
