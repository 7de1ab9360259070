//! riskstream signals
//!
//! Fans a case out to its signal sources and folds the results back into a
//! scored [`CaseAnalysis`].
//!
//! The orchestrator runs four phases per case:
//! 1. Extraction ([`Extractor`]) turns a submission into a [`riskstream_core::Case`]
//! 2. Every applicable [`SignalSource`] runs concurrently, isolated from the others
//! 3. The [`riskstream_policy::EnsembleScorer`] combines the present factors
//! 4. Reasoning and narrative ([`Explainer`]) run concurrently after scoring
//!
//! A failing, hanging or panicking source degrades to a neutral factor and
//! never aborts the case.

pub mod characteristics;
pub mod explain;
pub mod extract;
pub mod orchestrator;
pub mod plan;
pub mod recorded;
pub mod registry;
pub mod source;

pub use characteristics::ClaimCharacteristicsSource;
pub use explain::{fallback_reasoning, Explainer, TemplateExplainer};
pub use extract::{Extractor, JsonCaseExtractor};
pub use orchestrator::{CaseAnalysis, Orchestrator, OrchestratorConfig};
pub use plan::{PlanBuilder, SignalPlan};
pub use recorded::RecordedSignalSource;
pub use registry::SignalRegistry;
pub use source::{AssetRequirement, SignalSource};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::orchestrator::{CaseAnalysis, Orchestrator, OrchestratorConfig};
    pub use crate::plan::{PlanBuilder, SignalPlan};
    pub use crate::registry::SignalRegistry;
    pub use crate::source::{AssetRequirement, SignalSource};
}
