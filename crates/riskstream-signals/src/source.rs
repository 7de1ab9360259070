//! Signal source trait

use async_trait::async_trait;
use riskstream_core::{Case, FactorKind, Result, SignalResult};
use serde::{Deserialize, Serialize};

/// Trait for every evaluator contributing one risk dimension
///
/// Implementations must be safe to share across concurrently analyzed
/// cases. Returning `Err` is equivalent to returning
/// [`SignalResult::Failed`].
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Evaluate the case
    async fn evaluate(&self, case: &Case) -> Result<SignalResult>;

    /// Factor this source reports
    fn kind(&self) -> FactorKind;

    /// Assets that must be attached for this source to run
    fn requires(&self) -> AssetRequirement {
        AssetRequirement::None
    }

    /// Name used in logs
    fn name(&self) -> &str {
        self.kind().key()
    }
}

/// Asset precondition for including a source in a case's run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetRequirement {
    #[default]
    None,
    Images,
}

impl AssetRequirement {
    pub fn is_met_by(&self, case: &Case) -> bool {
        match self {
            Self::None => true,
            Self::Images => case.has_images(),
        }
    }

    /// Reason reported when the requirement is not met
    pub fn missing_reason(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Images => "no images attached",
        }
    }
}
