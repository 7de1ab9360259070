//! Per-vertical signal plans

use riskstream_core::{Case, Error, FactorKind, Result, Vertical};
use riskstream_policy::WeightTable;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::source::SignalSource;

/// The set of sources invoked for one vertical
#[derive(Clone)]
pub struct SignalPlan {
    vertical: Vertical,
    sources: Vec<Arc<dyn SignalSource>>,
}

impl SignalPlan {
    pub fn vertical(&self) -> Vertical {
        self.vertical
    }

    pub fn sources(&self) -> &[Arc<dyn SignalSource>] {
        &self.sources
    }

    pub fn kinds(&self) -> impl Iterator<Item = FactorKind> + '_ {
        self.sources.iter().map(|s| s.kind())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Split the plan for a case: sources whose asset requirement is met,
    /// and the kinds left out together with the reason
    pub fn partition(
        &self,
        case: &Case,
    ) -> (Vec<Arc<dyn SignalSource>>, Vec<(FactorKind, &'static str)>) {
        let mut run = Vec::with_capacity(self.sources.len());
        let mut omitted = Vec::new();

        for source in &self.sources {
            let requirement = source.requires();
            if requirement.is_met_by(case) {
                run.push(Arc::clone(source));
            } else {
                omitted.push((source.kind(), requirement.missing_reason()));
            }
        }

        (run, omitted)
    }
}

impl fmt::Debug for SignalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalPlan")
            .field("vertical", &self.vertical)
            .field("sources", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for constructing plans fluently
pub struct PlanBuilder {
    vertical: Vertical,
    sources: Vec<Arc<dyn SignalSource>>,
}

impl PlanBuilder {
    pub fn new(vertical: Vertical) -> Self {
        Self {
            vertical,
            sources: Vec::new(),
        }
    }

    /// Add a source
    pub fn source(mut self, source: Arc<dyn SignalSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Build the plan, rejecting duplicate kinds and kinds the weight
    /// table does not know
    pub fn build(self, weights: &WeightTable) -> Result<SignalPlan> {
        let mut seen = BTreeSet::new();

        for source in &self.sources {
            let kind = source.kind();
            if !seen.insert(kind) {
                return Err(Error::config(format!(
                    "{} plan lists {kind} more than once",
                    self.vertical
                )));
            }
            if !weights.contains(kind) {
                return Err(Error::config(format!(
                    "{} plan lists {kind}, which has no weight for this vertical",
                    self.vertical
                )));
            }
        }

        Ok(SignalPlan {
            vertical: self.vertical,
            sources: self.sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorded::RecordedSignalSource;
    use crate::source::AssetRequirement;
    use async_trait::async_trait;
    use riskstream_core::SignalResult;

    struct ImageOnly;

    #[async_trait]
    impl SignalSource for ImageOnly {
        async fn evaluate(&self, _case: &Case) -> Result<SignalResult> {
            Ok(SignalResult::success(10.0, "checked"))
        }

        fn kind(&self) -> FactorKind {
            FactorKind::ImageAuthenticity
        }

        fn requires(&self) -> AssetRequirement {
            AssetRequirement::Images
        }
    }

    fn recorded(kind: FactorKind) -> Arc<dyn SignalSource> {
        Arc::new(RecordedSignalSource::new(kind))
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let result = PlanBuilder::new(Vertical::Mortgage)
            .source(recorded(FactorKind::Inconsistency))
            .source(recorded(FactorKind::Inconsistency))
            .build(&WeightTable::mortgage());

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unweighted_kind_rejected() {
        let result = PlanBuilder::new(Vertical::Mortgage)
            .source(recorded(FactorKind::AiText))
            .build(&WeightTable::mortgage());

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_partition_by_assets() {
        let plan = PlanBuilder::new(Vertical::Insurance)
            .source(recorded(FactorKind::Inconsistency))
            .source(Arc::new(ImageOnly))
            .build(&WeightTable::insurance())
            .unwrap();

        let case = Case::new(Vertical::Insurance, serde_json::json!({}), "text");
        let (run, omitted) = plan.partition(&case);
        assert_eq!(run.len(), 1);
        assert_eq!(omitted, vec![(FactorKind::ImageAuthenticity, "no images attached")]);

        let (run, omitted) = plan.partition(&case.with_image("damage.jpg"));
        assert_eq!(run.len(), 2);
        assert!(omitted.is_empty());
    }
}
