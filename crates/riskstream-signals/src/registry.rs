//! Signal source registry and default plans

use riskstream_core::{Error, FactorKind, Result, Vertical};
use riskstream_policy::WeightTable;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::characteristics::ClaimCharacteristicsSource;
use crate::plan::{PlanBuilder, SignalPlan};
use crate::recorded::RecordedSignalSource;
use crate::source::SignalSource;

/// Registry of signal sources by factor kind
#[derive(Clone, Default)]
pub struct SignalRegistry {
    sources: HashMap<FactorKind, Arc<dyn SignalSource>>,
}

impl SignalRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in sources: the local claim-characteristics
    /// heuristic and a replay source for every other factor
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();

        for kind in FactorKind::ALL {
            let source: Arc<dyn SignalSource> = match kind {
                FactorKind::ClaimCharacteristics => Arc::new(ClaimCharacteristicsSource::new()?),
                other => Arc::new(RecordedSignalSource::new(other)),
            };
            registry.register(source);
        }

        info!("Initialized {} signal sources", registry.count());
        Ok(registry)
    }

    /// Register a source, replacing any source for the same kind
    pub fn register(&mut self, source: Arc<dyn SignalSource>) -> Option<Arc<dyn SignalSource>> {
        self.sources.insert(source.kind(), source)
    }

    pub fn get(&self, kind: FactorKind) -> Option<Arc<dyn SignalSource>> {
        self.sources.get(&kind).cloned()
    }

    /// Get the number of registered sources
    pub fn count(&self) -> usize {
        self.sources.len()
    }

    /// Plan covering every factor the weight table knows
    pub fn plan(&self, vertical: Vertical, weights: &WeightTable) -> Result<SignalPlan> {
        weights
            .kinds()
            .try_fold(PlanBuilder::new(vertical), |builder, kind| {
                self.get(kind).map(|source| builder.source(source)).ok_or_else(|| {
                    Error::config(format!("no signal source registered for {kind}"))
                })
            })?
            .build(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plans_cover_tables() {
        let registry = SignalRegistry::with_defaults().unwrap();
        assert_eq!(registry.count(), FactorKind::ALL.len());

        for vertical in Vertical::ALL {
            let table = WeightTable::for_vertical(vertical);
            let plan = registry.plan(vertical, &table).unwrap();

            assert_eq!(plan.vertical(), vertical);
            assert_eq!(plan.len(), table.len());
            assert!(plan.kinds().all(|k| table.contains(k)));
        }
    }

    #[test]
    fn test_missing_source_rejected() {
        let mut registry = SignalRegistry::new();
        registry.register(Arc::new(RecordedSignalSource::new(FactorKind::AiText)));

        let result = registry.plan(Vertical::AiContent, &WeightTable::ai_content());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = SignalRegistry::new();
        assert!(registry
            .register(Arc::new(RecordedSignalSource::new(FactorKind::AiText)))
            .is_none());
        assert!(registry
            .register(Arc::new(RecordedSignalSource::new(FactorKind::AiText)))
            .is_some());
        assert_eq!(registry.count(), 1);
    }
}
