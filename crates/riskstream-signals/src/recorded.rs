//! Replay of signal outputs recorded on the case itself

use async_trait::async_trait;
use riskstream_core::{Case, FactorKind, Result, SignalResult};
use tracing::warn;

use crate::source::SignalSource;

/// Replays `case.recorded_signals[kind]`.
///
/// Used for offline evaluation, where signal outputs were captured once and
/// the decision engine is re-run over them. A case without a recording for
/// this kind yields [`SignalResult::Skipped`]; a recording that does not
/// decode yields [`SignalResult::Failed`].
#[derive(Debug, Clone)]
pub struct RecordedSignalSource {
    kind: FactorKind,
}

impl RecordedSignalSource {
    pub fn new(kind: FactorKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl SignalSource for RecordedSignalSource {
    async fn evaluate(&self, case: &Case) -> Result<SignalResult> {
        let result = match case.recorded(self.kind) {
            Some(Ok(result)) => result,
            Some(Err(e)) => {
                warn!(source = %self.kind, error = %e, "Unreadable recorded output");
                SignalResult::failed(format!("unreadable recorded output: {e}"))
            }
            None => SignalResult::skipped(format!("no recorded {} output", self.kind)),
        };
        Ok(result)
    }

    fn kind(&self) -> FactorKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskstream_core::{SignalStatus, Vertical};

    #[tokio::test]
    async fn test_replays_recorded_output() {
        let case = Case::new(Vertical::Insurance, serde_json::json!({}), "text")
            .with_recorded(FactorKind::PatternMatch, SignalResult::success(65.0, "staged accident"));

        let source = RecordedSignalSource::new(FactorKind::PatternMatch);
        let result = source.evaluate(&case).await.unwrap();
        assert_eq!(result.score(), 65.0);
        assert_eq!(result.summary(), "staged accident");
    }

    #[tokio::test]
    async fn test_missing_recording_is_skipped() {
        let case = Case::new(Vertical::Insurance, serde_json::json!({}), "text");

        let source = RecordedSignalSource::new(FactorKind::NetworkRisk);
        let result = source.evaluate(&case).await.unwrap();
        assert_eq!(result.status(), SignalStatus::Skipped);
    }

    #[tokio::test]
    async fn test_malformed_recording_fails_only_this_source() {
        let mut case = Case::new(Vertical::Insurance, serde_json::json!({}), "text");
        case.recorded_signals.insert(
            "pattern_match".to_string(),
            serde_json::json!({"status": "success", "score": "very high"}),
        );

        let source = RecordedSignalSource::new(FactorKind::PatternMatch);
        let result = source.evaluate(&case).await.unwrap();
        assert_eq!(result.status(), SignalStatus::Failed);
        assert_eq!(result.score(), 0.0);
    }
}
