//! Case extraction

use async_trait::async_trait;
use riskstream_core::{Case, Error, Result, Vertical};
use std::path::Path;
use tracing::debug;

/// Turns a submitted document into a [`Case`]
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<Case>;
}

/// Loads a case from its JSON document.
///
/// Relative asset paths are resolved against the document's directory.
#[derive(Debug, Clone, Default)]
pub struct JsonCaseExtractor {
    vertical: Option<Vertical>,
}

impl JsonCaseExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force every extracted case into a vertical
    pub fn with_vertical(mut self, vertical: Vertical) -> Self {
        self.vertical = Some(vertical);
        self
    }
}

#[async_trait]
impl Extractor for JsonCaseExtractor {
    async fn extract(&self, path: &Path) -> Result<Case> {
        let shown = path.display().to_string();

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::case_load(&shown, e.to_string()))?;

        let mut case =
            Case::from_json_str(&content).map_err(|e| Error::case_load(&shown, e.to_string()))?;

        if let Some(base) = path.parent() {
            for asset in &mut case.assets {
                if asset.path.is_relative() {
                    asset.path = base.join(&asset.path);
                }
            }
        }

        if let Some(vertical) = self.vertical {
            case.vertical = vertical;
        }

        debug!(case_id = %case.case_id, path = %shown, "Extracted case");
        Ok(case)
    }
}
