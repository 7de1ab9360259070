//! Labeled datasets
//!
//! Datasets are JSON Lines files. Each line references a case document and
//! carries its ground-truth label:
//!
//! ```json
//! {"input_ref": "cases/claim_001.json", "label": 1, "domain": "eu", "vertical": "insurance"}
//! ```
//!
//! `input`, `label_fraud` and `region` are accepted as aliases. Lines that do
//! not parse are counted and skipped rather than failing the load.

use riskstream_core::{Error, Result, Vertical};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One labeled row of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    /// Path to the case document, relative to the dataset's directory
    #[serde(alias = "input")]
    pub input_ref: String,

    /// Ground truth: `true` for the positive (risky) class
    #[serde(alias = "label_fraud", deserialize_with = "deserialize_label")]
    pub label: bool,

    /// Optional grouping tag for per-domain reporting
    #[serde(default, alias = "region", skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Vertical to score the row under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<Vertical>,
}

impl LabeledRow {
    pub fn new(input_ref: impl Into<String>, label: bool) -> Self {
        Self {
            input_ref: input_ref.into(),
            label,
            domain: None,
            vertical: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_vertical(mut self, vertical: Vertical) -> Self {
        self.vertical = Some(vertical);
        self
    }
}

/// Accepts `true`/`false`, `0`/`1` and their string forms
fn deserialize_label<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Int(0) => Ok(false),
        Raw::Int(1) => Ok(true),
        Raw::Int(other) => Err(de::Error::custom(format!("label must be 0 or 1, got {other}"))),
        Raw::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            other => Err(de::Error::custom(format!("unrecognised label '{other}'"))),
        },
    }
}

/// Parse JSON Lines content, returning the parsed records and the number of
/// non-blank lines that failed to parse.
pub fn parse_jsonl<T: DeserializeOwned>(content: &str) -> (Vec<T>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping unparseable dataset line");
                skipped += 1;
            }
        }
    }

    (records, skipped)
}

/// Read a JSON Lines file. A missing or unreadable file is a dataset error.
pub async fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize)> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::dataset(format!("cannot read {}: {e}", path.display())))?;
    Ok(parse_jsonl(&content))
}

/// A loaded labeled dataset
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<LabeledRow>,
    base_dir: PathBuf,
    unparsed: usize,
}

impl Dataset {
    /// Build a dataset from rows whose references resolve against `base_dir`
    pub fn new(rows: Vec<LabeledRow>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            rows,
            base_dir: base_dir.into(),
            unparsed: 0,
        }
    }

    /// Parse JSON Lines content
    pub fn parse(content: &str, base_dir: impl Into<PathBuf>) -> Self {
        let (rows, unparsed) = parse_jsonl(content);
        Self {
            rows,
            base_dir: base_dir.into(),
            unparsed,
        }
    }

    /// Load a dataset file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (rows, unparsed) = read_jsonl(path).await?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        debug!(path = %path.display(), rows = rows.len(), unparsed, "Loaded dataset");
        Ok(Self {
            rows,
            base_dir,
            unparsed,
        })
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lines that could not be parsed into rows
    pub fn unparsed(&self) -> usize {
        self.unparsed
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute location of a row's case document
    pub fn resolve(&self, row: &LabeledRow) -> PathBuf {
        resolve_ref(&self.base_dir, &row.input_ref)
    }

    /// Keep only rows of one vertical. Rows without a vertical count as the
    /// default vertical.
    pub fn filter_vertical(mut self, vertical: Vertical) -> Self {
        self.rows
            .retain(|row| row.vertical.unwrap_or_default() == vertical);
        self
    }

    /// Keep at most `limit` rows, in file order
    pub fn limit(mut self, limit: usize) -> Self {
        self.rows.truncate(limit);
        self
    }
}

/// Resolve a dataset reference against a base directory
pub fn resolve_ref(base_dir: &Path, reference: &str) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
