//! riskstream core
//!
//! Core types and error handling shared across the riskstream crates.
//!
//! This crate provides:
//! - The error taxonomy and `Result` alias
//! - Risk factor and score result types
//! - Case payloads and the tagged signal result contract
//! - Factor, vertical and risk level vocabularies

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    AssetKind, Case, CaseAsset, Decision, FactorKind, FactorSignal, RiskFactor, RiskLevel,
    ScoreResult, Severity, SignalFlag, SignalResult, SignalStatus, SourceReport, Vertical,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        Case, Decision, FactorKind, FactorSignal, RiskFactor, RiskLevel, ScoreResult, SignalFlag,
        SignalResult, SignalStatus, Vertical,
    };
}
