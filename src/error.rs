//! Error types for the scoring core.
//!
//! The core is defensive: missing optional inputs degrade to documented
//! defaults and never raise. The only true errors are malformed invariants
//! from upstream, values a well-behaved data source cannot produce. Those
//! are surfaced instead of silently coerced, since clamping here would mask
//! data-quality bugs at the source.

use thiserror::Error;

/// A malformed invariant in upstream data.
#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid deal stage: {0}")]
    InvalidStage(String),

    #[error("MEDDIC {pillar} score {score} outside 0-10")]
    MeddicScoreOutOfRange { pillar: &'static str, score: u8 },

    #[error("unknown deal referenced: {0}")]
    DealNotFound(String),

    #[error("unknown lead referenced: {0}")]
    LeadNotFound(String),

    #[error("stage transition out of terminal stage {0}")]
    TerminalStage(String),

    #[error("seed file error: {0}")]
    Seed(String),
}
