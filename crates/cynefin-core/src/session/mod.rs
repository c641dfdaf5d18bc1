//! Session domain module.
//!
//! This module contains the session-related domain models.
//!
//! # Module Structure
//!
//! - `domain`: Cynefin domain classification (`CynefinDomain`)
//! - `result`: Heavyweight result payload (`FullResult`, `AnalysisOutcome`)
//! - `summary`: Lightweight index entry (`SessionSummary`, `CausalDigest`)
//! - `model`: Reconstructed session view (`Session`, `DetailState`)

mod domain;
mod model;
mod result;
mod summary;

// Re-export public API
pub use domain::CynefinDomain;
pub use model::{DetailState, Session};
pub use result::{
    AnalysisOutcome, BayesianBelief, CausalResult, ClassificationDetail, FullResult,
    GuardianDecision, GuardianVerdict, Hypothesis,
};
pub use summary::{CausalDigest, SessionSummary};
