//! Lightweight session descriptor kept in the summary index.

use super::domain::CynefinDomain;
use super::model::Session;
use super::result::{AnalysisOutcome, CausalResult, clamp_unit};
use serde::{Deserialize, Serialize};

/// Causal figures inlined into the summary so list views never need the
/// full payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CausalDigest {
    pub effect: Option<f64>,
    pub refutations_passed: Option<u32>,
    pub refutations_total: Option<u32>,
}

impl CausalDigest {
    /// Extracts the digest from an analysis outcome. Non-causal outcomes
    /// produce an empty digest.
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        match outcome {
            AnalysisOutcome::Causal(causal) => Self {
                effect: causal.effect,
                refutations_passed: causal.refutations_passed,
                refutations_total: causal.refutations_total,
            },
            AnalysisOutcome::Bayesian(_)
            | AnalysisOutcome::Guardian(_)
            | AnalysisOutcome::Error { .. }
            | AnalysisOutcome::Absent => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.effect.is_none() && self.refutations_passed.is_none() && self.refutations_total.is_none()
    }

    /// Builds a partial causal result carrying only the digest figures.
    pub fn to_causal_result(&self) -> CausalResult {
        CausalResult {
            effect: self.effect,
            refutations_passed: self.refutations_passed,
            refutations_total: self.refutations_total,
            ..CausalResult::default()
        }
    }
}

/// Lightweight descriptor of one analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Unique session identifier (UUID format for sessions created here)
    pub id: String,
    /// The question the user asked
    pub query: String,
    pub domain: CynefinDomain,
    /// Classifier confidence in the range 0..=1
    pub confidence: f64,
    /// Key of the full result in the result blob map
    pub result_ref: String,
    /// Timestamp when the session completed (ISO 8601 format)
    pub timestamp: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub causal: CausalDigest,
}

impl SessionSummary {
    /// Derives the summary of a completed session.
    pub fn from_session(session: &Session) -> Self {
        let classification = &session.result.classification;
        Self {
            id: session.id.clone(),
            query: session.query.clone(),
            domain: classification.domain,
            confidence: clamp_unit(classification.confidence),
            result_ref: session.id.clone(),
            timestamp: session.timestamp.clone(),
            duration_ms: session.duration_ms,
            tags: session.tags.clone(),
            causal: CausalDigest::from_outcome(&session.result.outcome),
        }
    }
}
