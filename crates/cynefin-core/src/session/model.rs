//! Session domain model.
//!
//! A `Session` is never persisted as a whole. It is either handed to the
//! history store by the analysis pipeline, or reconstructed by joining a
//! `SessionSummary` with its `FullResult` (or a placeholder).

use super::result::{AnalysisOutcome, ClassificationDetail, FullResult};
use super::summary::SessionSummary;
use serde::{Deserialize, Serialize};

/// Whether a reconstructed session carries the real result payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetailState {
    /// The full result is the one that was saved.
    #[default]
    Loaded,
    /// The result was synthesized from the summary digest.
    Placeholder,
}

/// One completed analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    pub query: String,
    /// Timestamp when the session completed (ISO 8601 format)
    pub timestamp: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub result: FullResult,
    #[serde(default)]
    pub detail: DetailState,
}

impl Session {
    /// Creates a session with a fresh id, stamped with the current time.
    pub fn new(query: impl Into<String>, result: FullResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            duration_ms: 0,
            tags: Vec::new(),
            result,
            detail: DetailState::Loaded,
        }
    }

    /// Joins a summary with the full result it references.
    pub fn from_parts(summary: &SessionSummary, result: FullResult) -> Self {
        Self {
            id: summary.id.clone(),
            query: summary.query.clone(),
            timestamp: summary.timestamp.clone(),
            duration_ms: summary.duration_ms,
            tags: summary.tags.clone(),
            result,
            detail: DetailState::Loaded,
        }
    }

    /// Reconstructs a session from its summary alone.
    ///
    /// The result carries the classification and, when the digest holds any
    /// causal figures, a partial causal outcome. Everything else is absent.
    pub fn placeholder(summary: &SessionSummary) -> Self {
        let outcome = if summary.causal.is_empty() {
            AnalysisOutcome::Absent
        } else {
            AnalysisOutcome::Causal(summary.causal.to_causal_result())
        };

        let result = FullResult {
            classification: ClassificationDetail {
                domain: summary.domain,
                confidence: summary.confidence,
                ..ClassificationDetail::default()
            },
            outcome,
            narrative: String::new(),
        };

        Self {
            detail: DetailState::Placeholder,
            ..Self::from_parts(summary, result)
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.detail == DetailState::Placeholder
    }
}
