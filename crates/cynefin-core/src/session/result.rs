//! Full analysis result payload.
//!
//! This is the heavyweight half of a session. It is persisted separately
//! from the summary index and only loaded when a consumer asks for detail.

use super::domain::CynefinDomain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the router classified the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClassificationDetail {
    pub domain: CynefinDomain,
    /// Classifier confidence in the range 0..=1
    pub confidence: f64,
    /// Shannon entropy of the domain distribution, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Per-domain scores keyed by domain name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, f64>,
}

/// Output of the causal inference engine.
///
/// Fields are optional because a result rebuilt from a summary digest only
/// knows the effect and refutation counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CausalResult {
    #[serde(default)]
    pub effect: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<(f64, f64)>,
    #[serde(default)]
    pub refutations_passed: Option<u32>,
    #[serde(default)]
    pub refutations_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// A single competing hypothesis in a Bayesian belief state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub label: String,
    pub probability: f64,
}

/// Belief state produced for complex-domain sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BayesianBelief {
    pub posterior_mean: f64,
    /// Epistemic uncertainty in the range 0..=1
    pub uncertainty: f64,
    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardianVerdict {
    Approved,
    Rejected,
    Escalated,
}

/// Policy decision taken by the guardian layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianDecision {
    pub verdict: GuardianVerdict,
    #[serde(default)]
    pub violated_policies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The primary outcome of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Causal(CausalResult),
    Bayesian(BayesianBelief),
    Guardian(GuardianDecision),
    Error { message: String },
    #[default]
    Absent,
}

/// The complete payload of one analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FullResult {
    pub classification: ClassificationDetail,
    #[serde(default)]
    pub outcome: AnalysisOutcome,
    #[serde(default)]
    pub narrative: String,
}

impl FullResult {
    /// Builds a result with no narrative. Non-finite numbers are sanitized,
    /// see [`FullResult::sanitized`].
    pub fn new(domain: CynefinDomain, confidence: f64, outcome: AnalysisOutcome) -> Self {
        Self {
            classification: ClassificationDetail {
                domain,
                confidence,
                ..ClassificationDetail::default()
            },
            outcome,
            narrative: String::new(),
        }
        .sanitized()
    }

    /// Replaces every NaN or infinite number with a value JSON can carry.
    ///
    /// Probabilities are clamped to 0..=1 (NaN becomes 0). Optional numbers
    /// and intervals with a non-finite bound become `None`, non-finite
    /// scores are dropped and a non-finite posterior mean becomes 0.
    pub fn sanitized(mut self) -> Self {
        let classification = &mut self.classification;
        classification.confidence = clamp_unit(classification.confidence);
        classification.entropy = classification.entropy.filter(|e| e.is_finite());
        classification.scores.retain(|_, score| score.is_finite());

        match &mut self.outcome {
            AnalysisOutcome::Causal(causal) => {
                causal.effect = causal.effect.filter(|e| e.is_finite());
                causal.confidence_interval = causal
                    .confidence_interval
                    .filter(|(low, high)| low.is_finite() && high.is_finite());
            }
            AnalysisOutcome::Bayesian(belief) => {
                if !belief.posterior_mean.is_finite() {
                    belief.posterior_mean = 0.0;
                }
                belief.uncertainty = clamp_unit(belief.uncertainty);
                for hypothesis in &mut belief.hypotheses {
                    hypothesis.probability = clamp_unit(hypothesis.probability);
                }
            }
            AnalysisOutcome::Guardian(_)
            | AnalysisOutcome::Error { .. }
            | AnalysisOutcome::Absent => {}
        }
        self
    }

    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        self.narrative = narrative.into();
        self
    }

    pub fn causal(&self) -> Option<&CausalResult> {
        match &self.outcome {
            AnalysisOutcome::Causal(causal) => Some(causal),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            AnalysisOutcome::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Clamps `value` to 0..=1, mapping NaN to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
