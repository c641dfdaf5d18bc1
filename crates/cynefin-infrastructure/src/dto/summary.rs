//! SessionSummary DTOs and migrations

use cynefin_core::error::Result;
use cynefin_core::session::{CausalDigest, CynefinDomain, SessionSummary};
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Migrator, Versioned};

/// Entity name of summary index entries in the migrator.
pub const SESSION_SUMMARY_ENTITY: &str = "session_summary";

/// V1.0.0: summary entry written before results were split into their
/// own blob. No `result_ref`, no causal digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct SessionSummaryV1_0_0 {
    pub id: String,
    pub query: String,
    pub domain: CynefinDomain,
    pub confidence: f64,
    /// Timestamp when the session completed (ISO 8601 format)
    pub timestamp: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// V1.1.0: added `result_ref` and the inlined causal digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
pub struct SessionSummaryV1_1_0 {
    pub id: String,
    pub query: String,
    pub domain: CynefinDomain,
    pub confidence: f64,
    pub result_ref: String,
    /// Timestamp when the session completed (ISO 8601 format)
    pub timestamp: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub causal: CausalDigest,
}

/// Type alias for the latest SessionSummary version.
pub type SessionSummaryDTO = SessionSummaryV1_1_0;

// ============================================================================
// Migration implementations
// ============================================================================

/// V1.0.0 results were keyed by session id, so `result_ref` is the id.
/// The digest is unknown and stays empty.
impl MigratesTo<SessionSummaryV1_1_0> for SessionSummaryV1_0_0 {
    fn migrate(self) -> SessionSummaryV1_1_0 {
        SessionSummaryV1_1_0 {
            result_ref: self.id.clone(),
            id: self.id,
            query: self.query,
            domain: self.domain,
            confidence: self.confidence,
            timestamp: self.timestamp,
            duration_ms: self.duration_ms,
            tags: self.tags,
            causal: CausalDigest::default(),
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl IntoDomain<SessionSummary> for SessionSummaryV1_1_0 {
    fn into_domain(self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            query: self.query,
            domain: self.domain,
            confidence: self.confidence,
            result_ref: self.result_ref,
            timestamp: self.timestamp,
            duration_ms: self.duration_ms,
            tags: self.tags,
            causal: self.causal,
        }
    }
}

impl FromDomain<SessionSummary> for SessionSummaryV1_1_0 {
    fn from_domain(summary: SessionSummary) -> Self {
        SessionSummaryV1_1_0 {
            id: summary.id,
            query: summary.query,
            domain: summary.domain,
            confidence: summary.confidence,
            result_ref: summary.result_ref,
            timestamp: summary.timestamp,
            duration_ms: summary.duration_ms,
            tags: summary.tags,
            causal: summary.causal,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates a Migrator for summary index entries.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: `result_ref` becomes the id, empty causal digest
/// - V1.1.0 → SessionSummary: Converts DTO to domain model (and back on save)
///
/// # Example
///
/// ```ignore
/// let migrator = create_session_summary_migrator()?;
/// let summary: SessionSummary = migrator.load_flat_from(SESSION_SUMMARY_ENTITY, json_value)?;
/// ```
pub fn create_session_summary_migrator() -> Result<Migrator> {
    let mut migrator = Migrator::builder().build();

    let summary_path = Migrator::define(SESSION_SUMMARY_ENTITY)
        .from::<SessionSummaryV1_0_0>()
        .step::<SessionSummaryV1_1_0>()
        .into_with_save::<SessionSummary>();

    migrator.register(summary_path)?;

    Ok(migrator)
}
