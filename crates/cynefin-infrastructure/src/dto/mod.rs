//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema of the summary index blob.
//! They are private to the infrastructure layer and handle the evolution
//! of the storage format over time.
//!
//! ## Schema Versioning (Semantic Versioning)
//!
//! - **MAJOR (X.0.0)**: Breaking changes (field removal, type changes)
//! - **MINOR (1.X.0)**: Backward-compatible additions
//!
//! ### SessionSummary Version History
//! - **1.0.0**: Initial schema, results stored alongside the summary
//! - **1.1.0**: Added `result_ref` and the inlined causal digest
//!
//! Entries are written in the flat format (`"version"` next to the
//! fields) through `create_session_summary_migrator`. Entries with no
//! `"version"` field predate tagging and are read as 1.0.0.
//!
//! The result blob map stores `FullResult` values directly; its shape is
//! owned by the domain crate.

mod summary;

pub use summary::{
    SESSION_SUMMARY_ENTITY, SessionSummaryDTO, SessionSummaryV1_0_0, SessionSummaryV1_1_0,
    create_session_summary_migrator,
};

/// Current schema version of summary index entries.
pub const SESSION_SUMMARY_VERSION: &str = "1.1.0";
