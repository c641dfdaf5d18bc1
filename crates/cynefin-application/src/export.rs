//! Export and import of the whole history as one JSON document.
//!
//! The document goes through the same codec as the persisted blobs, so an
//! exported snapshot always imports back.

use crate::history::HistoryStore;
use cynefin_core::CynefinError;
use cynefin_core::error::Result;
use cynefin_core::session::Session;
use cynefin_infrastructure::JsonCodec;
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the history, newest session first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// When the snapshot was taken (RFC 3339)
    pub exported_at: String,
    pub total_sessions: usize,
    pub sessions: Vec<Session>,
}

impl HistorySnapshot {
    /// Captures every session with the most detailed result available.
    ///
    /// Read-only: the store's cache is not populated.
    pub fn capture(store: &HistoryStore) -> Self {
        let sessions = store.detailed_sessions();
        Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            total_sessions: sessions.len(),
            sessions,
        }
    }

    /// Encodes the snapshot as indented JSON.
    pub fn to_json(&self) -> Option<String> {
        JsonCodec::encode_pretty(self)
    }

    /// Parses an exported document.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `raw` is not a snapshot.
    pub fn from_json(raw: &str) -> Result<Self> {
        JsonCodec::try_decode(raw).ok_or_else(|| CynefinError::Serialization {
            format: "JSON".to_string(),
            message: "document is not a history snapshot".to_string(),
        })
    }
}

/// Counts from `HistoryStore::import`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Sessions without an id.
    pub skipped: usize,
    /// Imported sessions whose result only reached the in-memory cache.
    pub unpersisted: usize,
}

impl HistoryStore {
    /// Saves every session of `snapshot`, oldest first, so the snapshot's
    /// order becomes the history's order.
    ///
    /// Sessions already in the history are replaced. With a cap smaller
    /// than the snapshot, only the newest sessions remain.
    pub fn import(&mut self, snapshot: &HistorySnapshot) -> ImportReport {
        if snapshot.total_sessions != snapshot.sessions.len() {
            tracing::warn!(
                "Snapshot declares {} sessions but contains {}",
                snapshot.total_sessions,
                snapshot.sessions.len()
            );
        }

        let mut report = ImportReport::default();
        for session in snapshot.sessions.iter().rev() {
            if session.id.trim().is_empty() {
                tracing::warn!("Skipping snapshot session without id: {:?}", session.query);
                report.skipped += 1;
                continue;
            }

            let saved = self.save(session);
            report.imported += 1;
            if !saved.results.is_persisted() {
                report.unpersisted += 1;
            }
        }

        tracing::info!(
            "Imported {} sessions from snapshot taken at {}",
            report.imported,
            snapshot.exported_at
        );
        report
    }
}
