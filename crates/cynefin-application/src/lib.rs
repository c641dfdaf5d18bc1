//! Application layer for cynefin.
//!
//! This crate coordinates the domain types in `cynefin-core` with the
//! persistence in `cynefin-infrastructure` to implement the bounded
//! session history and its export format.

pub mod export;
pub mod history;

pub use export::{HistorySnapshot, ImportReport};
pub use history::{HistoryStats, HistoryStore, LoadOutcome, SaveReport, SharedHistoryStore};
