//! Session history orchestration.
//!
//! `HistoryStore` joins the resident summary index with the persisted
//! result blob map and an in-memory result cache. `SharedHistoryStore` is
//! the same store behind a tokio lock for async hosts.

mod cache;
mod shared;
mod store;

pub use cache::ResultCache;
pub use shared::SharedHistoryStore;
pub use store::{HistoryStats, HistoryStore, LoadOutcome, SaveReport};
