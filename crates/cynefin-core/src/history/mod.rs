//! History domain module.
//!
//! Capacity configuration, the pure summary-index operations and the
//! list filter. Persistence lives in `cynefin-infrastructure`; orchestration
//! in `cynefin-application`.

mod config;
mod filter;
pub mod index;

pub use config::{DEFAULT_CAP, DEFAULT_INDEX_KEY, DEFAULT_RESULTS_KEY, HistoryConfig};
pub use filter::HistoryFilter;
