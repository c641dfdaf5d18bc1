//! Storage layer: atomic file operations and the failure-absorbing backend adapter.

mod adapter;
mod atomic_file;

pub use adapter::{StorageAdapter, WriteOutcome};
pub use atomic_file::{AtomicTomlFile, FileLock, write_atomic};
