//! Key-value backend trait.
//!
//! Defines the interface the history store persists through.

use crate::error::Result;

/// A synchronous, quota-limited, string-keyed store.
///
/// This trait decouples the history store from the storage medium (a
/// directory of files, an in-process map, a browser-style local storage
/// bridge, ...). Implementations report failures as errors; the history
/// store's adapter layer absorbs them.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Return `CynefinError::QuotaExceeded` when a write would exceed the
///   medium's size budget, leaving the previous value in place
/// - Make each `set` atomic: a reader sees either the old or the new value
/// - Treat `remove` of an absent key as success
pub trait KeyValueBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Key present
    /// - `Ok(None)`: Key absent
    /// - `Err(_)`: The medium could not be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Value stored
    /// - `Err(CynefinError::QuotaExceeded { .. })`: Value too large for the remaining budget
    /// - `Err(_)`: Any other write failure
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
