//! JSON codec for persisted history blobs.
//!
//! Every serialization concern of the store goes through here. Neither
//! direction ever returns an error: encoding failures become `None` and
//! decoding failures become the caller's fallback, each logged once.

use serde::{Serialize, de::DeserializeOwned};

/// Stateless JSON codec.
pub struct JsonCodec;

impl JsonCodec {
    /// Serializes `value` to compact JSON.
    ///
    /// Returns `None` (and logs a warning) if serialization fails; callers
    /// treat that as a skipped write.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Option<String> {
        match serde_json::to_string(value) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!("Failed to encode history blob: {}", e);
                None
            }
        }
    }

    /// Serializes `value` to indented JSON, for documents meant to leave
    /// the process.
    pub fn encode_pretty<T: Serialize + ?Sized>(value: &T) -> Option<String> {
        match serde_json::to_string_pretty(value) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!("Failed to encode history document: {}", e);
                None
            }
        }
    }

    /// Deserializes `raw`, returning `fallback` when the input is absent or
    /// does not parse.
    pub fn decode<T: DeserializeOwned>(raw: Option<&str>, fallback: T) -> T {
        let Some(raw) = raw else {
            return fallback;
        };
        match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to decode history blob, using fallback: {}", e);
                fallback
            }
        }
    }

    /// Deserializes `raw` without logging. The caller reports the failure.
    pub fn try_decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
        serde_json::from_str(raw).ok()
    }
}
