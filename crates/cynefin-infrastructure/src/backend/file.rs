//! Directory-backed key-value backend.

use crate::storage::{FileLock, write_atomic};
use cynefin_core::error::Result;
use cynefin_core::{CynefinError, KeyValueBackend};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const VALUE_EXTENSION: &str = "json";

/// A `KeyValueBackend` storing one file per key.
///
/// ```text
/// base_dir/
/// ├── cynefin.history.index.json
/// ├── cynefin.history.results.json
/// └── backend.lock              # present only while a write is in flight
/// ```
///
/// Writes are atomic (tmp file + rename) and serialized through an
/// exclusive lock file, so two processes sharing the directory never tear a
/// value. They can still overwrite each other's read-modify-write cycles.
pub struct FileBackend {
    base_dir: PathBuf,
    quota_bytes: Option<usize>,
}

impl FileBackend {
    /// Creates a backend rooted at `base_dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            quota_bytes: None,
        })
    }

    /// Limits the total size of all stored values, in bytes.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the file path for a given key.
    ///
    /// Lowercase ASCII letters, digits, `.` and `-` are kept. Every other
    /// byte, `_` and uppercase letters included, becomes `_XX` (hex), so
    /// distinct keys never share a file, even on case-insensitive
    /// filesystems.
    fn value_path(&self, key: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", encode_key(key), VALUE_EXTENSION))
    }

    /// Sum of the sizes of all value files except `exclude`.
    fn used_bytes_except(&self, exclude: &Path) -> Result<usize> {
        let mut total = 0usize;
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path == exclude
                || path.extension().and_then(|s| s.to_str()) != Some(VALUE_EXTENSION)
            {
                continue;
            }
            total += fs::metadata(&path)?.len() as usize;
        }
        Ok(total)
    }
}

fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || matches!(byte, b'.' | b'-') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("_{:02X}", byte));
        }
    }
    encoded
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.value_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.value_path(key);
        let _lock = FileLock::acquire(&self.base_dir.join("backend"))?;

        if let Some(limit) = self.quota_bytes {
            let attempted = self.used_bytes_except(&path)? + value.len();
            if attempted > limit {
                return Err(CynefinError::quota_exceeded(key, attempted, limit));
            }
        }

        write_atomic(&path, value.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
