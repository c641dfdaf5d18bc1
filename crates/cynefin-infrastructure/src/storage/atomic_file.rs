//! Atomic file operations.
//!
//! Writes go to a hidden temporary file in the target directory, are
//! fsynced, then renamed over the target. Readers see either the old or the
//! new contents, never a torn file.

use cynefin_core::CynefinError;
use cynefin_core::error::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Writes `contents` to `path` atomically via tmp file + rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path)?;
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(contents)?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| CynefinError::io(format!("Path has no parent directory: {:?}", path)))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| CynefinError::io(format!("Path has no file name: {:?}", path)))?;

    Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// A handle to a TOML file that is always replaced atomically.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Serializes `data` and replaces the file atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        let toml_string = toml::to_string_pretty(data)?;
        write_atomic(&self.path, toml_string.as_bytes())
    }

    /// Read-modify-write under an exclusive lock.
    ///
    /// `default_value` is used when the file doesn't exist yet.
    pub fn update<F>(&self, default_value: T, f: F) -> Result<()>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        f(&mut data)?;
        self.save(&data)
    }
}

/// An exclusive lock on `<path>.lock`, released on drop.
pub struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| CynefinError::io(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock happens when the handle closes; the lock file is best effort
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Limits {
        cap: usize,
        label: String,
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blob.json");

        write_atomic(&path, b"[1,2,3]").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[1,2,3]");
        assert!(!temp_dir.path().join(".blob.json.tmp").exists());
    }

    #[test]
    fn test_write_atomic_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("deeper").join("blob.json");

        write_atomic(&path, b"{}").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_toml_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Limits>::new(temp_dir.path().join("limits.toml"));

        assert!(file.load().unwrap().is_none());

        let limits = Limits {
            cap: 20,
            label: "small".to_string(),
        };
        file.save(&limits).unwrap();

        assert_eq!(file.load().unwrap(), Some(limits));
    }

    #[test]
    fn test_toml_update() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Limits>::new(temp_dir.path().join("limits.toml"));
        let default_limits = Limits {
            cap: 50,
            label: "default".to_string(),
        };

        file.update(default_limits.clone(), |limits| {
            limits.cap -= 10;
            Ok(())
        })
        .unwrap();
        file.update(default_limits, |limits| {
            limits.cap -= 10;
            Ok(())
        })
        .unwrap();

        assert_eq!(file.load().unwrap().unwrap().cap, 30);
        assert!(!temp_dir.path().join("limits.lock").exists());
    }

    #[test]
    fn test_toml_load_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("limits.toml");
        fs::write(&path, "cap = [").unwrap();

        let err = AtomicTomlFile::<Limits>::new(path).load().unwrap_err();
        assert!(err.is_serialization());
    }
}
