//! File-backed slots.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temporary file in the
//! same directory and are renamed over the target, so a reader never sees a
//! half-written value. The directory is held with an exclusive `LOCK` file for
//! the lifetime of the backend.

use crate::error::{InventoryError, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::SlotBackend;

/// Slots stored as files under one directory.
pub struct FileSlots {
    /// Base directory.
    path: PathBuf,

    /// Lock file for exclusive access.
    _lock_file: File,
}

impl FileSlots {
    /// Open (creating if needed) a slot directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;

        let lock_file = Self::acquire_lock(&path)?;

        Ok(Self {
            path,
            _lock_file: lock_file,
        })
    }

    /// Base directory of this backend.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join("LOCK"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| InventoryError::Locked)?;

        Ok(lock_file)
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(InventoryError::Validation(format!(
                "invalid slot key: {:?}",
                key
            )));
        }
        Ok(self.path.join(format!("{}.json", key)))
    }
}

impl SlotBackend for FileSlots {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let slot_path = self.slot_path(key)?;
        match fs::read(&slot_path) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| InventoryError::Corruption(format!("slot {} is not UTF-8: {}", key, e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let slot_path = self.slot_path(key)?;

        let mut tmp = NamedTempFile::new_in(&self.path)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&slot_path).map_err(|e| InventoryError::Io(e.error))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let slot_path = self.slot_path(key)?;
        match fs::remove_file(&slot_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
