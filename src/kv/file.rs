//! File-backed key-value store.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! ├── .lock                  # Advisory write lock
//! ├── entries.json           # One file per key
//! └── journalEntries.json
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed over
//! the target, so readers never observe a partial value.

use super::{validate_key, KeyValueStore};
use crate::constants::{LOCK_FILE_NAME, VALUE_FILE_EXTENSION};
use crate::errors::StorageError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Key-value store keeping one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    root: PathBuf,
}

/// Holds the exclusive advisory lock for the duration of a write.
struct WriteLock {
    file: File,
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release storage lock {:?}: {}", self.path, e);
        }
    }
}

impl FileKvStore {
    /// Opens a store rooted at `root`, creating the directory if necessary.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Write` if the directory cannot be created or secured.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        ensure_directory(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the stored values.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}{}", key, VALUE_FILE_EXTENSION)))
    }

    fn acquire_lock(&self, key: &str) -> Result<WriteLock, StorageError> {
        let path = self.root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| StorageError::Write {
                key: key.to_string(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(WriteLock { file, path }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(StorageError::Busy { path })
            }
            Err(source) => Err(StorageError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write_atomically(&self, key: &str, target: &Path, value: &str) -> io::Result<()> {
        let tmp_path = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(crate::constants::DEFAULT_FILE_PERMISSIONS);

        let result = options.open(&tmp_path).and_then(|mut file| {
            file.write_all(value.as_bytes())?;
            file.sync_all()
        });

        match result.and_then(|()| fs::rename(&tmp_path, target)) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }
}

impl KeyValueStore for FileKvStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let _lock = self.acquire_lock(key)?;

        self.write_atomically(key, &path, value)
            .map_err(|source| StorageError::Write {
                key: key.to_string(),
                source,
            })?;

        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let _lock = self.acquire_lock(key)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Creates `dir` (and parents) with owner-only permissions if it does not exist.
fn ensure_directory(dir: &Path) -> Result<(), StorageError> {
    if dir.exists() {
        return Ok(());
    }

    let to_error = |source: io::Error| StorageError::Write {
        key: dir.display().to_string(),
        source,
    };

    fs::create_dir_all(dir).map_err(to_error)?;

    #[cfg(unix)]
    {
        let permissions =
            fs::Permissions::from_mode(crate::constants::DEFAULT_DIR_PERMISSIONS);
        fs::set_permissions(dir, permissions).map_err(to_error)?;
        debug!("Set 0o700 permissions on {:?}", dir);
    }

    Ok(())
}
