//! Key-value persistence.
//!
//! Everything Whisper Journal persists goes through the [`KeyValueStore`] trait:
//! string keys mapped to JSON string values. The trait handles the "how" of storage
//! (filesystem vs memory), while the entry store and session guard decide the "what".
//!
//! ## Implementations
//!
//! - [`FileKvStore`]: one `<key>.json` file per key in a directory, written atomically
//!   under an exclusive advisory lock.
//! - [`MemoryKvStore`]: for testing logic without filesystem I/O.

use crate::errors::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod file;
pub mod memory;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;

/// Abstract interface for string key-value storage.
///
/// All methods take `&self`; implementations that need mutation use interior
/// mutability since the application is single-threaded.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    /// Returns Ok(None) if nothing is stored.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    /// Completion signals durability.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// Read and deserialize the JSON value stored under `key`.
pub fn read_json<T, K>(store: &K, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    K: KeyValueStore + ?Sized,
{
    match store.get_item(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
    }
}

/// Serialize `value` as JSON and store it under `key`.
pub fn write_json<T, K>(store: &K, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    K: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set_item(key, &raw)
}

/// Checks that a key can be used as a file name on every platform.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
