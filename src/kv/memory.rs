use super::{validate_key, KeyValueStore};
use crate::errors::StorageError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;

/// In-memory key-value store for testing.
///
/// Uses `RefCell` for interior mutability since the application is single-threaded.
/// Read and write failures can be simulated to exercise error handling.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    items: RefCell<HashMap<String, String>>,
    simulate_read_error: Cell<bool>,
    simulate_write_error: Cell<bool>,
    failing_key: RefCell<Option<String>>,
    writes: Cell<usize>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given items.
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        store.items.borrow_mut().extend(
            items
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        store
    }

    /// Enable read error simulation for testing degraded loads.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.set(simulate);
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Fail writes to `key` only; `None` clears it.
    pub fn set_failing_key(&self, key: Option<&str>) {
        *self.failing_key.borrow_mut() = key.map(str::to_string);
    }

    /// Number of successful `set_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Test helper returning the raw stored value.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn check_write(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let key_fails = self.failing_key.borrow().as_deref() == Some(key);
        if self.simulate_write_error.get() || key_fails {
            return Err(StorageError::Write {
                key: key.to_string(),
                source: io::Error::other("simulated write error"),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        if self.simulate_read_error.get() {
            return Err(StorageError::Read {
                key: key.to_string(),
                source: io::Error::other("simulated read error"),
            });
        }
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_write(key)?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_write(key)?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
