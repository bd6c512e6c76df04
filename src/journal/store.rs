//! The entry store: the single owner of persisted journal entries.
//!
//! The store keeps the newest-first entry list in memory and mirrors it to a
//! [`KeyValueStore`]. It is read once at start-up with [`EntryStore::load`] and the
//! full collection is rewritten on every mutation, which is O(n) in the number of
//! entries per write.
//!
//! ## Failure semantics
//!
//! - Loading never fails: unreadable data is logged and the store starts empty.
//!   A raw copy of an unparseable collection is saved under `<key>.corrupt` first
//!   so that the next rewrite cannot destroy it.
//! - Mutations persist before committing. If the write fails the error is returned
//!   and the in-memory list still equals the last durable state.
//!
//! ## Legacy collection
//!
//! Earlier releases wrote entries under a second key. On the first load that finds
//! it, the legacy entries are merged in (primary wins on id conflicts), the merged
//! collection is written to the primary key and a marker key records the migration.
//! Later loads ignore the legacy key. The legacy collection itself is never
//! extended, but `delete` still removes ids from it so a re-run migration cannot
//! resurrect a deleted entry.

use super::entry::{Entry, EntryKind, EntryPatch};
use super::merge::{dedup_by_id, merge_collections, order_newest_first};
use crate::constants::{
    CORRUPT_SUFFIX, ENTRIES_KEY, FLAG_TRUE, LEGACY_ENTRIES_KEY, LEGACY_MIGRATED_KEY,
};
use crate::errors::{AppResult, EntryError, StorageError};
use crate::kv::{read_json, write_json, KeyValueStore};
use chrono::{DateTime, TimeZone};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Storage keys used by an [`EntryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub primary: String,
    pub legacy: String,
    pub migration_marker: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            primary: ENTRIES_KEY.to_string(),
            legacy: LEGACY_ENTRIES_KEY.to_string(),
            migration_marker: LEGACY_MIGRATED_KEY.to_string(),
        }
    }
}

/// Summary of what [`EntryStore::load`] found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries visible after loading.
    pub loaded: usize,
    /// Entries that came from the legacy collection during this load.
    pub migrated_from_legacy: usize,
    /// Records that could not be decoded and were skipped.
    pub skipped_records: usize,
    /// True when stored data could not be read or parsed.
    pub degraded: bool,
}

/// Outcome of reading one collection leniently.
enum Collection {
    Absent,
    Loaded(Vec<Entry>),
    /// Read failed, or parsing failed and no backup could be made.
    Unreadable,
}

/// In-memory, newest-first journal entries backed by a key-value store.
pub struct EntryStore<K: KeyValueStore> {
    backend: K,
    keys: StoreKeys,
    entries: Vec<Entry>,
}

impl<K: KeyValueStore> EntryStore<K> {
    /// Creates a store over `backend` and loads it.
    pub fn open(backend: K) -> Self {
        let mut store = Self::with_keys(backend, StoreKeys::default());
        store.load();
        store
    }

    /// Creates an empty, unloaded store using custom keys.
    pub fn with_keys(backend: K, keys: StoreKeys) -> Self {
        Self {
            backend,
            keys,
            entries: Vec::new(),
        }
    }

    /// Reads the persisted collections, replacing the in-memory list.
    ///
    /// Never fails; problems are logged and reflected in the returned report.
    pub fn load(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        let primary_key = self.keys.primary.clone();
        let primary = self.read_collection(&primary_key, &mut report);
        let primary_writable = !matches!(primary, Collection::Unreadable);
        let mut entries = match primary {
            Collection::Loaded(entries) => dedup_by_id(entries),
            Collection::Absent | Collection::Unreadable => Vec::new(),
        };

        if primary_writable && !self.legacy_migrated() {
            let legacy_key = self.keys.legacy.clone();
            if let Collection::Loaded(legacy) = self.read_collection(&legacy_key, &mut report) {
                let before = entries.len();
                entries = merge_collections(entries, legacy);
                report.migrated_from_legacy = entries.len() - before;
                entries = order_newest_first(entries);
                self.finish_migration(&entries, report.migrated_from_legacy);
            }
        }

        self.entries = order_newest_first(entries);
        report.loaded = self.entries.len();
        debug!(
            "Loaded {} entries ({} from legacy, {} skipped)",
            report.loaded, report.migrated_from_legacy, report.skipped_records
        );
        report
    }

    /// Entries newest first.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Entries of one kind, newest first.
    pub fn of_kind(&self, kind: EntryKind) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    /// Entries matching `query` (case-insensitive), newest first.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|entry| entry.matches(query))
            .collect()
    }

    /// A fresh timestamp-derived id for an entry created at `at`.
    ///
    /// Uses milliseconds since the epoch, bumped past any id already in use.
    pub fn next_id<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> String {
        let mut millis = at.timestamp_millis();
        while self.contains(&millis.to_string()) {
            millis += 1;
        }
        millis.to_string()
    }

    /// Adds a new entry and persists the collection.
    ///
    /// # Errors
    ///
    /// - `EntryError::Invalid` if the id is empty
    /// - `EntryError::DuplicateId` if the id is already in use
    /// - `StorageError` if persisting fails; the entry is then not added
    pub fn add(&mut self, entry: Entry) -> AppResult<()> {
        if entry.id.trim().is_empty() {
            return Err(EntryError::Invalid("Entry id must not be empty".to_string()).into());
        }
        if self.contains(&entry.id) {
            return Err(EntryError::DuplicateId(entry.id).into());
        }

        let id = entry.id.clone();
        let mut next = Vec::with_capacity(self.entries.len() + 1);
        next.push(entry);
        next.extend(self.entries.iter().cloned());
        let next = order_newest_first(next);

        self.persist(&next)?;
        self.entries = next;

        info!("Added entry {}", id);
        Ok(())
    }

    /// Merges `patch` into the entry with `id` and persists.
    ///
    /// Returns `Ok(false)` without touching storage when no such entry exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if persisting fails; the entry is then restored.
    pub fn update(&mut self, id: &str, patch: &EntryPatch) -> AppResult<bool> {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            debug!("Update ignored, no entry {}", id);
            return Ok(false);
        };

        let previous = self.entries[index].clone();
        self.entries[index].apply(patch);

        if let Err(e) = self.persist(&self.entries) {
            self.entries[index] = previous;
            return Err(e.into());
        }

        info!("Updated entry {}", id);
        Ok(true)
    }

    /// Removes the entry with `id` from the primary and legacy collections.
    ///
    /// The legacy collection is rewritten first, then the primary one. Returns
    /// `Ok(false)` when neither collection contains the id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if persisting either collection fails. The entry is
    /// then kept in memory and the legacy collection is put back, so the delete
    /// either happens everywhere or is reported as failed.
    pub fn delete(&mut self, id: &str) -> AppResult<bool> {
        let legacy_before = self.remove_from_legacy(id)?;

        let mut removed = legacy_before.is_some();
        if let Some(index) = self.entries.iter().position(|entry| entry.id == id) {
            let entry = self.entries.remove(index);
            if let Err(e) = self.persist(&self.entries) {
                self.entries.insert(index, entry);
                if let Some(records) = legacy_before {
                    if let Err(restore) = write_json(&self.backend, &self.keys.legacy, &records) {
                        warn!("Could not restore legacy entries after failed delete: {}", restore);
                    }
                }
                return Err(e.into());
            }
            removed = true;
        }

        if removed {
            info!("Deleted entry {}", id);
        } else {
            debug!("Delete ignored, no entry {}", id);
        }
        Ok(removed)
    }

    /// The underlying key-value store.
    pub fn backend(&self) -> &K {
        &self.backend
    }

    /// Tears the store down, returning its backend.
    pub fn into_backend(self) -> K {
        self.backend
    }

    fn persist(&self, entries: &[Entry]) -> Result<(), StorageError> {
        write_json(&self.backend, &self.keys.primary, entries)
    }

    fn legacy_migrated(&self) -> bool {
        match self.backend.get_item(&self.keys.migration_marker) {
            Ok(flag) => flag.as_deref() == Some(FLAG_TRUE),
            Err(e) => {
                warn!("Could not read legacy migration marker: {}", e);
                false
            }
        }
    }

    fn finish_migration(&self, merged: &[Entry], migrated: usize) {
        if let Err(e) = self.persist(merged) {
            warn!("Legacy merge not persisted, will retry on next load: {}", e);
            return;
        }
        if let Err(e) = self
            .backend
            .set_item(&self.keys.migration_marker, FLAG_TRUE)
        {
            warn!("Legacy migration marker not written: {}", e);
            return;
        }
        info!("Migrated {} entries from legacy storage", migrated);
    }

    fn read_collection(&self, key: &str, report: &mut LoadReport) -> Collection {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Collection::Absent,
            Err(e) => {
                warn!("Could not read '{}', starting empty: {}", key, e);
                report.degraded = true;
                return Collection::Unreadable;
            }
        };

        let values: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(source) => {
                let error = StorageError::Corrupt {
                    key: key.to_string(),
                    source,
                };
                warn!("{}", error);
                report.degraded = true;
                return if self.preserve_raw(key, &raw) {
                    Collection::Loaded(Vec::new())
                } else {
                    Collection::Unreadable
                };
            }
        };

        let total = values.len();
        let entries: Vec<Entry> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Entry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping undecodable record in '{}': {}", key, e);
                    None
                }
            })
            .collect();

        let skipped = total - entries.len();
        if skipped > 0 {
            report.skipped_records += skipped;
            report.degraded = true;
            if !self.preserve_raw(key, &raw) {
                return Collection::Unreadable;
            }
        }

        Collection::Loaded(entries)
    }

    /// Saves `raw` under `<key>.corrupt`. Returns false if that failed.
    fn preserve_raw(&self, key: &str, raw: &str) -> bool {
        let backup_key = format!("{}{}", key, CORRUPT_SUFFIX);
        match self.backend.set_item(&backup_key, raw) {
            Ok(()) => {
                info!("Saved unreadable '{}' data under '{}'", key, backup_key);
                true
            }
            Err(e) => {
                warn!("Could not back up unreadable '{}': {}", key, e);
                false
            }
        }
    }

    /// Drops `id` from the legacy collection, keeping every other record verbatim.
    ///
    /// Returns the records as they were before the rewrite, or `None` when nothing
    /// was removed.
    fn remove_from_legacy(&self, id: &str) -> Result<Option<Vec<Value>>, StorageError> {
        let records = match read_json::<Vec<Value>, _>(&self.backend, &self.keys.legacy) {
            Ok(Some(records)) => records,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("Legacy entries unreadable, leaving them untouched: {}", e);
                return Ok(None);
            }
        };

        let kept: Vec<Value> = records
            .iter()
            .filter(|record| record.get("id").and_then(Value::as_str) != Some(id))
            .cloned()
            .collect();

        if kept.len() == records.len() {
            return Ok(None);
        }

        write_json(&self.backend, &self.keys.legacy, &kept)?;
        debug!("Removed {} from legacy entries", id);
        Ok(Some(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    fn at(millis: i64) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_millis_opt(millis)
            .unwrap()
    }

    fn text_entry(id: &str, title: &str) -> Entry {
        Entry::text(id, Some(title.to_string()), "body", &at(0))
    }

    fn stored_ids(backend: &MemoryKvStore, key: &str) -> Vec<String> {
        let raw = backend.raw(key).unwrap_or_else(|| "[]".to_string());
        let values: Vec<Value> = serde_json::from_str(&raw).unwrap();
        values
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_open_empty_backend() {
        let store = EntryStore::open(MemoryKvStore::new());
        assert!(store.is_empty());
        assert_eq!(store.backend().write_count(), 0);
    }

    #[test]
    fn test_add_prepends_and_persists() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("100", "first")).unwrap();
        store.add(text_entry("200", "second")).unwrap();

        let ids: Vec<&str> = store.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["200", "100"]);
        assert_eq!(stored_ids(store.backend(), ENTRIES_KEY), vec!["200", "100"]);
    }

    #[test]
    fn test_add_rejects_duplicate_and_empty_ids() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("1", "a")).unwrap();

        assert!(matches!(
            store.add(text_entry("1", "b")),
            Err(crate::errors::AppError::Entry(EntryError::DuplicateId(_)))
        ));
        assert!(matches!(
            store.add(text_entry(" ", "c")),
            Err(crate::errors::AppError::Entry(EntryError::Invalid(_)))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_write_failure_leaves_memory_unchanged() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("1", "kept")).unwrap();

        store.backend().set_simulate_write_error(true);
        let result = store.add(text_entry("2", "lost"));

        assert!(matches!(
            result,
            Err(crate::errors::AppError::Storage(StorageError::Write { .. }))
        ));
        assert_eq!(store.len(), 1);
        assert!(!store.contains("2"));
    }

    #[test]
    fn test_update_changes_only_patched_fields() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("1", "before")).unwrap();
        let original = store.get("1").unwrap().clone();

        assert!(store.update("1", &EntryPatch::new().title("X")).unwrap());

        let updated = store.get("1").unwrap();
        assert_eq!(updated.title.as_deref(), Some("X"));
        assert_eq!(updated.body, original.body);
        assert_eq!(updated.created_date, original.created_date);
        assert_eq!(updated.created_time, original.created_time);
        assert_eq!(updated.kind, original.kind);
    }

    #[test]
    fn test_update_missing_id_is_a_silent_noop() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("1", "only")).unwrap();
        let writes = store.backend().write_count();

        assert!(!store.update("404", &EntryPatch::new().title("X")).unwrap());
        assert_eq!(store.backend().write_count(), writes);
        assert_eq!(store.get("1").unwrap().title.as_deref(), Some("only"));
    }

    #[test]
    fn test_update_write_failure_restores_entry() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("1", "before")).unwrap();

        store.backend().set_simulate_write_error(true);
        assert!(store.update("1", &EntryPatch::new().title("after")).is_err());
        assert_eq!(store.get("1").unwrap().title.as_deref(), Some("before"));
    }

    #[test]
    fn test_delete_removes_from_memory_and_storage() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("1", "a")).unwrap();
        store.add(text_entry("2", "b")).unwrap();

        assert!(store.delete("1").unwrap());
        assert!(!store.contains("1"));
        assert_eq!(stored_ids(store.backend(), ENTRIES_KEY), vec!["2"]);

        assert!(!store.delete("1").unwrap());
    }

    #[test]
    fn test_delete_write_failure_restores_entry() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("1", "a")).unwrap();
        store.add(text_entry("2", "b")).unwrap();

        store.backend().set_simulate_write_error(true);
        assert!(store.delete("1").is_err());
        let ids: Vec<&str> = store.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_load_merges_legacy_once() {
        let backend = MemoryKvStore::with_items([
            (
                ENTRIES_KEY,
                json!([{"id": "1", "type": "text", "title": "A"}]).to_string(),
            ),
            (
                LEGACY_ENTRIES_KEY,
                json!([
                    {"id": "1", "type": "text", "title": "B"},
                    {"id": "2", "type": "audio", "audioUri": "memo.m4a"}
                ])
                .to_string(),
            ),
        ]);

        let mut store = EntryStore::with_keys(&backend, StoreKeys::default());
        let report = store.load();

        assert_eq!(report.migrated_from_legacy, 1);
        assert_eq!(store.get("1").unwrap().title.as_deref(), Some("A"));
        assert!(store.contains("2"));
        assert_eq!(backend.raw(LEGACY_MIGRATED_KEY).as_deref(), Some(FLAG_TRUE));
        assert_eq!(stored_ids(&backend, ENTRIES_KEY), vec!["2", "1"]);

        // Later legacy writes by an old release are not merged again
        backend
            .set_item(
                LEGACY_ENTRIES_KEY,
                &json!([{"id": "3", "type": "text"}]).to_string(),
            )
            .unwrap();
        let report = store.load();
        assert_eq!(report.migrated_from_legacy, 0);
        assert!(!store.contains("3"));
    }

    #[test]
    fn test_delete_also_removes_from_legacy() {
        let backend = MemoryKvStore::with_items([(
            LEGACY_ENTRIES_KEY,
            json!([
                {"id": "1", "type": "text", "content": "old"},
                {"id": "2", "type": "text", "content": "older", "custom": true}
            ])
            .to_string(),
        )]);
        let mut store = EntryStore::with_keys(&backend, StoreKeys::default());
        store.load();

        assert!(store.delete("1").unwrap());
        assert_eq!(stored_ids(&backend, LEGACY_ENTRIES_KEY), vec!["2"]);
        assert_eq!(stored_ids(&backend, ENTRIES_KEY), vec!["2"]);

        let legacy: Vec<Value> =
            serde_json::from_str(&backend.raw(LEGACY_ENTRIES_KEY).unwrap()).unwrap();
        assert_eq!(legacy[0]["custom"], json!(true));
    }

    fn migrated_backend() -> MemoryKvStore {
        MemoryKvStore::with_items([(
            LEGACY_ENTRIES_KEY,
            json!([{"id": "1", "type": "text"}, {"id": "2", "type": "text"}]).to_string(),
        )])
    }

    #[test]
    fn test_delete_legacy_write_failure_keeps_entry_everywhere() {
        let backend = migrated_backend();
        let mut store = EntryStore::with_keys(&backend, StoreKeys::default());
        store.load();

        backend.set_failing_key(Some(LEGACY_ENTRIES_KEY));
        assert!(store.delete("1").is_err());

        assert!(store.contains("1"));
        assert_eq!(stored_ids(&backend, ENTRIES_KEY), vec!["2", "1"]);
        assert_eq!(stored_ids(&backend, LEGACY_ENTRIES_KEY), vec!["1", "2"]);
    }

    #[test]
    fn test_delete_primary_write_failure_restores_legacy() {
        let backend = migrated_backend();
        let mut store = EntryStore::with_keys(&backend, StoreKeys::default());
        store.load();

        backend.set_failing_key(Some(ENTRIES_KEY));
        assert!(store.delete("1").is_err());

        assert!(store.contains("1"));
        assert_eq!(stored_ids(&backend, ENTRIES_KEY), vec!["2", "1"]);
        assert_eq!(stored_ids(&backend, LEGACY_ENTRIES_KEY), vec!["1", "2"]);

        backend.set_failing_key(None);
        assert!(store.delete("1").unwrap());
        assert_eq!(stored_ids(&backend, LEGACY_ENTRIES_KEY), vec!["2"]);
    }

    #[test]
    fn test_load_degrades_on_corrupt_data_and_keeps_backup() {
        let backend = MemoryKvStore::with_items([(ENTRIES_KEY, "{oops")]);
        let mut store = EntryStore::with_keys(&backend, StoreKeys::default());

        let report = store.load();

        assert!(report.degraded);
        assert!(store.is_empty());
        assert_eq!(backend.raw("entries.corrupt").as_deref(), Some("{oops"));
    }

    #[test]
    fn test_load_skips_undecodable_records() {
        let backend = MemoryKvStore::with_items([(
            ENTRIES_KEY,
            json!([
                {"id": "1", "type": "text"},
                {"id": "2", "type": "video"},
                {"type": "text"}
            ])
            .to_string(),
        )]);
        let mut store = EntryStore::with_keys(&backend, StoreKeys::default());

        let report = store.load();

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped_records, 2);
        assert!(backend.raw("entries.corrupt").is_some());
    }

    #[test]
    fn test_load_degrades_on_read_error_without_migrating() {
        let backend = MemoryKvStore::with_items([(
            LEGACY_ENTRIES_KEY,
            json!([{"id": "1", "type": "text"}]).to_string(),
        )]);
        backend.set_simulate_read_error(true);
        let mut store = EntryStore::with_keys(&backend, StoreKeys::default());

        let report = store.load();

        assert!(report.degraded);
        assert!(store.is_empty());
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn test_next_id_skips_ids_in_use() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        let now = at(1_700_000_000_000);

        let first = store.next_id(&now);
        assert_eq!(first, "1700000000000");
        store.add(text_entry(&first, "a")).unwrap();

        assert_eq!(store.next_id(&now), "1700000000001");
    }

    #[test]
    fn test_search_and_kind_filters() {
        let mut store = EntryStore::open(MemoryKvStore::new());
        store.add(text_entry("1", "Garden notes")).unwrap();
        store
            .add(Entry::audio("2", None, "memo.m4a", 4, &at(0)))
            .unwrap();

        let found: Vec<&str> = store.search("garden").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(found, vec!["1"]);
        assert_eq!(store.of_kind(EntryKind::Audio).count(), 1);
        assert_eq!(store.search("").len(), 2);
    }
}
