//! Create, edit, delete and browse journal entries.

use crate::errors::{AppResult, EntryError};
use crate::journal::{Entry, EntryKind, EntryPatch, EntryStore};
use crate::kv::KeyValueStore;
use chrono::{DateTime, TimeZone};
use std::fmt;
use tracing::debug;

/// Saves a new text note.
///
/// Title and body are trimmed before saving.
///
/// # Errors
///
/// Returns [`EntryError::Invalid`] when the title or body is blank, or a storage
/// error when the note could not be persisted.
pub fn write_text_entry<K, Tz>(
    store: &mut EntryStore<K>,
    title: &str,
    body: &str,
    at: &DateTime<Tz>,
) -> AppResult<Entry>
where
    K: KeyValueStore,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let title = title.trim();
    if title.is_empty() {
        return Err(EntryError::Invalid(
            "Missing Title: Please enter a title for your note.".to_string(),
        )
        .into());
    }
    let body = body.trim();
    if body.is_empty() {
        return Err(EntryError::Invalid(
            "Empty Note: Please write something before saving.".to_string(),
        )
        .into());
    }

    let id = store.next_id(at);
    let entry = Entry::text(id, Some(title.to_string()), body, at);
    store.add(entry.clone())?;
    debug!(id = %entry.id, "Saved text entry");
    Ok(entry)
}

/// Saves a finished recording.
///
/// Without a title the library shows the creation date and time.
pub fn record_audio_entry<K, Tz>(
    store: &mut EntryStore<K>,
    title: Option<&str>,
    audio_ref: &str,
    duration_seconds: u64,
    at: &DateTime<Tz>,
) -> AppResult<Entry>
where
    K: KeyValueStore,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let audio_ref = audio_ref.trim();
    if audio_ref.is_empty() {
        return Err(EntryError::Invalid(
            "Missing Recording: an audio file location is required.".to_string(),
        )
        .into());
    }
    let title = title
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string);

    let id = store.next_id(at);
    let entry = Entry::audio(id, title, audio_ref, duration_seconds, at);
    store.add(entry.clone())?;
    debug!(id = %entry.id, duration_seconds, "Saved audio entry");
    Ok(entry)
}

/// Applies `patch` to an existing entry and returns the updated entry.
///
/// # Errors
///
/// Returns [`EntryError::NotFound`] for an unknown id and [`EntryError::Invalid`]
/// for an empty patch, a blank title or a blank body.
pub fn edit_entry<K: KeyValueStore>(
    store: &mut EntryStore<K>,
    id: &str,
    patch: &EntryPatch,
) -> AppResult<Entry> {
    if patch.is_empty() {
        return Err(EntryError::Invalid(
            "Nothing to change. Pass --title or --text.".to_string(),
        )
        .into());
    }
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(EntryError::Invalid(
            "Missing Title: Please enter a title for your note.".to_string(),
        )
        .into());
    }
    if patch.body.as_deref().is_some_and(|b| b.trim().is_empty()) {
        return Err(EntryError::Invalid(
            "Empty Note: Please write something before saving.".to_string(),
        )
        .into());
    }
    if !store.contains(id) {
        return Err(EntryError::NotFound(id.to_string()).into());
    }

    store.update(id, patch)?;
    find_entry(store, id).cloned()
}

/// Deletes an entry.
///
/// # Errors
///
/// Returns [`EntryError::NotFound`] when no collection holds `id`.
pub fn delete_entry<K: KeyValueStore>(store: &mut EntryStore<K>, id: &str) -> AppResult<()> {
    if !store.delete(id)? {
        return Err(EntryError::NotFound(id.to_string()).into());
    }
    Ok(())
}

/// Library view, newest first, optionally filtered by kind.
pub fn list_entries<K: KeyValueStore>(
    store: &EntryStore<K>,
    kind: Option<EntryKind>,
) -> Vec<&Entry> {
    match kind {
        Some(kind) => store.of_kind(kind).collect(),
        None => store.entries().iter().collect(),
    }
}

/// Looks up a single entry.
pub fn find_entry<'a, K: KeyValueStore>(
    store: &'a EntryStore<K>,
    id: &str,
) -> AppResult<&'a Entry> {
    store
        .get(id)
        .ok_or_else(|| EntryError::NotFound(id.to_string()).into())
}

/// Case-insensitive search over title, body, date and time.
pub fn search_entries<'a, K: KeyValueStore>(
    store: &'a EntryStore<K>,
    query: &str,
) -> Vec<&'a Entry> {
    let results = store.search(query);
    debug!(matches = results.len(), "Searched entries");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::kv::MemoryKvStore;
    use chrono::{Local, TimeZone, Utc};

    fn store() -> EntryStore<MemoryKvStore> {
        EntryStore::open(MemoryKvStore::new())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_write_text_entry_trims_and_saves() {
        let mut store = store();
        let entry = write_text_entry(&mut store, "  Morning  ", "  Slept well.\n", &at(0)).unwrap();

        assert_eq!(entry.kind, EntryKind::Text);
        assert_eq!(entry.title.as_deref(), Some("Morning"));
        assert_eq!(entry.body(), Some("Slept well."));
        assert_eq!(entry.id, "1700000000000");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_write_text_entry_requires_title_and_body() {
        let mut store = store();

        match write_text_entry(&mut store, "   ", "body", &at(0)) {
            Err(AppError::Entry(EntryError::Invalid(msg))) => assert!(msg.contains("Missing Title")),
            other => panic!("Expected missing title error, got {:?}", other),
        }
        match write_text_entry(&mut store, "Title", " \n ", &at(0)) {
            Err(AppError::Entry(EntryError::Invalid(msg))) => assert!(msg.contains("Empty Note")),
            other => panic!("Expected empty note error, got {:?}", other),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_audio_entry_without_title() {
        let mut store = store();
        let entry =
            record_audio_entry(&mut store, Some("  "), "file:///rec/1.m4a", 42, &Local::now())
                .unwrap();

        assert_eq!(entry.kind, EntryKind::Audio);
        assert_eq!(entry.title, None);
        assert_eq!(entry.audio_ref.as_deref(), Some("file:///rec/1.m4a"));
        assert_eq!(entry.duration_seconds, Some(42));
        assert_eq!(
            entry.display_title(),
            format!("{} {}", entry.created_date, entry.created_time)
        );
    }

    #[test]
    fn test_record_audio_entry_requires_locator() {
        let mut store = store();
        assert!(record_audio_entry(&mut store, None, " ", 3, &at(0)).is_err());
    }

    #[test]
    fn test_entries_saved_in_same_millisecond_get_distinct_ids() {
        let mut store = store();
        let first = write_text_entry(&mut store, "One", "a", &at(0)).unwrap();
        let second = write_text_entry(&mut store, "Two", "b", &at(0)).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.entries()[0].id, second.id);
    }

    #[test]
    fn test_edit_entry_updates_fields() {
        let mut store = store();
        let entry = write_text_entry(&mut store, "Draft", "first", &at(0)).unwrap();

        let updated = edit_entry(&mut store, &entry.id, &EntryPatch::new().body("second")).unwrap();

        assert_eq!(updated.body(), Some("second"));
        assert_eq!(updated.title.as_deref(), Some("Draft"));
        assert_eq!(store.get(&entry.id).unwrap().body(), Some("second"));
    }

    #[test]
    fn test_edit_entry_rejects_unknown_id_and_empty_patch() {
        let mut store = store();
        let entry = write_text_entry(&mut store, "Draft", "first", &at(0)).unwrap();

        assert!(matches!(
            edit_entry(&mut store, "missing", &EntryPatch::new().title("x")),
            Err(AppError::Entry(EntryError::NotFound(_)))
        ));
        assert!(matches!(
            edit_entry(&mut store, &entry.id, &EntryPatch::new()),
            Err(AppError::Entry(EntryError::Invalid(_)))
        ));
        assert!(matches!(
            edit_entry(&mut store, &entry.id, &EntryPatch::new().title(" ")),
            Err(AppError::Entry(EntryError::Invalid(_)))
        ));
    }

    #[test]
    fn test_delete_entry() {
        let mut store = store();
        let entry = write_text_entry(&mut store, "Gone", "soon", &at(0)).unwrap();

        delete_entry(&mut store, &entry.id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            delete_entry(&mut store, &entry.id),
            Err(AppError::Entry(EntryError::NotFound(_)))
        ));
    }

    #[test]
    fn test_list_and_search() {
        let mut store = store();
        write_text_entry(&mut store, "Garden", "Planted tomatoes", &at(0)).unwrap();
        record_audio_entry(&mut store, Some("Walk"), "a.m4a", 60, &at(10)).unwrap();

        let all = list_entries(&store, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title.as_deref(), Some("Walk"));

        let audio = list_entries(&store, Some(EntryKind::Audio));
        assert_eq!(audio.len(), 1);

        let hits = search_entries(&store, "TOMATO");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title.as_deref(), Some("Garden"));

        assert!(find_entry(&store, "nope").is_err());
    }
}
