//! Pure collection logic: deduplication, legacy merge and newest-first ordering.
//!
//! Nothing here performs I/O, so the rules the entry store relies on can be
//! tested directly.

use super::entry::Entry;
use std::collections::HashSet;

/// Removes later duplicates of an id, keeping the first occurrence.
pub fn dedup_by_id(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.id.clone()))
        .collect()
}

/// Merges the legacy collection into the primary one.
///
/// Primary entries come first and win on id conflicts; legacy entries whose id
/// is not in the primary collection follow in their original order.
///
/// # Examples
///
/// ```
/// use whisper_journal::journal::{merge_collections, Entry};
///
/// let primary: Vec<Entry> = serde_json::from_str(r#"[{"id":"1","type":"text","title":"A"}]"#).unwrap();
/// let legacy: Vec<Entry> = serde_json::from_str(r#"[{"id":"1","type":"text","title":"B"}]"#).unwrap();
///
/// let merged = merge_collections(primary, legacy);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].title.as_deref(), Some("A"));
/// ```
pub fn merge_collections(primary: Vec<Entry>, legacy: Vec<Entry>) -> Vec<Entry> {
    let mut merged = dedup_by_id(primary);
    let known: HashSet<String> = merged.iter().map(|entry| entry.id.clone()).collect();

    merged.extend(
        dedup_by_id(legacy)
            .into_iter()
            .filter(|entry| !known.contains(&entry.id)),
    );
    merged
}

/// Orders entries newest first.
///
/// Entries with numeric (timestamp-derived) ids are sorted by descending id among
/// the positions numeric ids occupy. Entries with other ids keep their position,
/// so a collection without numeric ids keeps its order entirely.
pub fn order_newest_first(entries: Vec<Entry>) -> Vec<Entry> {
    let mut cells: Vec<Option<Entry>> = entries.into_iter().map(Some).collect();

    let slots: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.as_ref().and_then(Entry::numeric_id).is_some())
        .map(|(index, _)| index)
        .collect();

    let mut numbered: Vec<Entry> = slots.iter().filter_map(|&i| cells[i].take()).collect();
    // Stable, so equal ids keep their relative order
    numbered.sort_by(|a, b| b.numeric_id().cmp(&a.numeric_id()));

    for (slot, entry) in slots.into_iter().zip(numbered) {
        cells[slot] = Some(entry);
    }

    cells.into_iter().flatten().collect()
}
