//! Journal entries and their persistence.
//!
//! - `entry`: the [`Entry`] record, its wire format and partial updates
//! - `merge`: pure deduplication, legacy merge and ordering rules
//! - `store`: the [`EntryStore`] that owns the persisted collection
//!
//! # Example
//!
//! ```
//! use whisper_journal::journal::{Entry, EntryPatch, EntryStore};
//! use whisper_journal::kv::MemoryKvStore;
//! use chrono::Local;
//!
//! let mut store = EntryStore::open(MemoryKvStore::new());
//! let now = Local::now();
//!
//! let id = store.next_id(&now);
//! store.add(Entry::text(id.clone(), None, "First thoughts", &now))?;
//! store.update(&id, &EntryPatch::new().title("Day one"))?;
//!
//! assert_eq!(store.get(&id).unwrap().display_title(), "Day one");
//! # Ok::<(), whisper_journal::AppError>(())
//! ```

pub mod entry;
pub mod merge;
pub mod store;

pub use entry::{Entry, EntryKind, EntryPatch};
pub use merge::{dedup_by_id, merge_collections, order_newest_first};
pub use store::{EntryStore, LoadReport, StoreKeys};
