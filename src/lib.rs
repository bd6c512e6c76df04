/*!
# Whisper Journal

Whisper Journal keeps voice memos and text notes in a local key-value store and
guards them behind a passcode or biometric lock.

## Architecture

- `kv`: key-value storage backends (files on disk, or memory for tests)
- `journal`: the entry model and the [`EntryStore`] that persists it, including the
  one-time merge of entries saved by older releases
- `session`: the [`SessionGuard`] lock state machine and its re-authentication timer
- `ops`: user-facing operations used by the CLI
- `cli`, `config`, `logging`, `errors`, `constants`: the application shell

## Usage Example

```rust,no_run
use chrono::Local;
use whisper_journal::journal::EntryStore;
use whisper_journal::kv::FileKvStore;
use whisper_journal::session::{NoBiometrics, SessionGuard, SystemClock};
use whisper_journal::{ops, Config};

fn main() -> whisper_journal::AppResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let credentials = FileKvStore::open(config.credentials_dir())?;
    let mut guard = SessionGuard::new(credentials, SystemClock, config.session_policy());
    ops::unlock_session(&mut guard, &mut NoBiometrics, &mut ops::FixedPasscode::new("1234"))?;

    let mut store = EntryStore::open(FileKvStore::open(config.data_dir.clone())?);
    ops::write_text_entry(&mut store, "Morning", "Slept well.", &Local::now())?;
    Ok(())
}
```
*/

/// Command-line interface definitions
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Constants used throughout the application
pub mod constants;
/// Error types and utilities for error handling
pub mod errors;
/// Journal entries and their persistence
pub mod journal;
/// Key-value storage backends
pub mod kv;
/// Log subscriber setup
pub mod logging;
/// High-level operations
pub mod ops;
/// Session locking and re-authentication
pub mod session;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use journal::{Entry, EntryKind, EntryPatch, EntryStore};
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use session::{SessionGuard, SessionState};
