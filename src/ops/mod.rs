//! High-level operations behind the CLI commands.
//!
//! These functions orchestrate the entry store and the session guard; they hold
//! the input validation the user sees, while storage rules live in `journal`.

pub mod journal;
pub mod unlock;

pub use journal::{
    delete_entry, edit_entry, find_entry, list_entries, record_audio_entry, search_entries,
    write_text_entry,
};
pub use unlock::{
    passcode_source_from_env, unlock_session, FixedPasscode, PasscodeSource, PromptPasscode,
    UnlockMethod,
};
