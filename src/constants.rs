//! Constants used throughout the application.
//!
//! This module contains all constants used in Whisper Journal, organized
//! into logical groups. Storage keys are part of the persisted format and must
//! not change between releases.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "whisper";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A private journal for voice memos and text notes";

// CLI Arguments & Defaults
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Configuration Keys & Environment Variables
/// Environment variable for specifying the data directory.
pub const ENV_VAR_WHISPER_DIR: &str = "WHISPER_DIR";
/// Environment variable for the re-authentication threshold in seconds.
pub const ENV_VAR_REAUTH_SECS: &str = "WHISPER_REAUTH_SECS";
/// Environment variable selecting the log format.
pub const ENV_VAR_LOG_FORMAT: &str = "WHISPER_LOG_FORMAT";
/// Environment variable selecting the log level.
pub const ENV_VAR_LOG_LEVEL: &str = "WHISPER_LOG_LEVEL";
/// Environment variable supplying the passcode non-interactively.
pub const ENV_VAR_PASSCODE: &str = "WHISPER_PASSCODE";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default sub-directory name for journal data within the user's home directory.
pub const DEFAULT_DATA_SUBDIR: &str = ".whisper-journal";
/// Sub-directory of the data directory holding credentials.
pub const CREDENTIALS_SUBDIR: &str = "secure";

// Validation
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";
/// Number of digits in a passcode.
pub const PASSCODE_LENGTH: usize = 4;
/// Passcode attempts allowed per CLI invocation.
pub const MAX_PASSCODE_ATTEMPTS: usize = 3;

// Storage Keys
/// Key of the primary entry collection.
pub const ENTRIES_KEY: &str = "entries";
/// Key of the collection written by earlier releases.
pub const LEGACY_ENTRIES_KEY: &str = "journalEntries";
/// Marker recording that the legacy collection has been merged.
pub const LEGACY_MIGRATED_KEY: &str = "entries.legacyMigrated";
/// Suffix of the key holding a raw copy of an unreadable collection.
pub const CORRUPT_SUFFIX: &str = ".corrupt";
/// Key of the stored passcode.
pub const PASSCODE_KEY: &str = "appPasscode";
/// Key of the biometric opt-in flag.
pub const BIOMETRICS_KEY: &str = "useBiometrics";
/// Value stored for boolean flags.
pub const FLAG_TRUE: &str = "true";

// File System Parameters
/// File extension for stored values.
pub const VALUE_FILE_EXTENSION: &str = ".json";
/// Name of the advisory lock file guarding writes.
pub const LOCK_FILE_NAME: &str = ".lock";
/// Default POSIX permissions for newly created directories (owner read/write/execute).
#[cfg(unix)]
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o700;
/// Default POSIX permissions for newly created files (owner read/write).
#[cfg(unix)]
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o600;

// Date/Time Logic
/// Format of the human-readable creation date.
pub const ENTRY_DATE_FORMAT: &str = "%-m/%-d/%Y";
/// Format of the human-readable creation time.
pub const ENTRY_TIME_FORMAT: &str = "%-I:%M:%S %p";

// Session
/// Background time after which re-authentication is demanded, in seconds.
pub const DEFAULT_REAUTH_AFTER_SECS: u64 = 5;
/// Settle time between foregrounding and starting a re-auth attempt.
pub const DEFAULT_PROMPT_DELAY_MS: u64 = 800;
/// Message shown by the biometric prompt.
pub const BIOMETRIC_PROMPT_MESSAGE: &str = "Unlock Whisper Journal";
/// Label of the biometric prompt's passcode fallback.
pub const BIOMETRIC_FALLBACK_LABEL: &str = "Use Passcode";
/// Label of the biometric prompt's cancel button.
pub const BIOMETRIC_CANCEL_LABEL: &str = "Cancel";

// Logging Configuration
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "whisper";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";
