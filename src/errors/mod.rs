//! Error handling utilities for Whisper Journal.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.
//!
//! Storage failures are split by direction: read failures are recoverable and the
//! entry store degrades to an empty collection, while write failures always reach
//! the caller, who must not assume the write happened.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents errors raised by a key-value storage backend.
///
/// # Examples
///
/// ```
/// use whisper_journal::errors::StorageError;
/// use std::io::{self, ErrorKind};
///
/// let error = StorageError::Write {
///     key: "entries".to_string(),
///     source: io::Error::new(ErrorKind::PermissionDenied, "permission denied"),
/// };
///
/// assert!(error.is_write_failure());
/// assert!(format!("{}", error).contains("entries"));
/// ```
#[derive(Debug, Error)]
pub enum StorageError {
    /// The stored value could not be read.
    #[error("Failed to read '{key}' from storage: {source}. Please check that the data directory is readable.")]
    Read {
        /// The key being read
        key: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The stored value was read but is not valid for its key.
    #[error("Stored value for '{key}' could not be parsed: {source}. A raw copy is kept under '{key}.corrupt' when possible.")]
    Corrupt {
        /// The key holding the unreadable value
        key: String,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The value could not be written.
    #[error("Failed to write '{key}' to storage: {source}. Please check disk space and permissions on the data directory.")]
    Write {
        /// The key being written
        key: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The value could not be serialized before writing.
    #[error("Failed to serialize value for '{key}': {source}")]
    Serialize {
        /// The key being written
        key: String,
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Another process holds the write lock.
    #[error("Journal storage is currently locked by another process: {path}. Please wait for the other whisper process to finish.")]
    Busy {
        /// Path of the lock file
        path: PathBuf,
    },

    /// The key contains characters that cannot be stored.
    #[error("Invalid storage key '{0}'. Keys may only contain letters, digits, '@', '_', '-' and '.', and must not start with '.'")]
    InvalidKey(String),
}

impl StorageError {
    /// Returns true for failures on the write path.
    ///
    /// Write failures must be surfaced to the user; read failures are degraded.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            StorageError::Write { .. } | StorageError::Serialize { .. } | StorageError::Busy { .. }
        )
    }
}

/// Errors in entry-level logic.
///
/// # Examples
///
/// ```
/// use whisper_journal::errors::EntryError;
///
/// let error = EntryError::NotFound("1700000000000".to_string());
/// assert!(format!("{}", error).contains("1700000000000"));
/// ```
#[derive(Debug, Error)]
pub enum EntryError {
    /// An entry with the same id already exists.
    #[error("An entry with id '{0}' already exists. Generate a fresh id before saving.")]
    DuplicateId(String),

    /// No entry with the given id exists.
    #[error("No entry with id '{0}'. Run `whisper list` to see available entries.")]
    NotFound(String),

    /// The entry failed validation before saving.
    #[error("{0}")]
    Invalid(String),
}

/// Errors raised while authenticating.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Biometric hardware is missing, not enrolled, or failed to respond.
    #[error("Biometric authentication unavailable: {0}")]
    HardwareUnavailable(String),

    /// Biometrics cannot be enabled before a passcode exists.
    #[error("Set a passcode before enabling biometric unlock.")]
    PasscodeNotSet,

    /// Reading the passcode from the terminal failed.
    #[error("Failed to read passcode: {0}")]
    Prompt(#[source] io::Error),

    /// The session could not be unlocked.
    #[error("Journal is locked: {0}")]
    Locked(String),
}

/// Represents all possible errors that can occur in Whisper Journal.
///
/// # Examples
///
/// Creating a configuration error:
/// ```
/// use whisper_journal::errors::AppError;
///
/// let error = AppError::Config("Missing data directory".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing data directory");
/// ```
///
/// Converting from an IO error:
/// ```
/// use whisper_journal::errors::AppError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "file not found");
/// let app_error: AppError = io_error.into();
///
/// match app_error {
///     AppError::Io(inner) => assert_eq!(inner.kind(), ErrorKind::NotFound),
///     _ => panic!("Expected Io variant"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the key-value storage backend.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Errors in entry logic.
    #[error("Entry error: {0}")]
    Entry(#[from] EntryError),

    /// Errors related to authentication.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;
