//! Configuration management for Whisper Journal.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults.
//!
//! # Environment Variables
//!
//! - `WHISPER_DIR`: Path to the data directory (defaults to ~/.whisper-journal)
//! - `WHISPER_REAUTH_SECS`: Background seconds tolerated before re-authentication (defaults to 5)
//! - `WHISPER_LOG_FORMAT`: `text` or `json` (defaults to `text`)
//! - `WHISPER_LOG_LEVEL`: Log filter directive (defaults to `info`; `RUST_LOG` wins when set)
//! - `HOME`: Used for expanding the default data directory path

use crate::constants::{
    CREDENTIALS_SUBDIR, DEFAULT_DATA_SUBDIR, DEFAULT_LOG_LEVEL, DEFAULT_PROMPT_DELAY_MS,
    DEFAULT_REAUTH_AFTER_SECS, ENV_VAR_HOME, ENV_VAR_LOG_FORMAT, ENV_VAR_LOG_LEVEL,
    ENV_VAR_REAUTH_SECS, ENV_VAR_WHISPER_DIR,
};
use crate::errors::{AppError, AppResult};
use crate::logging::LogFormat;
use crate::session::SessionPolicy;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for Whisper Journal.
///
/// # Examples
///
/// Creating a configuration manually:
/// ```
/// use whisper_journal::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     data_dir: PathBuf::from("/path/to/journal"),
///     ..Config::default()
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.credentials_dir(), PathBuf::from("/path/to/journal/secure"));
/// ```
///
/// Loading configuration from environment variables:
/// ```no_run
/// use whisper_journal::Config;
/// use std::env;
///
/// env::set_var("WHISPER_DIR", "/custom/journal/path");
///
/// let config = Config::load().expect("Failed to load configuration");
/// assert_eq!(config.data_dir.to_str(), Some("/custom/journal/path"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding journal data. Credentials live in its `secure/` subdirectory.
    pub data_dir: PathBuf,

    /// Longest background stay that does not require re-authentication.
    pub reauth_after: Duration,

    /// Delay between foregrounding and the re-authentication prompt.
    pub prompt_delay: Duration,

    pub log_format: LogFormat,

    /// Filter directive passed to the log subscriber.
    pub log_level: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &"[REDACTED_PATH]")
            .field("reauth_after", &self.reauth_after)
            .field("prompt_delay", &self.prompt_delay)
            .field("log_format", &self.log_format)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(""),
            reauth_after: Duration::from_secs(DEFAULT_REAUTH_AFTER_SECS),
            prompt_delay: Duration::from_millis(DEFAULT_PROMPT_DELAY_MS),
            log_format: LogFormat::Text,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// The data directory path is expanded with `shellexpand`, so `~` and
    /// `$VAR` references work.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - The data directory path expansion fails or yields an empty path
    /// - `WHISPER_REAUTH_SECS` is not a whole number of seconds
    /// - `WHISPER_LOG_FORMAT` is neither `text` nor `json`
    pub fn load() -> AppResult<Self> {
        let data_dir_str = env::var(ENV_VAR_WHISPER_DIR).unwrap_or_else(|_| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_DATA_SUBDIR)
        });

        let expanded_path = shellexpand::full(&data_dir_str)
            .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
        let data_dir = PathBuf::from(expanded_path.into_owned());

        if data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Data directory path is empty".to_string()));
        }

        let reauth_after = match env::var(ENV_VAR_REAUTH_SECS) {
            Ok(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_VAR_REAUTH_SECS, raw
                ))
            })?),
            Err(_) => Duration::from_secs(DEFAULT_REAUTH_AFTER_SECS),
        };

        let log_format = match env::var(ENV_VAR_LOG_FORMAT) {
            Ok(raw) => raw.parse::<LogFormat>().map_err(AppError::Config)?,
            Err(_) => LogFormat::Text,
        };

        let log_level = env::var(ENV_VAR_LOG_LEVEL)
            .ok()
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Config {
            data_dir,
            reauth_after,
            prompt_delay: Duration::from_millis(DEFAULT_PROMPT_DELAY_MS),
            log_format,
            log_level,
        })
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` with one of the following messages:
    /// - "Data directory path is empty"
    /// - "Data directory must be an absolute path"
    pub fn validate(&self) -> AppResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Data directory path is empty".to_string()));
        }

        if !self.data_dir.is_absolute() {
            return Err(AppError::Config(
                "Data directory must be an absolute path".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory of the credential store.
    pub fn credentials_dir(&self) -> PathBuf {
        self.data_dir.join(CREDENTIALS_SUBDIR)
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            reauth_after: self.reauth_after,
            prompt_delay: self.prompt_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    const MANAGED_VARS: [&str; 4] = [
        ENV_VAR_WHISPER_DIR,
        ENV_VAR_REAUTH_SECS,
        ENV_VAR_LOG_FORMAT,
        ENV_VAR_LOG_LEVEL,
    ];

    /// Runs `test` with the managed variables cleared, restoring them afterwards.
    fn with_clean_env<T>(test: impl FnOnce() -> T) -> T {
        let saved: Vec<(&str, Option<String>)> = MANAGED_VARS
            .iter()
            .map(|name| (*name, env::var(name).ok()))
            .collect();
        for name in MANAGED_VARS {
            env::remove_var(name);
        }

        let result = test();

        for (name, value) in saved {
            match value {
                Some(value) => env::set_var(name, value),
                None => env::remove_var(name),
            }
        }
        result
    }

    #[test]
    fn test_debug_impl_redacts_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/home/username/private/journal"),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED_PATH]"));
        assert!(!debug_output.contains("/home/username/private/journal"));
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.reauth_after, Duration::from_secs(5));
        assert_eq!(config.prompt_delay, Duration::from_millis(800));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_load_defaults_to_home_subdirectory() {
        let config = with_clean_env(|| {
            let orig_home = env::var(ENV_VAR_HOME).ok();
            env::set_var(ENV_VAR_HOME, "/home/tester");
            let config = Config::load();
            match orig_home {
                Some(home) => env::set_var(ENV_VAR_HOME, home),
                None => env::remove_var(ENV_VAR_HOME),
            }
            config.unwrap()
        });

        assert_eq!(config.data_dir, PathBuf::from("/home/tester/.whisper-journal"));
        assert_eq!(config.reauth_after, Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    #[serial]
    fn test_load_with_custom_dir() {
        let temp_dir = tempdir().unwrap();
        let dir_path = temp_dir.path().to_string_lossy().to_string();

        let config = with_clean_env(|| {
            env::set_var(ENV_VAR_WHISPER_DIR, &dir_path);
            Config::load().unwrap()
        });

        assert_eq!(config.data_dir, PathBuf::from(&dir_path));
        assert_eq!(config.credentials_dir(), temp_dir.path().join("secure"));
    }

    #[test]
    #[serial]
    fn test_load_reads_session_and_logging_settings() {
        let config = with_clean_env(|| {
            env::set_var(ENV_VAR_WHISPER_DIR, "/tmp/whisper");
            env::set_var(ENV_VAR_REAUTH_SECS, "30");
            env::set_var(ENV_VAR_LOG_FORMAT, "json");
            env::set_var(ENV_VAR_LOG_LEVEL, "debug");
            Config::load().unwrap()
        });

        assert_eq!(config.reauth_after, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.session_policy().reauth_after,
            Duration::from_secs(30)
        );
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_reauth_secs() {
        let result = with_clean_env(|| {
            env::set_var(ENV_VAR_WHISPER_DIR, "/tmp/whisper");
            env::set_var(ENV_VAR_REAUTH_SECS, "five");
            Config::load()
        });

        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("WHISPER_REAUTH_SECS")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_load_rejects_unknown_log_format() {
        let result = with_clean_env(|| {
            env::set_var(ENV_VAR_WHISPER_DIR, "/tmp/whisper");
            env::set_var(ENV_VAR_LOG_FORMAT, "xml");
            Config::load()
        });

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_valid_config() {
        let temp_dir = tempdir().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_data_dir() {
        let result = Config::default().validate();
        match result {
            Err(AppError::Config(message)) => {
                assert!(message.contains("Data directory path is empty"));
            }
            _ => panic!("Expected Config error about empty data directory"),
        }
    }

    #[test]
    fn test_validate_relative_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("relative/path"),
            ..Config::default()
        };

        match config.validate() {
            Err(AppError::Config(message)) => {
                assert!(message.contains("must be an absolute path"));
            }
            _ => panic!("Expected Config error about relative path"),
        }
    }
}
