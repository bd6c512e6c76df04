//! Log subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use crate::constants::{LOG_FORMAT_JSON, LOG_FORMAT_TEXT};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str(LOG_FORMAT_TEXT),
            LogFormat::Json => f.write_str(LOG_FORMAT_JSON),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            LOG_FORMAT_TEXT => Ok(LogFormat::Text),
            LOG_FORMAT_JSON => Ok(LogFormat::Json),
            other => Err(format!(
                "Unknown log format '{}'. Use '{}' or '{}'",
                other, LOG_FORMAT_TEXT, LOG_FORMAT_JSON
            )),
        }
    }
}

/// Builds the level filter. `RUST_LOG` takes precedence over `level`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(crate::constants::DEFAULT_LOG_LEVEL))
}

/// Installs the global subscriber.
///
/// Calling this twice is harmless; the second call leaves the first subscriber in
/// place and returns `false`.
pub fn init(format: LogFormat, level: &str) -> bool {
    let filter = build_filter(level);
    let timer = ChronoLocal::rfc_3339();

    let result = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_timer(timer)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_timer(timer)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
    };
    result.is_ok()
}
