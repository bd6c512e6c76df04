//! Command-line interface for the `whisper` binary.

pub mod output;

use crate::constants::{APP_DESCRIPTION, APP_NAME};
use crate::journal::EntryKind;
use crate::logging::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};

/// A private journal for voice memos and text notes
#[derive(Parser, Debug)]
#[command(name = APP_NAME, about = APP_DESCRIPTION, version, long_about = None)]
pub struct CliArgs {
    /// Log output format (overrides WHISPER_LOG_FORMAT)
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Log filter directive such as `debug` (overrides WHISPER_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Print verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Save a text note (the body is read from stdin when --text is omitted)
    Write {
        #[arg(short, long)]
        title: String,
        #[arg(long)]
        text: Option<String>,
    },
    /// Save a finished voice memo
    Record {
        /// Location of the recorded audio file
        #[arg(long)]
        audio: String,
        /// Length of the recording in seconds
        #[arg(long)]
        duration: u64,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// List entries, newest first
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long)]
        json: bool,
    },
    /// Show one entry
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Find entries by title, text, date or time
    Search {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Change an entry's title or text
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Delete an entry
    Delete { id: String },
    /// Turn biometric unlock on or off
    Biometrics {
        #[arg(value_enum)]
        action: Toggle,
    },
    /// Report whether a passcode and biometric unlock are configured
    PasscodeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Audio,
    Text,
}

impl From<KindArg> for EntryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Audio => EntryKind::Audio,
            KindArg::Text => EntryKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    Enable,
    Disable,
}

impl Command {
    /// Whether the command needs an unlocked session.
    pub fn requires_unlock(&self) -> bool {
        !matches!(self, Command::PasscodeStatus)
    }
}
