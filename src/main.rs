/*!
# Whisper - A Private Voice and Text Journal

`whisper` keeps voice memos and text notes in a local journal protected by a
4-digit passcode.

## Usage

```text
whisper [OPTIONS] <COMMAND>

Commands:
  write            Save a text note (the body is read from stdin when --text is omitted)
  record           Save a finished voice memo
  list             List entries, newest first
  show             Show one entry
  search           Find entries by title, text, date or time
  edit             Change an entry's title or text
  delete           Delete an entry
  biometrics       Turn biometric unlock on or off
  passcode-status  Report whether a passcode and biometric unlock are configured

Options:
      --log-format <LOG_FORMAT>  Log output format [possible values: text, json]
      --log-level <LOG_LEVEL>    Log filter directive such as `debug`
  -v, --verbose                  Print verbose output
```

## Configuration

- `WHISPER_DIR`: data directory (defaults to `~/.whisper-journal`)
- `WHISPER_REAUTH_SECS`: background seconds tolerated before re-authentication
- `WHISPER_LOG_FORMAT`, `WHISPER_LOG_LEVEL`: logging defaults
- `WHISPER_PASSCODE`: passcode for non-interactive use
*/

use chrono::Local;
use clap::Parser;
use std::io::{self, Read};
use std::process::ExitCode;
use tracing::{debug, error, info, info_span};
use uuid::Uuid;
use whisper_journal::cli::{output, CliArgs, Command, Toggle};
use whisper_journal::config::Config;
use whisper_journal::constants::{TRACING_ROOT_SPAN_NAME, TRACING_SERVICE_NAME};
use whisper_journal::errors::AppResult;
use whisper_journal::journal::{EntryKind, EntryPatch, EntryStore};
use whisper_journal::kv::FileKvStore;
use whisper_journal::logging;
use whisper_journal::ops;
use whisper_journal::session::{NoBiometrics, SessionGuard, SystemClock};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match Config::load().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_format = args.log_format.unwrap_or(config.log_format);
    let log_level = if args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone().unwrap_or_else(|| config.log_level.clone())
    };
    logging::init(log_format, &log_level);

    let correlation_id = Uuid::new_v4().to_string();
    let root_span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        service_name = TRACING_SERVICE_NAME,
        correlation_id = %correlation_id
    );
    let _enter = root_span.enter();

    info!("Starting whisper");
    debug!("Configuration: {:?}", config);

    match run(args.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &Config) -> AppResult<()> {
    // The data directory must exist before its `secure/` child so both get owner-only permissions.
    let backend = FileKvStore::open(config.data_dir.clone())?;
    let credentials = FileKvStore::open(config.credentials_dir())?;
    let mut guard = SessionGuard::new(credentials, SystemClock, config.session_policy());
    let mut biometrics = NoBiometrics;

    if command.requires_unlock() {
        let mut source = ops::passcode_source_from_env();
        let method = ops::unlock_session(&mut guard, &mut biometrics, source.as_mut())?;
        debug!(?method, "Journal unlocked");
    }

    let mut store = match command {
        Command::PasscodeStatus => {
            let passcode = if guard.has_passcode()? { "set" } else { "not set" };
            let biometric = if guard.biometrics_enabled()? {
                "enabled"
            } else {
                "disabled"
            };
            println!("Passcode: {}", passcode);
            println!("Biometric unlock: {}", biometric);
            return Ok(());
        }
        Command::Biometrics { action } => {
            match action {
                Toggle::Enable => {
                    guard.enable_biometrics(&mut biometrics)?;
                    println!("Biometric unlock enabled.");
                }
                Toggle::Disable => {
                    guard.disable_biometrics()?;
                    println!("Biometric unlock disabled.");
                }
            }
            return Ok(());
        }
        _ => EntryStore::open(backend),
    };

    let now = Local::now();
    match command {
        Command::Write { title, text } => {
            let body = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            let entry = ops::write_text_entry(&mut store, &title, &body, &now)?;
            println!("Saved! Your note has been added to the library ({}).", entry.id);
        }
        Command::Record {
            audio,
            duration,
            title,
        } => {
            let entry =
                ops::record_audio_entry(&mut store, title.as_deref(), &audio, duration, &now)?;
            println!("Saved! Your recording has been added to the library ({}).", entry.id);
        }
        Command::List { kind, json } => {
            let entries = ops::list_entries(&store, kind.map(EntryKind::from));
            if json {
                println!("{}", output::to_json(&entries)?);
            } else if entries.is_empty() {
                println!("No entries yet.");
            } else {
                for entry in entries {
                    println!("{}", output::entry_line(entry));
                }
            }
        }
        Command::Show { id, json } => {
            let entry = ops::find_entry(&store, &id)?;
            if json {
                println!("{}", output::to_json(entry)?);
            } else {
                print!("{}", output::entry_detail(entry));
            }
        }
        Command::Search { query, json } => {
            let entries = ops::search_entries(&store, &query);
            if json {
                println!("{}", output::to_json(&entries)?);
            } else if entries.is_empty() {
                println!("No entries match '{}'.", query);
            } else {
                for entry in entries {
                    println!("{}", output::entry_line(entry));
                }
            }
        }
        Command::Edit { id, title, text } => {
            let mut patch = EntryPatch::new();
            if let Some(title) = title {
                patch = patch.title(title.trim());
            }
            if let Some(text) = text {
                patch = patch.body(text.trim());
            }
            ops::edit_entry(&mut store, &id, &patch)?;
            println!("Updated {}.", id);
        }
        Command::Delete { id } => {
            ops::delete_entry(&mut store, &id)?;
            println!("Deleted {}.", id);
        }
        Command::PasscodeStatus | Command::Biometrics { .. } => {}
    }

    Ok(())
}

fn read_stdin() -> AppResult<String> {
    let mut body = String::new();
    io::stdin().read_to_string(&mut body)?;
    Ok(body)
}
