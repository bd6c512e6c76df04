//! Rendering entries for the terminal.

use crate::errors::{AppResult, StorageError};
use crate::journal::{Entry, EntryKind};

/// Formats a duration in seconds as `m:ss`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One library row: id, kind, creation time, title.
pub fn entry_line(entry: &Entry) -> String {
    let mut line = format!(
        "{}  {:<5}  {} {}  {}",
        entry.id,
        entry.kind,
        entry.created_date,
        entry.created_time,
        entry.display_title()
    );
    if entry.kind == EntryKind::Audio {
        if let Some(seconds) = entry.duration_seconds {
            line.push_str(&format!(" ({})", format_duration(seconds)));
        }
    }
    line
}

/// The note detail view.
pub fn entry_detail(entry: &Entry) -> String {
    let mut out = format!(
        "{}\n{} {}\n",
        entry.display_title(),
        entry.created_date,
        entry.created_time
    );
    match entry.kind {
        EntryKind::Text => {
            out.push('\n');
            out.push_str(entry.body().unwrap_or_default());
            out.push('\n');
        }
        EntryKind::Audio => {
            if let Some(audio_ref) = &entry.audio_ref {
                out.push_str(&format!("Audio: {}\n", audio_ref));
            }
            if let Some(seconds) = entry.duration_seconds {
                out.push_str(&format!("Duration: {}\n", format_duration(seconds)));
            }
        }
    }
    out
}

/// Pretty JSON in the persisted wire format.
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value).map_err(|source| {
        StorageError::Serialize {
            key: "stdout".to_string(),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(42), "0:42");
        assert_eq!(format_duration(605), "10:05");
    }

    #[test]
    fn test_audio_line_includes_duration() {
        let entry = Entry::audio("1", Some("Walk".to_string()), "walk.m4a", 75, &at());
        assert_eq!(entry_line(&entry), "1  audio  3/5/2024 2:07:09 PM  Walk (1:15)");
    }

    #[test]
    fn test_text_detail_shows_body() {
        let entry = Entry::text("2", Some("Garden".to_string()), "Planted tomatoes", &at());
        let detail = entry_detail(&entry);
        assert!(detail.starts_with("Garden\n3/5/2024 2:07:09 PM\n"));
        assert!(detail.contains("Planted tomatoes"));
    }

    #[test]
    fn test_json_uses_wire_field_names() {
        let entry = Entry::text("3", None, "body", &at());
        let json = to_json(&[&entry][..]).unwrap();
        assert!(json.contains("\"type\": \"text\""));
        assert!(json.contains("\"text\": \"body\""));
    }
}
