//! The journal entry record and partial updates to it.

use crate::constants::{ENTRY_DATE_FORMAT, ENTRY_TIME_FORMAT};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Whether an entry is a voice memo or a text note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Audio,
    Text,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Audio => f.pad("audio"),
            EntryKind::Text => f.pad("text"),
        }
    }
}

/// One journal record.
///
/// Serialized field names follow the persisted format (`type`, `date`, `time`,
/// `text`, `audioUri`, `duration`). Older records keep their body under `content`;
/// it is preserved in [`Entry::legacy_body`] and used when `text` is absent.
/// Fields this version does not know about are kept in `extra` and written back
/// unchanged.
///
/// # Examples
///
/// ```
/// use whisper_journal::journal::{Entry, EntryKind};
///
/// let entry: Entry = serde_json::from_str(
///     r#"{"id":"1700000000000","type":"text","date":"11/14/2023","time":"10:13:20 PM","content":"hello"}"#,
/// ).unwrap();
///
/// assert_eq!(entry.kind, EntryKind::Text);
/// assert_eq!(entry.body(), Some("hello"));
/// assert_eq!(entry.display_title(), "11/14/2023 10:13:20 PM");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "date", default, deserialize_with = "null_as_empty")]
    pub created_date: String,

    #[serde(rename = "time", default, deserialize_with = "null_as_empty")]
    pub created_time: String,

    #[serde(rename = "text", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(rename = "content", default, skip_serializing_if = "Option::is_none")]
    pub legacy_body: Option<String>,

    #[serde(rename = "audioUri", default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,

    #[serde(
        rename = "duration",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_seconds"
    )]
    pub duration_seconds: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entry {
    /// Creates a text entry stamped with `at`.
    pub fn text<Tz>(id: impl Into<String>, title: Option<String>, body: impl Into<String>, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut entry = Self::blank(id.into(), EntryKind::Text, at);
        entry.title = title;
        entry.body = Some(body.into());
        entry
    }

    /// Creates an audio entry for a finished recording.
    pub fn audio<Tz>(
        id: impl Into<String>,
        title: Option<String>,
        audio_ref: impl Into<String>,
        duration_seconds: u64,
        at: &DateTime<Tz>,
    ) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut entry = Self::blank(id.into(), EntryKind::Audio, at);
        entry.title = title;
        entry.audio_ref = Some(audio_ref.into());
        entry.duration_seconds = Some(duration_seconds);
        entry
    }

    fn blank<Tz>(id: String, kind: EntryKind, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            id,
            kind,
            title: None,
            created_date: at.format(ENTRY_DATE_FORMAT).to_string(),
            created_time: at.format(ENTRY_TIME_FORMAT).to_string(),
            body: None,
            legacy_body: None,
            audio_ref: None,
            duration_seconds: None,
            extra: Map::new(),
        }
    }

    /// Text content, falling back to the older `content` field.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref().or(self.legacy_body.as_deref())
    }

    /// Title for display; derived from the creation timestamp when absent or blank.
    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("{} {}", self.created_date, self.created_time)
                .trim()
                .to_string(),
        }
    }

    /// Numeric value of a timestamp-derived id.
    pub fn numeric_id(&self) -> Option<u128> {
        if self.id.is_empty() || !self.id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.id.parse().ok()
    }

    /// Case-insensitive match over title, body, date and time.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            self.title.as_deref(),
            self.body(),
            Some(self.created_date.as_str()),
            Some(self.created_time.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Merges the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(title) = &patch.title {
            self.title = Some(title.clone());
        }
        if let Some(body) = &patch.body {
            self.body = Some(body.clone());
            self.legacy_body = None;
        }
        if let Some(audio_ref) = &patch.audio_ref {
            self.audio_ref = Some(audio_ref.clone());
        }
        if let Some(duration) = patch.duration_seconds {
            self.duration_seconds = Some(duration);
        }
    }
}

/// A partial update to an [`Entry`]. `None` fields are left unchanged.
///
/// # Examples
///
/// ```
/// use whisper_journal::journal::EntryPatch;
///
/// let patch = EntryPatch::new().title("Morning pages");
/// assert!(!patch.is_empty());
/// assert!(EntryPatch::new().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "text", skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, rename = "audioUri", skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,
    #[serde(default, rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn audio_ref(mut self, audio_ref: impl Into<String>) -> Self {
        self.audio_ref = Some(audio_ref.into());
        self
    }

    pub fn duration_seconds(mut self, seconds: u64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.audio_ref.is_none()
            && self.duration_seconds.is_none()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts whole or fractional seconds; fractions are rounded.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Whole(u64),
        Fractional(f64),
    }

    Ok(match Option::<Seconds>::deserialize(deserializer)? {
        None => None,
        Some(Seconds::Whole(seconds)) => Some(seconds),
        Some(Seconds::Fractional(seconds)) if seconds.is_finite() && seconds > 0.0 => {
            Some(seconds.round() as u64)
        }
        Some(Seconds::Fractional(_)) => Some(0),
    })
}
