// Journal entry types shared by the controller, the API client and the views.
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of characters shown in list previews before truncating.
pub const PREVIEW_CHARS: usize = 100;

/// Wire format for calendar dates, both in paths and in JSON bodies.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A persisted journal entry. At most one exists per `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Opaque identifier assigned by the server.
    pub id: serde_json::Value,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "contenido")]
    pub content: String,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<String>,
    #[serde(rename = "fecha_actualizacion", default)]
    pub updated_at: Option<String>,
}

impl JournalEntry {
    pub fn new(id: impl Into<serde_json::Value>, date: NaiveDate, content: &str) -> Self {
        Self {
            id: id.into(),
            date,
            content: content.to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    /// First `PREVIEW_CHARS` characters of the content, with an ellipsis when cut.
    pub fn preview(&self) -> String {
        if self.content.chars().count() > PREVIEW_CHARS {
            let cut: String = self.content.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", cut)
        } else {
            self.content.clone()
        }
    }
}

/// Body of create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "contenido")]
    pub content: String,
}

impl EntryPayload {
    pub fn new(date: NaiveDate, content: &str) -> Self {
        Self {
            date,
            content: content.to_string(),
        }
    }
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Human readable form used in the entry list, e.g. `Mon, 15 Jan 2024`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%a, %-d %b %Y").to_string()
}
