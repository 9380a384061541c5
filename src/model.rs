use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub bookmark_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
    pub highlights: Vec<Highlight>,
}

impl Article {
    pub fn new(title: &str, url: &str) -> Self {
        Article {
            title: title.to_owned(),
            url: url.to_owned(),
            tags: vec![],
            highlights: vec![],
        }
    }
}

/// One entry of `/api/bookmarks/annotations` as it comes off the wire.
///
/// Every field is optional here; required ones are checked by the accessors
/// and a missing one surfaces as `SyncError::InvalidPayload`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHighlight {
    pub bookmark_id: Option<String>,
    pub text: Option<String>,
    pub created: Option<String>,
    pub bookmark_title: Option<String>,
    pub bookmark_url: Option<String>,
}

impl RawHighlight {
    pub fn bookmark_id(&self) -> Result<&str, SyncError> {
        required(&self.bookmark_id, "bookmark_id")
    }

    pub fn text(&self) -> Result<&str, SyncError> {
        required(&self.text, "text")
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>, SyncError> {
        let created = required(&self.created, "created")?;
        parse_timestamp(created)
            .ok_or_else(|| SyncError::InvalidTimestamp(format!("cannot parse created={:?}", created)))
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, SyncError> {
    field
        .as_deref()
        .ok_or_else(|| SyncError::InvalidPayload(format!("highlight is missing field '{}'", name)))
}

#[derive(Debug, Default, Deserialize)]
pub struct BookmarkDetails {
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Parses the timestamp formats the annotations endpoint is known to emit.
/// Offset-less values are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
