//! Render model for the clip library

use url::Url;

use crate::clip::{relative_age, ClipId, ClipRecord};

/// Remote icon lookup used when a clip has no stored favicon
pub const DEFAULT_FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";

/// Icon to show for a clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayIcon {
    /// Image to try first, if any
    pub url: Option<String>,
    /// Glyph shown when there is no image or it fails to load
    pub letter: char,
}

/// One rendered clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipCard {
    pub id: ClipId,
    pub icon: DisplayIcon,
    pub domain: String,
    pub url: String,
    pub age: String,
    pub text: String,
}

impl ClipCard {
    pub fn from_record(record: &ClipRecord, now_ms: i64, favicon_service: &str) -> Self {
        Self {
            id: record.id,
            icon: display_icon(record, favicon_service),
            domain: record.domain.clone(),
            url: record.url.clone(),
            age: relative_age(record.timestamp, now_ms),
            text: record.text.clone(),
        }
    }
}

/// Resolve the icon for a record.
///
/// Stored favicon first, then the remote lookup keyed by the page host.
pub fn display_icon(record: &ClipRecord, favicon_service: &str) -> DisplayIcon {
    let url = match record.favicon() {
        Some(favicon) => Some(favicon.to_string()),
        None => Url::parse(&record.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .map(|host| format!("{}?domain={}&sz=64", favicon_service, host)),
    };

    DisplayIcon {
        url,
        letter: favicon_letter(&record.domain),
    }
}

/// Uppercased first character of the domain, `?` when empty
pub fn favicon_letter(domain: &str) -> char {
    domain
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}
