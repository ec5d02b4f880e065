//! Clip records and the helpers shared by capture and the library
//!
//! A clip is a piece of text saved from a page, together with where it came
//! from. Records are identified by a stable [`ClipId`], while duplicates are
//! detected on the `(text, domain)` pair.

pub mod age;

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

pub use age::relative_age;

/// Stable identifier of a clip record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(Uuid);

impl ClipId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex characters, used for compact listings
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ClipId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClipId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A saved piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipRecord {
    /// Stable identity; generated for lists written without one
    #[serde(default)]
    pub id: ClipId,
    /// The captured or edited content
    pub text: String,
    /// Full page URL at capture time
    pub url: String,
    /// Host of `url` without a leading `www.`
    pub domain: String,
    /// Best-effort icon URL resolved at capture time
    #[serde(default)]
    pub favicon: Option<String>,
    /// Last saved or updated time, epoch milliseconds
    pub timestamp: i64,
}

impl ClipRecord {
    /// Build a record for text captured on `url`.
    ///
    /// The text is trimmed and the domain is derived from the URL.
    pub fn new(
        text: impl AsRef<str>,
        url: impl Into<String>,
        favicon: Option<String>,
        timestamp: i64,
    ) -> Self {
        let url = url.into();
        Self {
            id: ClipId::new(),
            text: text.as_ref().trim().to_string(),
            domain: domain_of(&url),
            url,
            favicon: favicon.filter(|f| !f.trim().is_empty()),
            timestamp,
        }
    }

    /// Stored favicon, treating an empty string as absent
    pub fn favicon(&self) -> Option<&str> {
        self.favicon.as_deref().filter(|f| !f.is_empty())
    }

    /// Whether both records share the de-duplication key
    pub fn same_key(&self, other: &ClipRecord) -> bool {
        self.text == other.text && self.domain == other.domain
    }

    /// Case-insensitive substring match on domain or text.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.domain.to_lowercase().contains(needle) || self.text.to_lowercase().contains(needle)
    }
}

/// Derive the display domain of a page URL.
///
/// Returns the host with one leading `www.` removed. Falls back to the input
/// string when it does not parse or has no host.
pub fn domain_of(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => host.strip_prefix("www.").unwrap_or(host).to_string(),
            _ => raw.to_string(),
        },
        Err(_) => raw.to_string(),
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
