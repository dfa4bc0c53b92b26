use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use url::Url;

/// Prefix of every transcript storage key unless configured otherwise
pub const DEFAULT_KEY_PREFIX: &str = "chat";

/// Identity of one transcript: a page and a UTC calendar day
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranscriptKey {
    url: String,
    date: NaiveDate,
}

impl TranscriptKey {
    pub fn new(url: &str, date: NaiveDate) -> Self {
        Self {
            url: normalize_url(url),
            date,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Flat storage key: `{prefix}_{url}_{YYYY-MM-DD}`.
    ///
    /// The date has a fixed width, so the key splits back unambiguously from
    /// the right whatever the URL contains.
    pub fn storage_key(&self, prefix: &str) -> String {
        format!("{}_{}_{}", prefix, self.url, self.date.format("%Y-%m-%d"))
    }
}

impl fmt::Display for TranscriptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key(DEFAULT_KEY_PREFIX))
    }
}

/// Key of the transcript for `url` on the UTC day of `now`
pub fn key_for(url: &str, now: DateTime<Utc>) -> TranscriptKey {
    TranscriptKey::new(url, now.date_naive())
}

/// Drops the fragment of parseable URLs; anything else is only trimmed
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}
