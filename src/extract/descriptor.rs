use crate::dom::PageDocument;
use crate::error::ExtractError;
use crate::extract::walker::visible_text;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the `text` field, in characters
pub const MAX_TEXT_CHARS: usize = 5000;

/// Upper bound on the main content excerpt, in characters
pub const MAX_MAIN_CONTENT_CHARS: usize = 2000;

/// Number of headings kept
pub const MAX_HEADINGS: usize = 10;

/// Containers tried in order when looking for the main content
const MAIN_CONTENT_SELECTORS: &[&str] = &["main", "article", ".content", "#content"];

/// Structured summary of a page at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    /// Visible text, truncated
    pub text: String,

    pub metadata: PageMetadata,

    /// RFC 3339 build time with millisecond precision
    #[serde(rename = "timestamp")]
    pub timestamp_iso: String,

    /// Words in the untruncated visible text
    pub word_count: usize,
}

/// Document-derived metadata of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub url: String,
    pub headings: Vec<String>,
    #[serde(rename = "mainContent")]
    pub main_content_excerpt: String,
}

/// Builds a descriptor from `doc`, stamped with `now`
pub fn build_descriptor<D: PageDocument>(
    doc: &D,
    now: DateTime<Utc>,
) -> Result<PageDescriptor, ExtractError> {
    let body = doc.body().ok_or(ExtractError::MissingBody)?;
    let full_text = visible_text(&body);
    let word_count = word_count(&full_text);
    let metadata = build_metadata(doc)?;

    ::log::debug!(
        "Built descriptor for {}: {} chars, {} words, {} headings",
        metadata.url,
        full_text.chars().count(),
        word_count,
        metadata.headings.len()
    );

    Ok(PageDescriptor {
        text: truncate_chars(&full_text, MAX_TEXT_CHARS),
        metadata,
        timestamp_iso: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        word_count,
    })
}

fn build_metadata<D: PageDocument>(doc: &D) -> Result<PageMetadata, ExtractError> {
    let headings = doc
        .heading_texts()?
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .take(MAX_HEADINGS)
        .map(str::to_string)
        .collect();

    let mut main_content = String::new();
    for selector in MAIN_CONTENT_SELECTORS {
        if let Some(text) = doc.first_text_content(selector)? {
            main_content = truncate_chars(text.trim(), MAX_MAIN_CONTENT_CHARS);
            break;
        }
    }

    Ok(PageMetadata {
        title: doc.title(),
        description: doc.meta_content("description").unwrap_or_default(),
        keywords: doc.meta_content("keywords").unwrap_or_default(),
        url: doc.url().to_string(),
        headings,
        main_content_excerpt: main_content,
    })
}

/// Number of pieces left after splitting on whitespace runs.
///
/// An empty string still counts as one (empty) piece.
pub fn word_count(text: &str) -> usize {
    let mut pieces = 1;
    let mut in_whitespace = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                pieces += 1;
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
        }
    }
    pieces
}

/// First `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
