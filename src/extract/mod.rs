pub mod descriptor;
pub mod walker;


use crate::dom::PageDocument;
use crate::error::ExtractError;
use chrono::{DateTime, Utc};
use descriptor::{PageDescriptor, build_descriptor};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};

/// Inbound request understood by the extraction boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentRequest {
    #[serde(rename = "GET_PAGE_TEXT")]
    GetPageText,
}

/// Reply envelope: `{ success: true, data }` or `{ success: false, error }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PageDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractResponse {
    pub fn success(data: PageDescriptor) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl From<Result<PageDescriptor, String>> for ExtractResponse {
    fn from(result: Result<PageDescriptor, String>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(error),
        }
    }
}

/// Extracts a descriptor of `doc`, stamped with the current time.
///
/// This is the only place extraction faults are recovered: errors and
/// panics from the walker or the builder come back as a message.
pub fn extract_page<D: PageDocument>(doc: &D) -> Result<PageDescriptor, String> {
    extract_page_at(doc, Utc::now())
}

/// [`extract_page`] with an explicit build time
pub fn extract_page_at<D: PageDocument>(
    doc: &D,
    now: DateTime<Utc>,
) -> Result<PageDescriptor, String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| build_descriptor(doc, now)))
        .unwrap_or_else(|payload| Err(ExtractError::Panicked(panic_message(payload.as_ref()))));

    outcome.map_err(|e| {
        ::log::warn!("Extraction failed for {}: {}", doc.url(), e);
        e.to_string()
    })
}

/// Answers a request against `doc`
pub fn handle_request<D: PageDocument>(request: ContentRequest, doc: &D) -> ExtractResponse {
    match request {
        ContentRequest::GetPageText => extract_page(doc).into(),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
