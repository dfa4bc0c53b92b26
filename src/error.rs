use thiserror::Error;

/// Faults raised while reading a document into a [`crate::PageDescriptor`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A CSS selector failed to parse
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    /// The document has no body to walk
    #[error("document has no body")]
    MissingBody,

    /// The WebDriver session could not be established
    #[error("webdriver connection failed: {0}")]
    Connect(String),

    /// A WebDriver command failed after the session was established
    #[error("webdriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    /// Something inside the extraction pass panicked
    #[error("extraction aborted: {0}")]
    Panicked(String),
}

/// Faults of a persistent transcript backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Faults while loading an [`crate::config::AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
