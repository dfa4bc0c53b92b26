// Re-export modules
pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod markup;
pub mod monitor;
pub mod source;
pub mod transcript;

// Re-export commonly used types for convenience
pub use error::{ConfigError, ExtractError, StoreError};
pub use extract::descriptor::{PageDescriptor, PageMetadata};
pub use extract::{ContentRequest, ExtractResponse, extract_page};
pub use markup::{format_message, format_value};
pub use monitor::{ChangeDetector, ContentChanged, DetectorHandle};
pub use transcript::{ChatEntry, Persist, Role, Transcript, TranscriptKey, TranscriptStore};
