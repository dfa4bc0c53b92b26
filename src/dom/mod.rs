//! Minimal view of a rendered document.
//!
//! The walker and the descriptor builder only ever see these traits, so they
//! run the same against a parsed HTML page and against hand-built fixtures.

pub mod html;

pub use html::{HtmlDocument, HtmlNode};

use crate::error::ExtractError;

/// Computed `display` value, reduced to what the walker cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Rendered,
    None,
}

/// Computed `visibility` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// The slice of an element's computed style used for visibility filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
}

impl ComputedStyle {
    /// Style of an element removed from layout (`display: none`)
    #[cfg(test)]
    pub fn display_none() -> Self {
        Self {
            display: Display::None,
            ..Self::default()
        }
    }

    /// Style of an element laid out but not painted (`visibility: hidden`)
    #[cfg(test)]
    pub fn visibility_hidden() -> Self {
        Self {
            visibility: Visibility::Hidden,
            ..Self::default()
        }
    }

    /// True if text directly inside this element is not rendered
    pub fn is_hidden(&self) -> bool {
        self.display == Display::None || self.visibility == Visibility::Hidden
    }
}

/// One node of a document tree: an element, a text node, or anything else
/// (comments, doctype), which only matters for its children.
pub trait DomNode: Sized {
    /// Lowercase tag name, `None` unless this node is an element
    fn tag(&self) -> Option<&str>;

    /// Text value, `None` unless this node is a text node
    fn text(&self) -> Option<&str>;

    /// Computed style; only meaningful for elements
    fn style(&self) -> ComputedStyle;

    /// Nearest element ancestor
    fn parent_element(&self) -> Option<Self>;

    /// Children in document order
    fn children(&self) -> Vec<Self>;
}

/// Document-level queries needed to build a page descriptor.
pub trait PageDocument {
    type Node<'a>: DomNode
    where
        Self: 'a;

    /// Root content node (the `<body>`)
    fn body(&self) -> Option<Self::Node<'_>>;

    /// Location of the page
    fn url(&self) -> &str;

    /// Document title, whitespace-collapsed; empty when there is none
    fn title(&self) -> String;

    /// `content` attribute of the first `<meta name="...">` with this name
    fn meta_content(&self, name: &str) -> Option<String>;

    /// Raw text content of every `h1`..`h6` in document order
    fn heading_texts(&self) -> Result<Vec<String>, ExtractError>;

    /// Text content of the first element matching `selector`
    fn first_text_content(&self, selector: &str) -> Result<Option<String>, ExtractError>;
}
