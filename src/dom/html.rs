use crate::dom::{ComputedStyle, Display, DomNode, PageDocument, Visibility};
use crate::error::ExtractError;
use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::{Html, Selector};

/// Elements the user agent stylesheet never renders
const UA_HIDDEN_TAGS: &[&str] = &[
    "head", "title", "meta", "link", "base", "script", "style", "template",
];

/// Parsed HTML page standing in for the live document
pub struct HtmlDocument {
    html: Html,
    url: String,
}

impl HtmlDocument {
    /// Parses a full page source fetched from `url`
    pub fn parse(source: &str, url: impl Into<String>) -> Self {
        let html = Html::parse_document(source);
        Self {
            html,
            url: url.into(),
        }
    }

    fn selector(selector: &str) -> Result<Selector, ExtractError> {
        Selector::parse(selector).map_err(|e| ExtractError::Selector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }
}

impl PageDocument for HtmlDocument {
    type Node<'a> = HtmlNode<'a>;

    fn body(&self) -> Option<HtmlNode<'_>> {
        let body = Self::selector("body").ok()?;
        self.html.select(&body).next().map(|el| HtmlNode(*el))
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> String {
        let Ok(title) = Self::selector("title") else {
            return String::new();
        };
        self.html
            .select(&title)
            .next()
            .map(|el| {
                el.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    fn meta_content(&self, name: &str) -> Option<String> {
        let selector = Self::selector(&format!("meta[name=\"{name}\"]")).ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.value().attr("content").unwrap_or_default().to_string())
    }

    fn heading_texts(&self) -> Result<Vec<String>, ExtractError> {
        let headings = Self::selector("h1, h2, h3, h4, h5, h6")?;
        Ok(self
            .html
            .select(&headings)
            .map(|el| el.text().collect::<String>())
            .collect())
    }

    fn first_text_content(&self, selector: &str) -> Result<Option<String>, ExtractError> {
        let selector = Self::selector(selector)?;
        Ok(self
            .html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>()))
    }
}

/// A node of a parsed HTML tree
#[derive(Clone, Copy)]
pub struct HtmlNode<'a>(NodeRef<'a, Node>);

impl DomNode for HtmlNode<'_> {
    fn tag(&self) -> Option<&str> {
        self.0.value().as_element().map(|el| el.name())
    }

    fn text(&self) -> Option<&str> {
        self.0.value().as_text().map(|text| &**text)
    }

    fn style(&self) -> ComputedStyle {
        let Some(element) = self.0.value().as_element() else {
            return ComputedStyle::default();
        };
        ComputedStyle {
            display: display_of(element),
            visibility: self.inherited_visibility(),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        self.0
            .parent()
            .filter(|parent| parent.value().is_element())
            .map(HtmlNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children().map(HtmlNode).collect()
    }
}

impl HtmlNode<'_> {
    /// `visibility` inherits, so the closest element that declares it wins
    fn inherited_visibility(&self) -> Visibility {
        std::iter::once(self.0)
            .chain(self.0.ancestors())
            .filter_map(|node| node.value().as_element())
            .find_map(|el| inline_declaration(el, "visibility"))
            .map(|value| match value.as_str() {
                "hidden" | "collapse" => Visibility::Hidden,
                _ => Visibility::Visible,
            })
            .unwrap_or_default()
    }
}

fn display_of(element: &Element) -> Display {
    if element.attr("hidden").is_some() || UA_HIDDEN_TAGS.contains(&element.name()) {
        return Display::None;
    }
    match inline_declaration(element, "display").as_deref() {
        Some("none") => Display::None,
        _ => Display::Rendered,
    }
}

/// Last value declared for `property` in the element's `style` attribute
fn inline_declaration(element: &Element, property: &str) -> Option<String> {
    element
        .attr("style")?
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| {
            value
                .trim()
                .trim_end_matches("!important")
                .trim()
                .to_ascii_lowercase()
        })
        .last()
}
