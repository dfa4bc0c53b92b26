//! Chat message formatting.
//!
//! Messages use a small markdown dialect. They are rendered by running a
//! fixed list of regex rewrites one after another, each over the output of
//! the previous one. The order matters: emphasis runs before bullets, so a
//! line like `* *a*` keeps its bullet and gets an emphasized `a`.

use crate::transcript::MessageInput;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

/// `(name, pattern, replacement)` in application order
const STAGES: &[(&str, &str, &str)] = &[
    ("h3", r"(?m)^### (.*)$", "<strong>$1</strong>"),
    ("h2", r"(?m)^## (.*)$", "<strong>$1</strong>"),
    ("h1", r"(?m)^# (.*)$", "<strong>$1</strong>"),
    ("bold", r"\*\*(.*?)\*\*", "<strong>$1</strong>"),
    ("italic", r"\*([^\s*](?:[^*\n]*?[^\s*])?)\*", "<em>$1</em>"),
    ("italic_underscore", r"\b_([^\s_](?:[^_\n]*?[^\s_])?)_\b", "<em>$1</em>"),
    ("inline_code", r"`([^`\n]+)`", "<code>$1</code>"),
    ("code_block", r"(?s)```(.*?)```", "<pre><code>$1</code></pre>"),
    ("bullet", r"(?m)^[-*] (.*)$", "• $1"),
    ("paragraph", r"\n{2,}", "<br><br>"),
    ("line_break", r"\n", "<br>"),
];

static DEFAULT_FORMATTER: LazyLock<Formatter> = LazyLock::new(Formatter::default);

/// One global pattern rewrite
#[derive(Debug)]
struct Stage {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

/// Ordered rewrite pipeline from message markdown to display markup
#[derive(Debug)]
pub struct Formatter {
    stages: Vec<Stage>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new().expect("Built-in markup patterns should be valid")
    }
}

impl Formatter {
    /// Compiles the rewrite stages
    pub fn new() -> Result<Self, regex::Error> {
        let mut stages = Vec::with_capacity(STAGES.len());
        for &(name, pattern, replacement) in STAGES {
            stages.push(Stage {
                name,
                pattern: Regex::new(pattern)?,
                replacement,
            });
        }
        Ok(Self { stages })
    }

    /// Runs every stage over `input`, in order
    pub fn format(&self, input: &str) -> String {
        let mut output = input.to_string();
        for stage in &self.stages {
            let rewritten = match stage.pattern.replace_all(&output, stage.replacement) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(rewritten) => rewritten,
            };
            ::log::trace!("Markup stage {} rewrote the message", stage.name);
            output = rewritten;
        }
        output
    }
}

/// Formats a message with the built-in pipeline
pub fn format_message(input: &str) -> String {
    DEFAULT_FORMATTER.format(input)
}

/// Formats a message received as JSON.
///
/// Bare strings, `{role, content}` entries and `{response}` replies are
/// accepted alike; anything else renders as an empty string.
pub fn format_value(value: &Value) -> String {
    match MessageInput::from_value(value) {
        Some(input) => format_message(input.content()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input() {
        assert_eq!(format_message(""), "");
    }

    #[test]
    fn test_headings_render_as_strong() {
        assert_eq!(format_message("# One"), "<strong>One</strong>");
        assert_eq!(format_message("## Two"), "<strong>Two</strong>");
        assert_eq!(format_message("### Three"), "<strong>Three</strong>");
        assert_eq!(format_message("#### Four"), "#### Four");
        assert_eq!(format_message("not # heading"), "not # heading");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            format_message("**bold** and *italic* and _under_"),
            "<strong>bold</strong> and <em>italic</em> and <em>under</em>"
        );
        assert_eq!(format_message("snake_case_name"), "snake_case_name");
        assert_eq!(format_message("2 * 3 * 4"), "2 * 3 * 4");
    }

    #[test]
    fn test_bold_takes_any_span_between_markers() {
        assert_eq!(
            format_message("** spaced **"),
            "<strong> spaced </strong>"
        );
        assert_eq!(format_message("a **** b"), "a <strong></strong> b");
    }

    #[test]
    fn test_code_spans_and_blocks() {
        assert_eq!(format_message("run `cargo`"), "run <code>cargo</code>");
        assert_eq!(
            format_message("```\nfn main() {}\n```"),
            "<pre><code><br>fn main() {}<br></code></pre>"
        );
    }

    #[test]
    fn test_bullets() {
        assert_eq!(format_message("- one\n* two"), "• one<br>• two");
    }

    #[test]
    fn test_bullet_star_with_emphasis_keeps_stage_order() {
        assert_eq!(format_message("* *a*"), "• <em>a</em>");
    }

    #[test]
    fn test_newlines() {
        assert_eq!(format_message("a\n\n\nb\nc"), "a<br><br>b<br>c");
    }

    #[test]
    fn test_end_to_end_message() {
        let output = format_message("# Title\n\n**bold** and *italic*\n- item1\n- item2");
        assert_eq!(
            output,
            "<strong>Title</strong><br><br><strong>bold</strong> and <em>italic</em><br>• item1<br>• item2"
        );
        for token in ['#', '*', '-'] {
            assert!(!output.contains(token), "residual {token} in {output}");
        }
    }

    #[test]
    fn test_formatting_markup_is_a_no_op() {
        let markup = "<strong>Title</strong><br><br><em>x</em> and <code>y</code><br>• item";
        assert_eq!(format_message(markup), markup);
        let once = format_message("## Heading\n**a** *b*\n- c");
        assert_eq!(format_message(&once), once);
    }

    #[test]
    fn test_format_value_accepts_every_message_shape() {
        assert_eq!(format_value(&json!("**hi**")), "<strong>hi</strong>");
        assert_eq!(
            format_value(&json!({ "role": "bot", "content": "*hi*" })),
            "<em>hi</em>"
        );
        assert_eq!(format_value(&json!({ "response": "a\nb" })), "a<br>b");
        assert_eq!(format_value(&json!(42)), "");
        assert_eq!(format_value(&json!(null)), "");
        assert_eq!(format_value(&json!({ "other": true })), "");
    }
}
