use crate::dom::DomNode;

/// Elements whose text is never rendered as page content
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript"];

/// Collects the rendered text under `root`.
///
/// Text nodes are visited depth-first. A node is skipped when its parent
/// element is a script/style/noscript element or is itself hidden; only the
/// parent is checked, not the rest of the ancestor chain. Accepted fragments
/// are trimmed, empty ones dropped, and the rest joined with single spaces.
pub fn visible_text<N: DomNode>(root: &N) -> String {
    let mut fragments: Vec<String> = Vec::new();
    let mut stack = root.children();
    stack.reverse();

    while let Some(node) = stack.pop() {
        if let Some(text) = node.text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() && is_rendered(&node) {
                fragments.push(trimmed.to_string());
            }
            continue;
        }

        let mut children = node.children();
        children.reverse();
        stack.extend(children);
    }

    ::log::trace!("Walker accepted {} text fragments", fragments.len());
    fragments.join(" ").trim().to_string()
}

fn is_rendered<N: DomNode>(text_node: &N) -> bool {
    let Some(parent) = text_node.parent_element() else {
        return true;
    };
    if parent
        .tag()
        .is_some_and(|tag| NON_CONTENT_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t)))
    {
        return false;
    }
    !parent.style().is_hidden()
}
