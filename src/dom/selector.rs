//! Best-effort unique CSS selector for a picked element.
//!
//! The generator climbs from the element towards `<body>`, emitting one
//! segment per level: an `#id` ends the walk, a class-qualified tag is used
//! when it singles the element out among its siblings, and `:nth-child()`
//! disambiguates the rest. Segments are joined with the child combinator.

use crate::dom::css::escape_identifier;
use crate::error::Result;
use std::collections::VecDeque;

/// The DOM traversal capability the selector generator needs
pub trait DomNode: Clone + PartialEq {
    /// Tag name; compared case-insensitively
    fn tag_name(&self) -> &str;

    fn element_id(&self) -> Option<&str>;

    /// Raw `class` attribute, or `None` when it is absent or not a plain
    /// string (SVG `className`)
    fn class_name(&self) -> Option<&str>;

    fn parent_node(&self) -> Option<Self>;

    /// Element children of this node, in document order
    fn child_nodes(&self) -> Vec<Self>;

    /// `Element.matches()`; fails on a selector the engine cannot parse
    fn matches(&self, selector: &str) -> Result<bool>;

    /// True for `<html>` and `<body>`, where the walk stops
    fn is_document_boundary(&self) -> bool;
}

/// Generate a CSS selector that resolves back to `node`
pub fn generate_selector<N: DomNode>(node: &N) -> String {
    let mut parts = VecDeque::new();
    let mut current = node.clone();

    while !current.is_document_boundary() {
        if let Some(id) = current.element_id().filter(|id| !id.is_empty()) {
            parts.push_front(format!("#{}", escape_identifier(id)));
            break;
        }

        let tag = current.tag_name().to_ascii_lowercase();
        let Some(parent) = current.parent_node() else {
            parts.push_front(tag);
            break;
        };
        let siblings = parent.child_nodes();

        if let Some(segment) = unique_class_segment(&current, &tag, &siblings) {
            parts.push_front(segment);
            current = parent;
            continue;
        }

        let same_tag = siblings
            .iter()
            .filter(|s| s.tag_name().eq_ignore_ascii_case(&tag))
            .count();
        if same_tag > 1 {
            let position = siblings.iter().position(|s| *s == current).map_or(1, |i| i + 1);
            parts.push_front(format!("{}:nth-child({})", tag, position));
        } else {
            parts.push_front(tag);
        }

        current = parent;
    }

    Vec::from(parts).join(" > ")
}

/// `tag.class1.class2` when exactly one sibling matches it
fn unique_class_segment<N: DomNode>(node: &N, tag: &str, siblings: &[N]) -> Option<String> {
    let classes: Vec<&str> = node.class_name()?.split_whitespace().collect();
    if classes.is_empty() {
        return None;
    }

    let escaped: Vec<String> = classes.iter().map(|c| escape_identifier(c)).collect();
    let segment = format!("{}.{}", tag, escaped.join("."));

    let matching = siblings
        .iter()
        .filter(|sibling| match sibling.matches(&segment) {
            Ok(matched) => matched,
            Err(e) => {
                log::debug!("Sibling match failed for '{}': {}", segment, e);
                false
            }
        })
        .count();

    (matching == 1).then_some(segment)
}
