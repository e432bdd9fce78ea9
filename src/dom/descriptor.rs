use crate::dom::element::ElementNode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Longest element text kept in a descriptor, in characters
pub const MAX_TEXT_CHARS: usize = 200;

/// Attributes reported for every element when present, in this order
const INTERESTING_ATTRIBUTES: &[&str] = &[
    "class",
    "id",
    "name",
    "type",
    "href",
    "src",
    "role",
    "aria-label",
    "aria-describedby",
    "data-testid",
];

/// What the report says about the picked element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDescriptor {
    pub selector: String,
    pub tag: String,
    pub text: String,
    pub attributes: IndexMap<String, String>,
}

impl ElementDescriptor {
    /// Describe an element given its generated selector and rendered text
    pub fn describe(element: &ElementNode, selector: impl Into<String>, inner_text: &str) -> Self {
        Self {
            selector: selector.into(),
            tag: element.tag_name.to_ascii_lowercase(),
            text: collapse_text(inner_text, MAX_TEXT_CHARS),
            attributes: reported_attributes(element),
        }
    }
}

/// Trim, collapse whitespace runs to one space, and cut to `max_chars`
/// characters with a trailing "..."
pub fn collapse_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

fn reported_attributes(element: &ElementNode) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();

    for &name in INTERESTING_ATTRIBUTES {
        if let Some(value) = element.get_attribute(name) {
            attributes.insert(name.to_string(), value.clone());
        }
    }

    for (name, value) in &element.attributes {
        if name.starts_with("data-") && !attributes.contains_key(name) {
            attributes.insert(name.clone(), value.clone());
        }
    }

    attributes
}
