//! DOM snapshot model and selector generation
//!
//! This module provides functionality for working with the DOM structure
//! of a picked page. It includes:
//! - ElementNode: Representation of DOM elements as exported from the page
//! - DomTree: Arena of the snapshot with parent links
//! - generate_selector: Stable CSS selector for a picked element
//! - ElementDescriptor: The element section of the report

pub mod css;
pub mod descriptor;
pub mod element;
pub mod selector;
pub mod tree;

pub use descriptor::{ElementDescriptor, collapse_text};
pub use element::{BoundingBox, ElementNode};
pub use selector::{DomNode, generate_selector};
pub use tree::{DomTree, FlatElement, NodeId, NodeRef};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_export() {
        let element = ElementNode::new("div");
        assert_eq!(element.tag_name, "div");
    }

    #[test]
    fn test_dom_tree_export() {
        let root = ElementNode::new("html").with_children(vec![ElementNode::new("body")]);
        let tree = DomTree::new(root);
        assert_eq!(tree.root().element().tag_name, "html");
        assert_eq!(generate_selector(&tree.root()), "");
    }
}
