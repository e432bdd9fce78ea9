use crate::dom::css::{CompoundSelector, SelectorChain};
use crate::dom::element::ElementNode;
use crate::dom::selector::DomNode;
use crate::error::Result;
use serde::Deserialize;

/// Index of a node inside a [`DomTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct DomEntry {
    /// The element with its `children` moved into the arena
    element: ElementNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One element of the page export: the element itself (without children)
/// and the position of its parent in the export. Parents come first.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatElement {
    #[serde(flatten)]
    pub element: ElementNode,
    #[serde(default)]
    pub parent: Option<usize>,
}

/// Snapshot of a page's DOM, flattened into an arena with parent links so
/// that the picked element can be walked upwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Vec<FlatElement>")]
pub struct DomTree {
    entries: Vec<DomEntry>,
}

impl From<ElementNode> for DomTree {
    fn from(root: ElementNode) -> Self {
        Self::new(root)
    }
}

impl TryFrom<Vec<FlatElement>> for DomTree {
    type Error = String;

    fn try_from(elements: Vec<FlatElement>) -> std::result::Result<Self, Self::Error> {
        Self::from_flat(elements)
    }
}

impl DomTree {
    /// Build a tree from its root element (normally `<html>`)
    pub fn new(root: ElementNode) -> Self {
        let mut tree = Self { entries: Vec::new() };
        let mut pending = vec![(root, None)];

        // Preorder without recursion; siblings are pushed in reverse
        while let Some((mut element, parent)) = pending.pop() {
            let children = std::mem::take(&mut element.children);
            let id = tree.attach(element, parent);
            pending.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }
        tree
    }

    /// Build a tree from the page export. The first element is the root;
    /// every other element must name an earlier element as its parent.
    pub fn from_flat(elements: Vec<FlatElement>) -> std::result::Result<Self, String> {
        let mut tree = Self {
            entries: Vec::with_capacity(elements.len()),
        };

        for (index, flat) in elements.into_iter().enumerate() {
            let parent = match (index, flat.parent) {
                (0, None) => None,
                (0, Some(_)) => return Err("root element cannot have a parent".to_string()),
                (_, Some(parent)) if parent < index => Some(NodeId(parent)),
                (_, parent) => {
                    return Err(format!("element {} has invalid parent {:?}", index, parent));
                }
            };
            tree.attach(flat.element, parent);
        }

        if tree.entries.is_empty() {
            return Err("DOM export is empty".to_string());
        }
        Ok(tree)
    }

    fn attach(&mut self, mut element: ElementNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.entries.len());
        element.children.clear();
        self.entries.push(DomEntry {
            element,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.entries[parent.0].children.push(id);
        }
        id
    }

    /// Root element of the tree
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { tree: self, id: NodeId(0) }
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.entries.len()).then_some(NodeRef { tree: self, id })
    }

    /// Count total elements in the tree
    pub fn count_elements(&self) -> usize {
        self.entries.len()
    }

    /// All elements in document order
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.entries.len()).map(move |i| NodeRef { tree: self, id: NodeId(i) })
    }

    /// Follow child positions from the root
    pub fn find_by_path(&self, path: &[usize]) -> Option<NodeRef<'_>> {
        path.iter().try_fold(self.root(), |node, &position| {
            let child = *self.entries[node.id.0].children.get(position)?;
            self.node(child)
        })
    }

    /// First element carrying the given `id` attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeRef<'_>> {
        self.nodes().find(|node| node.element().id().is_some_and(|v| v == id))
    }

    /// Elements matching a selector, in document order
    pub fn select(&self, selector: &str) -> Result<Vec<NodeRef<'_>>> {
        let chain = SelectorChain::parse(selector)?;
        Ok(self.nodes().filter(|node| node.matches_chain(&chain)).collect())
    }

    /// First element matching a selector
    pub fn select_first(&self, selector: &str) -> Result<Option<NodeRef<'_>>> {
        let chain = SelectorChain::parse(selector)?;
        Ok(self.nodes().find(|node| node.matches_chain(&chain)))
    }
}

/// Borrowed handle to one element of a [`DomTree`]
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a DomTree,
    id: NodeId,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.tree, other.tree)
    }
}

impl<'a> NodeRef<'a> {
    fn entry(&self) -> &'a DomEntry {
        &self.tree.entries[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The element data (its `children` list is empty; use [`NodeRef::children`])
    pub fn element(&self) -> &'a ElementNode {
        &self.entry().element
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.entry().parent.map(|id| NodeRef { tree: self.tree, id })
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.entry().children.iter().map(move |&id| NodeRef { tree, id })
    }

    /// 0-based position among the parent's element children
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent.entry().children.iter().position(|&id| id == self.id)
    }

    fn matches_compound(&self, compound: &CompoundSelector) -> bool {
        let element = self.element();

        if let Some(tag) = &compound.tag {
            if !element.is_tag(tag) {
                return false;
            }
        }
        if !compound.ids.iter().all(|id| element.id() == Some(id)) {
            return false;
        }
        if !compound.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }
        match compound.nth_child {
            Some(position) => self.index_in_parent().map(|i| i + 1) == Some(position),
            None => true,
        }
    }

    /// Match a child-combinator chain with this node as the subject
    pub fn matches_chain(&self, chain: &SelectorChain) -> bool {
        let mut current = Some(*self);
        for compound in chain.compounds().iter().rev() {
            match current {
                Some(node) if node.matches_compound(compound) => current = node.parent(),
                _ => return false,
            }
        }
        true
    }
}

impl DomNode for NodeRef<'_> {
    fn tag_name(&self) -> &str {
        &self.element().tag_name
    }

    fn element_id(&self) -> Option<&str> {
        self.element().id().map(String::as_str)
    }

    fn class_name(&self) -> Option<&str> {
        let element = self.element();
        if element.foreign {
            return None;
        }
        element.get_attribute("class").map(String::as_str)
    }

    fn parent_node(&self) -> Option<Self> {
        self.parent()
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children().collect()
    }

    fn matches(&self, selector: &str) -> Result<bool> {
        let chain = SelectorChain::parse(selector)?;
        Ok(self.matches_chain(&chain))
    }

    fn is_document_boundary(&self) -> bool {
        match self.parent() {
            None => self.element().is_tag("html"),
            Some(parent) => {
                self.element().is_tag("body") && parent.parent().is_none() && parent.element().is_tag("html")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tree() -> DomTree {
        let list = ElementNode::new("ul").with_attribute("class", "menu").with_children(vec![
            ElementNode::new("li").with_attribute("data-label", "One"),
            ElementNode::new("li").with_attribute("class", "active").with_attribute("data-label", "Two"),
            ElementNode::new("li").with_attribute("data-label", "Three"),
        ]);
        let body = ElementNode::new("body").with_children(vec![
            ElementNode::new("header").with_attribute("id", "top"),
            ElementNode::new("main").with_children(vec![list]),
        ]);
        let html = ElementNode::new("html").with_children(vec![ElementNode::new("head"), body]);
        DomTree::new(html)
    }

    #[test]
    fn test_dom_tree_creation() {
        let tree = create_test_tree();

        assert_eq!(tree.root().element().tag_name, "html");
        assert_eq!(tree.root().children().count(), 2);
        // html, head, body, header, main, ul, li x3
        assert_eq!(tree.count_elements(), 9);
    }

    #[test]
    fn test_document_order() {
        let tree = create_test_tree();
        let tags: Vec<_> = tree.nodes().map(|n| n.element().tag_name.clone()).collect();
        assert_eq!(tags, vec!["html", "head", "body", "header", "main", "ul", "li", "li", "li"]);
    }

    #[test]
    fn test_find_by_path() {
        let tree = create_test_tree();
        let second_item = tree.find_by_path(&[1, 1, 0, 1]).unwrap();

        assert_eq!(second_item.element().get_attribute("data-label").map(String::as_str), Some("Two"));
        assert_eq!(second_item.index_in_parent(), Some(1));
        assert!(tree.find_by_path(&[1, 7]).is_none());
        assert_eq!(tree.find_by_path(&[]).unwrap(), tree.root());
    }

    #[test]
    fn test_find_by_id() {
        let tree = create_test_tree();
        assert!(tree.find_by_id("top").unwrap().element().is_tag("header"));
        assert!(tree.find_by_id("missing").is_none());
    }

    #[test]
    fn test_select() {
        let tree = create_test_tree();

        assert_eq!(tree.select("li").unwrap().len(), 3);
        assert_eq!(tree.select("ul.menu > li:nth-child(3)").unwrap().len(), 1);
        assert_eq!(tree.select("main > li").unwrap().len(), 0);

        let active = tree.select_first("li.active").unwrap().unwrap();
        assert_eq!(active.element().get_attribute("data-label").map(String::as_str), Some("Two"));
        assert!(tree.select("li:hover").is_err());
    }

    #[test]
    fn test_document_boundary() {
        let tree = create_test_tree();
        assert!(tree.root().is_document_boundary());
        assert!(tree.find_by_path(&[1]).unwrap().is_document_boundary());
        assert!(!tree.find_by_path(&[1, 0]).unwrap().is_document_boundary());

        let fragment = DomTree::new(ElementNode::new("body"));
        assert!(!fragment.root().is_document_boundary());
    }

    #[test]
    fn test_foreign_class_name_hidden() {
        let html = ElementNode::new("html").with_children(vec![ElementNode::new("body").with_children(vec![
            ElementNode::new("svg").with_attribute("class", "icon").with_foreign(true),
        ])]);
        let tree = DomTree::new(html);
        let svg = tree.find_by_path(&[0, 0]).unwrap();

        assert_eq!(svg.class_name(), None);
        assert!(svg.element().has_class("icon"));
    }

    #[test]
    fn test_deserialize_flat_export() {
        let json = r#"[
            {"tag_name":"html"},
            {"tag_name":"head","parent":0},
            {"tag_name":"body","parent":0},
            {"tag_name":"p","parent":2,"attributes":{"class":"lead"}},
            {"tag_name":"svg","parent":2,"foreign":true}
        ]"#;
        let tree: DomTree = serde_json::from_str(json).unwrap();

        assert_eq!(tree.count_elements(), 5);
        let lead = tree.find_by_path(&[1, 0]).unwrap();
        assert!(lead.element().has_class("lead"));
        assert!(lead.element().children.is_empty());
        assert!(tree.find_by_path(&[1, 1]).unwrap().element().foreign);
        assert_eq!(tree.find_by_path(&[1]).unwrap().children().count(), 2);
    }

    #[test]
    fn test_flat_export_rejects_bad_parents() {
        for json in [
            r#"[]"#,
            r#"[{"tag_name":"html","parent":0}]"#,
            r#"[{"tag_name":"html"},{"tag_name":"body"}]"#,
            r#"[{"tag_name":"html"},{"tag_name":"body","parent":1}]"#,
            r#"[{"tag_name":"html"},{"tag_name":"body","parent":5}]"#,
        ] {
            assert!(serde_json::from_str::<DomTree>(json).is_err(), "accepted {}", json);
        }
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 5_000;
        let mut flat = vec![serde_json::json!({"tag_name": "html"}), serde_json::json!({"tag_name": "body", "parent": 0})];
        for level in 0..depth {
            flat.push(serde_json::json!({"tag_name": "div", "parent": level + 1}));
        }
        let tree: DomTree = serde_json::from_value(serde_json::Value::Array(flat)).unwrap();
        assert_eq!(tree.count_elements(), depth + 2);

        let mut nested = ElementNode::new("span");
        for _ in 0..depth {
            nested = ElementNode::new("div").with_children(vec![nested]);
        }
        let built = DomTree::new(ElementNode::new("html").with_children(vec![nested]));
        assert_eq!(built.count_elements(), depth + 2);
        assert!(built.find_by_path(&vec![0; depth + 1]).unwrap().element().is_tag("span"));
    }
}
