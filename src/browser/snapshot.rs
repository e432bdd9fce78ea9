//! One-shot export of the page state needed to inspect an element.
//!
//! `page_snapshot.js` runs in the page and returns, as one JSON string, the
//! element tree, the probed globals and the object graph hanging off the
//! picked element. Everything after that (selector generation, framework
//! detection, component collection) runs here against the snapshot.

use crate::dom::{BoundingBox, DomNode, DomTree, ElementDescriptor, NodeRef, generate_selector};
use crate::error::{BrowserError, Result};
use crate::framework::{
    self, ComponentNode, FrameworkSignal, InheritedKey, PageProbe, collect_component, detect_framework,
};
use crate::inspect::{Heap, ObjectId};
use crate::protocol::CollectResult;
use crate::report::{ReportInput, compose_report};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Export budgets applied by the page script
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotOptions {
    /// Objects expanded from the picked element before the rest become stubs
    pub max_objects: usize,
    /// Own keys exported per object
    pub max_keys: usize,
    /// Items exported per array
    pub max_array_items: usize,
    /// Hops from the nearest parent-link object before objects become stubs
    pub max_branch_depth: usize,
    /// Elements exported with their children
    pub max_dom_nodes: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            max_objects: 4000,
            max_keys: 64,
            max_array_items: 32,
            max_branch_depth: 6,
            max_dom_nodes: 20_000,
        }
    }
}

impl SnapshotOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

    pub fn max_dom_nodes(mut self, max_dom_nodes: usize) -> Self {
        self.max_dom_nodes = max_dom_nodes;
        self
    }
}

/// How to find the element to inspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PickTarget {
    /// First element matching a CSS selector
    Css { selector: String },
    /// Position in `document.querySelectorAll('*')`
    Index { index: usize },
}

impl PickTarget {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    pub fn index(index: usize) -> Self {
        Self::Index { index }
    }
}

#[derive(Debug, Serialize)]
struct SnapshotRequest<'a> {
    target: Option<&'a PickTarget>,
    globals: Vec<&'static str>,
    spine_keys: Vec<&'static str>,
    inherited_keys: Vec<InheritedKey>,
    limits: &'a SnapshotOptions,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SnapshotReply {
    Found(Box<PageSnapshot>),
    NotFound { message: String },
    Failed { message: String },
}

/// Result of probing the page globals
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalsProbe {
    /// Globals that were truthy
    #[serde(default)]
    pub present: Vec<String>,
    /// Globals whose read threw
    #[serde(default)]
    pub failed: Vec<String>,
}

/// Page state exported by the snapshot script
#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub dom: DomTree,
    #[serde(default = "default_pixel_ratio")]
    pub device_pixel_ratio: f64,
    #[serde(default)]
    pub globals: GlobalsProbe,

    /// Child positions from `<html>` to the picked element
    #[serde(default)]
    pub target_path: Option<Vec<usize>>,
    /// The picked element's rendered text
    #[serde(default)]
    pub target_text: String,
    #[serde(default)]
    pub heap: Heap,
    /// The picked element inside [`PageSnapshot::heap`]
    #[serde(default)]
    pub target_object: Option<ObjectId>,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

impl PageSnapshot {
    /// Build the script that snapshots the page for `target`
    pub fn script(target: Option<&PickTarget>, options: &SnapshotOptions) -> Result<String> {
        let request = SnapshotRequest {
            target,
            globals: framework::probed_globals(),
            spine_keys: framework::spine_keys(),
            inherited_keys: framework::inherited_keys(),
            limits: options,
        };
        let request = serde_json::to_string(&request)?;
        Ok(format!("{}({})", include_str!("page_snapshot.js").trim_end(), request))
    }

    /// Decode the JSON string returned by [`PageSnapshot::script`]
    pub fn from_json(json: &str) -> Result<Self> {
        let reply: SnapshotReply =
            serde_json::from_str(json).map_err(|e| BrowserError::SnapshotFailed(format!("Failed to parse snapshot: {}", e)))?;

        match reply {
            SnapshotReply::Found(snapshot) => Ok(*snapshot),
            SnapshotReply::NotFound { message } => Err(BrowserError::ElementNotFound(message)),
            SnapshotReply::Failed { message } => Err(BrowserError::SnapshotFailed(message)),
        }
    }

    /// The picked element, if the snapshot was taken for one
    pub fn target(&self) -> Option<NodeRef<'_>> {
        self.dom.find_by_path(self.target_path.as_deref()?)
    }

    /// Picked element bounds in CSS pixels
    pub fn target_rect(&self) -> Option<BoundingBox> {
        self.target()?.element().bounding_box
    }

    pub fn detect_framework(&self) -> Option<FrameworkSignal> {
        detect_framework(self)
    }

    /// Describe the picked element and collect its component
    pub fn inspect(&self) -> Result<Inspection> {
        let node = self
            .target()
            .ok_or_else(|| BrowserError::ElementNotFound("Snapshot was taken without a target".to_string()))?;

        let selector = generate_selector(&node);
        match self.dom.select_first(&selector) {
            Ok(Some(found)) if found == node => {}
            Ok(_) => log::warn!("Selector '{}' does not resolve back to the picked element", selector),
            Err(e) => log::warn!("Generated selector '{}' could not be parsed: {}", selector, e),
        }
        log::debug!("Picked <{}> as '{}'", node.element().tag_name, selector);

        let element = ElementDescriptor::describe(node.element(), selector, &self.target_text);
        let framework = self.detect_framework();
        let component = self
            .target_object
            .and_then(|id| collect_component(&self.heap, id, framework.as_ref()));

        Ok(Inspection {
            url: self.url.clone(),
            title: self.title.clone(),
            framework,
            element,
            component,
            bounding_box: node.element().bounding_box,
            device_pixel_ratio: self.device_pixel_ratio,
        })
    }
}

impl PageProbe for PageSnapshot {
    fn has_global(&self, name: &str) -> Result<bool> {
        if self.globals.failed.iter().any(|g| g == name) {
            return Err(BrowserError::EvaluationFailed(format!("Reading window.{} threw", name)));
        }
        Ok(self.globals.present.iter().any(|g| g == name))
    }

    fn has_element_id(&self, id: &str) -> Result<bool> {
        Ok(self.dom.find_by_id(id).is_some())
    }

    fn has_script_src(&self, fragment: &str) -> Result<bool> {
        Ok(self.dom.nodes().any(|node| {
            node.tag_name() == "script" && node.element().get_attribute("src").is_some_and(|src| src.contains(fragment))
        }))
    }
}

/// Everything learned about one picked element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub url: String,
    pub title: String,
    pub framework: Option<FrameworkSignal>,
    pub element: ElementDescriptor,
    pub component: Option<ComponentNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    pub device_pixel_ratio: f64,
}

impl Inspection {
    /// Markdown report for this element
    pub fn report(&self, instruction: &str) -> String {
        compose_report(&ReportInput {
            instruction,
            page_url: &self.url,
            page_title: &self.title,
            framework: self.framework.as_ref(),
            element: &self.element,
            component: self.component.as_ref(),
        })
    }

    /// The page's answer as exchanged with the inspector
    pub fn collect_result(&self) -> CollectResult {
        CollectResult {
            framework: self.framework,
            component: self.component.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{BaseFramework, MetaFramework, Origin};
    use serde_json::json;

    fn react_page() -> serde_json::Value {
        json!({
            "status": "found",
            "url": "http://localhost:3000/",
            "title": "Shop",
            "device_pixel_ratio": 2,
            "globals": {"present": ["__REACT_DEVTOOLS_GLOBAL_HOOK__"], "failed": []},
            "dom": [
                {"tag_name": "html"},
                {"tag_name": "head", "parent": 0},
                {"tag_name": "script", "attributes": {"src": "/_next/static/chunks/main.js"}, "parent": 1},
                {"tag_name": "body", "parent": 0},
                {"tag_name": "div", "attributes": {"id": "__next"}, "parent": 3},
                {"tag_name": "button", "attributes": {"class": "btn"}, "parent": 4},
                {"tag_name": "button", "attributes": {"class": "btn primary", "data-testid": "buy"}, "parent": 4,
                 "bounding_box": {"x": 10, "y": 20, "width": 100, "height": 30}}
            ],
            "target_path": [1, 0, 1],
            "target_text": "  Buy\n now ",
            "target_object": 0,
            "heap": {"objects": [
                {"kind": "element", "tag": "button", "properties": [["__reactFiber$abc", {"t": "ref", "v": 1}]]},
                {"kind": "object", "properties": [
                    ["tag", {"t": "number", "v": 5}],
                    ["type", {"t": "string", "v": "button"}],
                    ["return", {"t": "ref", "v": 2}]
                ]},
                {"kind": "object", "properties": [
                    ["tag", {"t": "number", "v": 0}],
                    ["type", {"t": "ref", "v": 3}],
                    ["memoizedProps", {"t": "ref", "v": 4}],
                    ["memoizedState", {"t": "null"}],
                    ["return", {"t": "null"}]
                ]},
                {"kind": "function", "properties": [["name", {"t": "string", "v": "BuyButton"}]]},
                {"kind": "object", "properties": [["sku", {"t": "string", "v": "A-1"}]]}
            ]}
        })
    }

    fn snapshot(value: serde_json::Value) -> Result<PageSnapshot> {
        PageSnapshot::from_json(&value.to_string())
    }

    #[test]
    fn test_inspect_react_page() {
        let page = snapshot(react_page()).unwrap();
        let inspection = page.inspect().unwrap();

        assert_eq!(inspection.element.selector, "#__next > button.btn.primary");
        assert_eq!(inspection.element.tag, "button");
        assert_eq!(inspection.element.text, "Buy now");
        assert_eq!(inspection.element.attributes["data-testid"], "buy");
        assert_eq!(
            inspection.framework,
            Some(FrameworkSignal {
                base: Some(BaseFramework::React),
                meta: Some(MetaFramework::Next),
            })
        );

        let component = inspection.component.as_ref().unwrap();
        assert_eq!(component.origin, Origin::React);
        assert_eq!(component.hierarchy, vec!["BuyButton"]);
        assert_eq!(inspection.bounding_box.unwrap().width, 100.0);
        assert_eq!(inspection.device_pixel_ratio, 2.0);

        let report = inspection.report("");
        assert!(report.contains("- **Props**: `{ sku: \"A-1\" }`"));
    }

    #[test]
    fn test_inspect_deeply_nested_element() {
        let depth = 200;
        let mut dom = vec![json!({"tag_name": "html"}), json!({"tag_name": "body", "parent": 0})];
        for level in 0..depth {
            dom.push(json!({"tag_name": "div", "attributes": {"class": "wrap"}, "parent": level + 1}));
        }
        dom.push(json!({"tag_name": "span", "attributes": {"class": "leaf"}, "parent": depth + 1}));

        let mut target_path = vec![0; depth + 1];
        target_path.insert(0, 1);
        let page = snapshot(json!({
            "status": "found",
            "url": "http://localhost/deep",
            "title": "Deep",
            "dom": dom,
            "target_path": target_path,
            "target_text": "leaf",
        }))
        .unwrap();

        assert_eq!(page.dom.count_elements(), depth + 3);
        let inspection = page.inspect().unwrap();
        assert_eq!(inspection.element.tag, "span");
        assert_eq!(inspection.element.text, "leaf");
        let resolved = page.dom.select_first(&inspection.element.selector).unwrap();
        assert_eq!(resolved, page.target());
        assert!(inspection.component.is_none());
    }

    #[test]
    fn test_snapshot_without_target() {
        let mut page = react_page();
        for key in ["target_path", "target_text", "target_object", "heap"] {
            page.as_object_mut().unwrap().remove(key);
        }
        let page = snapshot(page).unwrap();

        assert!(page.target().is_none());
        assert!(matches!(page.inspect(), Err(BrowserError::ElementNotFound(_))));
        assert_eq!(page.detect_framework().unwrap().base, Some(BaseFramework::React));
    }

    #[test]
    fn test_not_found_and_failed_replies() {
        let missing = snapshot(json!({"status": "not_found", "message": "No element matches"}));
        assert!(matches!(missing, Err(BrowserError::ElementNotFound(_))));

        let failed = snapshot(json!({"status": "failed", "message": "TypeError"}));
        assert!(matches!(failed, Err(BrowserError::SnapshotFailed(_))));

        assert!(matches!(PageSnapshot::from_json("[]"), Err(BrowserError::SnapshotFailed(_))));
    }

    #[test]
    fn test_throwing_global_is_an_error_probe() {
        let mut page = react_page();
        page["globals"] = json!({"present": [], "failed": ["__REACT_DEVTOOLS_GLOBAL_HOOK__"]});
        let page = snapshot(page).unwrap();

        assert!(page.has_global("__REACT_DEVTOOLS_GLOBAL_HOOK__").is_err());
        assert_eq!(page.detect_framework().unwrap().base, None);
    }

    #[test]
    fn test_script_embeds_request() {
        let script = PageSnapshot::script(Some(&PickTarget::css("#app")), &SnapshotOptions::default()).unwrap();
        assert!(script.starts_with("(function (request)"));
        assert!(script.contains(r##""target":{"selector":"#app"}"##));
        assert!(script.contains(r#""max_objects":4000"#));
        assert!(script.contains(r#""spine_keys":["return","next","parent","$parent"]"#));
        assert!(script.contains(r#"{"key":"name","under":"$options"}"#));
        assert!(script.contains(r#"{"key":"$props"}"#));

        let limited = SnapshotOptions::new().max_objects(50).max_dom_nodes(300);
        let script = PageSnapshot::script(None, &limited).unwrap();
        assert!(script.contains(r#""target":null"#));
        assert!(script.contains(r#""max_objects":50"#));
        assert!(script.contains(r#""max_dom_nodes":300"#));
    }

    #[test]
    fn test_pick_target_untagged() {
        let css: PickTarget = serde_json::from_value(json!({"selector": "main"})).unwrap();
        let index: PickTarget = serde_json::from_value(json!({"index": 12})).unwrap();
        assert_eq!(css, PickTarget::css("main"));
        assert_eq!(index, PickTarget::index(12));
    }
}
