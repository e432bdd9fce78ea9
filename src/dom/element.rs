use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One element of the exported page tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// Lowercase tag name (e.g., "div", "button", "svg")
    pub tag_name: String,

    /// Element attributes in document order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Child elements. Past the export budget, elements off the picked
    /// element's ancestor line come without their subtrees.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Set for elements whose `className` is not a plain string (SVG and
    /// other foreign content expose an animated string object instead)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub foreign: bool,

    /// Bounding box in CSS pixels, only exported for the picked element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Viewport-relative rectangle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            foreign: false,
            bounding_box: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Mark as foreign content (non-string `className`)
    pub fn with_foreign(mut self, foreign: bool) -> Self {
        self.foreign = foreign;
        self
    }

    pub fn with_bounding_box(mut self, rect: BoundingBox) -> Self {
        self.bounding_box = Some(rect);
        self
    }

    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.class_list().any(|c| c == class_name)
    }

    /// Whitespace-separated class tokens
    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|classes| classes.split_whitespace())
            .into_iter()
            .flatten()
    }

    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Whether the box has any area
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Scale from CSS pixels to device pixels
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}
