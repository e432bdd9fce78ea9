//! Identity-preserving export of a page's JavaScript object graph.
//!
//! The page snapshot script walks the objects reachable from the picked
//! element and numbers each one the first time it is seen, so the same JS
//! object always maps to the same [`ObjectId`] and cycles survive the trip
//! out of the browser.

use serde::{Deserialize, Serialize};

/// Identity of one exported object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub usize);

/// A JavaScript value: a primitive or a reference into the [`Heap`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "lowercase")]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    /// Numbers without an exact JSON form (bigint, NaN, ±Infinity), as JS prints them
    Numeric(String),
    String(String),
    /// `Symbol.prototype.toString()` form, e.g. `Symbol(react.element)`
    Symbol(String),
    Ref(ObjectId),
}

impl JsValue {
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// JavaScript truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Numeric(text) => !matches!(text.as_str(), "NaN" | "0"),
            Self::String(s) => !s.is_empty(),
            Self::Symbol(_) | Self::Ref(_) => true,
        }
    }
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for JsValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for JsValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for JsValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for JsValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<ObjectId> for JsValue {
    fn from(value: ObjectId) -> Self {
        Self::Ref(value)
    }
}

/// What kind of object a heap entry is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectKind {
    Object,
    Array,
    Function,
    /// A DOM element; its properties are the element's own expando keys
    Element { tag: String },
}

/// One exported object and its own enumerable properties, in iteration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapObject {
    #[serde(flatten)]
    pub kind: ObjectKind,

    #[serde(default)]
    pub properties: Vec<(String, JsValue)>,

    /// The exporter ran out of budget before expanding this object
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl HeapObject {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            truncated: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsValue> {
        self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(k, _)| k.as_str())
    }
}

/// The exported object graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Add an object and return its identity
    pub fn alloc(&mut self, object: HeapObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    /// Add a plain object with the given properties
    pub fn alloc_object<K, I>(&mut self, properties: I) -> ObjectId
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JsValue)>,
    {
        let mut object = HeapObject::new(ObjectKind::Object);
        object.properties = properties.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.alloc(object)
    }

    /// Add an array with the given items
    pub fn alloc_array(&mut self, items: impl IntoIterator<Item = JsValue>) -> ObjectId {
        let mut object = HeapObject::new(ObjectKind::Array);
        object.properties = items.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect();
        self.alloc(object)
    }

    /// Add a function; an empty name stands for an anonymous function
    pub fn alloc_function(&mut self, name: &str) -> ObjectId {
        let mut object = HeapObject::new(ObjectKind::Function);
        object.properties.push(("name".to_string(), JsValue::from(name)));
        self.alloc(object)
    }

    /// Add a DOM element
    pub fn alloc_element(&mut self, tag: &str) -> ObjectId {
        self.alloc(HeapObject::new(ObjectKind::Element {
            tag: tag.to_ascii_lowercase(),
        }))
    }

    /// Set (or replace) a property, keeping its original position
    pub fn set(&mut self, id: ObjectId, key: &str, value: impl Into<JsValue>) {
        let Some(object) = self.objects.get_mut(id.0) else {
            return;
        };
        let value = value.into();
        match object.properties.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => object.properties.push((key.to_string(), value)),
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects.get(id.0)
    }

    /// Property lookup; `None` when the object or key is unknown
    pub fn get(&self, id: ObjectId, key: &str) -> Option<&JsValue> {
        self.object(id)?.get(key)
    }

    /// Property that refers to another object
    pub fn get_object(&self, id: ObjectId, key: &str) -> Option<ObjectId> {
        self.get(id, key)?.as_object()
    }

    /// Non-empty string property (JS `obj.key || …` semantics)
    pub fn get_name(&self, id: ObjectId, key: &str) -> Option<&str> {
        self.get(id, key)?.as_str().filter(|s| !s.is_empty())
    }

    /// Property value, with missing keys read as `undefined`
    pub fn read(&self, id: ObjectId, key: &str) -> JsValue {
        self.get(id, key).cloned().unwrap_or(JsValue::Undefined)
    }
}
