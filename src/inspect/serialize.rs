//! Bounded, cycle-safe projection of runtime objects into readable values.
//!
//! Component props and state are arbitrary object graphs: fibers point back
//! at their parents, reactive proxies reference their owning instance, and
//! arrays can hold thousands of rows. [`SafeSerializer`] caps depth, breadth
//! and revisits so the result always stays small enough to read.

use crate::inspect::heap::{Heap, JsValue, ObjectId, ObjectKind};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Mapping of property names to serialized values
pub type PropertyMap = IndexMap<String, SerializedValue>;

/// A serialized runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedValue {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    /// bigint / NaN / Infinity in their JS text form
    Numeric(String),
    String(String),
    /// Stand-in for any function
    Function,
    /// An object already visited during this serialization
    Circular,
    /// Depth limit reached, or the exporter never expanded the object
    Truncated,
    /// A DOM element, by lowercase tag name
    Element(String),
    Sequence(Vec<SerializedValue>),
    Mapping(PropertyMap),
}

impl SerializedValue {
    pub const FUNCTION_MARKER: &'static str = "fn";
    pub const CIRCULAR_MARKER: &'static str = "[Circular]";
    pub const TRUNCATED_MARKER: &'static str = "...";

    pub fn as_mapping(&self) -> Option<&PropertyMap> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_mapping(self) -> Option<PropertyMap> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }
}

/// Wire form: markers become their text, `undefined` becomes `null`
impl Serialize for SerializedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null | Self::Undefined => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Numeric(text) | Self::String(text) => serializer.serialize_str(text),
            Self::Function => serializer.serialize_str(Self::FUNCTION_MARKER),
            Self::Circular => serializer.serialize_str(Self::CIRCULAR_MARKER),
            Self::Truncated => serializer.serialize_str(Self::TRUNCATED_MARKER),
            Self::Element(tag) => serializer.serialize_str(&format!("<{}>", tag)),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Limits applied by the serializer
#[derive(Debug, Clone, PartialEq)]
pub struct SerializeOptions {
    /// Deepest level expanded; anything below becomes the truncation marker
    pub max_depth: usize,
    /// Array items kept; the rest are dropped without a marker
    pub max_items: usize,
    /// Mapping entries kept after private keys are elided
    pub max_entries: usize,
    /// Key prefixes treated as framework-private and elided
    pub private_prefixes: &'static [&'static str],
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_items: 10,
            max_entries: 20,
            private_prefixes: &["_"],
        }
    }
}

impl SerializeOptions {
    /// React internals: `_owner`, `_store`, `$$typeof`
    pub fn react() -> Self {
        Self {
            private_prefixes: &["_", "$$"],
            ..Self::default()
        }
    }

    /// Vue internals: `_uid`, `__v_skip`, `$el`, `$attrs`
    pub fn vue() -> Self {
        Self {
            private_prefixes: &["_", "$"],
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    fn is_private(&self, key: &str) -> bool {
        self.private_prefixes.iter().any(|prefix| key.starts_with(prefix))
    }
}

/// Serializes values out of one exported [`Heap`]
#[derive(Debug, Clone)]
pub struct SafeSerializer<'h> {
    heap: &'h Heap,
    options: SerializeOptions,
}

impl<'h> SafeSerializer<'h> {
    pub fn new(heap: &'h Heap, options: SerializeOptions) -> Self {
        Self { heap, options }
    }

    pub fn options(&self) -> &SerializeOptions {
        &self.options
    }

    /// Serialize a root value with a fresh visited set
    pub fn serialize(&self, value: &JsValue) -> SerializedValue {
        let mut seen = HashSet::new();
        self.serialize_at(value, 0, &mut seen)
    }

    /// Serialize a root value and keep it only if it is a mapping
    pub fn serialize_mapping(&self, value: &JsValue) -> Option<PropertyMap> {
        self.serialize(value).into_mapping()
    }

    /// Serialize `value` found `depth` levels below the root. `seen` holds
    /// every object already expanded by the current root call.
    pub fn serialize_at(&self, value: &JsValue, depth: usize, seen: &mut HashSet<ObjectId>) -> SerializedValue {
        if depth > self.options.max_depth {
            return SerializedValue::Truncated;
        }

        let id = match value {
            JsValue::Undefined => return SerializedValue::Undefined,
            JsValue::Null => return SerializedValue::Null,
            JsValue::Symbol(text) => return SerializedValue::String(text.clone()),
            JsValue::Bool(b) => return SerializedValue::Bool(*b),
            JsValue::Number(n) => return SerializedValue::Number(*n),
            JsValue::Numeric(text) => return SerializedValue::Numeric(text.clone()),
            JsValue::String(s) => return SerializedValue::String(s.clone()),
            JsValue::Ref(id) => *id,
        };

        let Some(object) = self.heap.object(id) else {
            return SerializedValue::Truncated;
        };
        match &object.kind {
            ObjectKind::Function => return SerializedValue::Function,
            ObjectKind::Element { tag } => return SerializedValue::Element(tag.to_ascii_lowercase()),
            ObjectKind::Object | ObjectKind::Array => {}
        }

        if !seen.insert(id) {
            return SerializedValue::Circular;
        }
        if object.truncated {
            return SerializedValue::Truncated;
        }

        if object.kind == ObjectKind::Array {
            let items = object
                .properties
                .iter()
                .take(self.options.max_items)
                .map(|(_, item)| self.serialize_at(item, depth + 1, seen))
                .collect();
            return SerializedValue::Sequence(items);
        }

        let entries = object
            .properties
            .iter()
            .filter(|(key, _)| !self.options.is_private(key))
            .take(self.options.max_entries)
            .map(|(key, item)| (key.clone(), self.serialize_at(item, depth + 1, seen)))
            .collect::<Vec<_>>();
        SerializedValue::Mapping(entries.into_iter().collect())
    }
}
