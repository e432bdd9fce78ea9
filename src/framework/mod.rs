//! Framework detection and component collection
//!
//! - [`detect`]: classify the page from its globals
//! - [`react`]: walk a React fiber tree from a DOM element
//! - [`vue`]: walk a Vue 3 / Vue 2 component instance tree from a DOM element

pub mod detect;
pub mod react;
pub mod vue;

pub use detect::{BaseFramework, FrameworkSignal, MetaFramework, PageProbe, detect_framework, probed_globals};
pub use react::ReactCollector;
pub use vue::VueCollector;

use crate::inspect::{Heap, ObjectId, PropertyMap};
use serde::Serialize;
use std::collections::HashSet;

/// Framework a component was collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    React,
    Vue,
}

/// The component enclosing a picked element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentNode {
    #[serde(rename = "framework")]
    pub origin: Origin,
    /// Component names, root first
    pub hierarchy: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<PropertyMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PropertyMap>,
}

/// A key the page exporter reads with `in` (through the prototype chain)
/// because frameworks keep it off the object's own properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InheritedKey {
    pub key: &'static str,
    /// Only on objects reached through a property of this name; any object
    /// when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub under: Option<&'static str>,
}

impl InheritedKey {
    pub const fn anywhere(key: &'static str) -> Self {
        Self { key, under: None }
    }

    pub const fn under(parent_key: &'static str, key: &'static str) -> Self {
        Self {
            key,
            under: Some(parent_key),
        }
    }
}

/// Resolves the framework instance behind a DOM element
pub trait ComponentCollector {
    /// Keys linking an instance to its parent; the page exporter follows
    /// them first so the whole ancestor chain survives its budget
    fn spine_keys(&self) -> &'static [&'static str];

    /// Keys living on prototypes rather than as own properties
    fn inherited_keys(&self) -> &'static [InheritedKey] {
        &[]
    }

    /// Component information for `element`, or `None` when no framework
    /// instance is attached to it
    fn collect(&self, heap: &Heap, element: ObjectId) -> Option<ComponentNode>;
}

/// Collector chosen from the detected base framework
#[derive(Debug, Clone, Default)]
pub enum Collector {
    React(ReactCollector),
    Vue(VueCollector),
    #[default]
    None,
}

impl Collector {
    pub fn for_signal(signal: Option<&FrameworkSignal>) -> Self {
        match signal.and_then(|s| s.base) {
            Some(BaseFramework::React) => Self::React(ReactCollector::default()),
            Some(BaseFramework::Vue) => Self::Vue(VueCollector::default()),
            None => Self::None,
        }
    }
}

impl ComponentCollector for Collector {
    fn spine_keys(&self) -> &'static [&'static str] {
        match self {
            Self::React(collector) => collector.spine_keys(),
            Self::Vue(collector) => collector.spine_keys(),
            Self::None => &[],
        }
    }

    fn inherited_keys(&self) -> &'static [InheritedKey] {
        match self {
            Self::React(collector) => collector.inherited_keys(),
            Self::Vue(collector) => collector.inherited_keys(),
            Self::None => &[],
        }
    }

    fn collect(&self, heap: &Heap, element: ObjectId) -> Option<ComponentNode> {
        match self {
            Self::React(collector) => collector.collect(heap, element),
            Self::Vue(collector) => collector.collect(heap, element),
            Self::None => None,
        }
    }
}

/// Collect the component behind `element` using the collector matching `signal`
pub fn collect_component(heap: &Heap, element: ObjectId, signal: Option<&FrameworkSignal>) -> Option<ComponentNode> {
    Collector::for_signal(signal).collect(heap, element)
}

/// Parent-link keys of every supported framework
pub fn spine_keys() -> Vec<&'static str> {
    merged_keys(<Collector as ComponentCollector>::spine_keys)
}

/// Prototype-held keys of every supported framework
pub fn inherited_keys() -> Vec<InheritedKey> {
    merged_keys(<Collector as ComponentCollector>::inherited_keys)
}

fn merged_keys<T: Copy + PartialEq + 'static>(keys_of: fn(&Collector) -> &'static [T]) -> Vec<T> {
    let mut keys = Vec::new();
    for collector in [
        Collector::React(ReactCollector::default()),
        Collector::Vue(VueCollector::default()),
    ] {
        for key in keys_of(&collector) {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
    }
    keys
}

/// Follow `key` from `start` until it stops resolving to an object or
/// loops back on itself
pub(crate) fn walk_chain(heap: &Heap, start: ObjectId, key: &str) -> Vec<ObjectId> {
    let mut visited = HashSet::new();
    let mut chain = Vec::new();
    let mut current = Some(start);

    while let Some(id) = current {
        if !visited.insert(id) {
            log::debug!("Cycle in '{}' chain at object {}", key, id.0);
            break;
        }
        chain.push(id);
        current = heap.get_object(id, key);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::JsValue;

    #[test]
    fn test_collector_for_signal() {
        let react = FrameworkSignal {
            base: Some(BaseFramework::React),
            meta: None,
        };
        let nuxt_only = FrameworkSignal {
            base: None,
            meta: Some(MetaFramework::Nuxt),
        };

        assert!(matches!(Collector::for_signal(Some(&react)), Collector::React(_)));
        assert!(matches!(Collector::for_signal(Some(&nuxt_only)), Collector::None));
        assert!(matches!(Collector::for_signal(None), Collector::None));
    }

    #[test]
    fn test_no_framework_collects_nothing() {
        let mut heap = Heap::new();
        let element = heap.alloc_element("div");
        assert_eq!(collect_component(&heap, element, None), None);
    }

    #[test]
    fn test_spine_keys() {
        assert_eq!(spine_keys(), vec!["return", "next", "parent", "$parent"]);
        assert_eq!(
            inherited_keys(),
            vec![
                InheritedKey::anywhere("$props"),
                InheritedKey::anywhere("$data"),
                InheritedKey::under("$options", "name"),
                InheritedKey::under("$options", "_componentTag"),
            ]
        );
        assert_eq!(
            serde_json::to_value(InheritedKey::under("$options", "name")).unwrap(),
            serde_json::json!({"key": "name", "under": "$options"})
        );
    }

    #[test]
    fn test_walk_chain_stops_on_cycle() {
        let mut heap = Heap::new();
        let a = heap.alloc_object([("name", JsValue::from("a"))]);
        let b = heap.alloc_object([("up", JsValue::from(a))]);
        heap.set(a, "up", b);

        assert_eq!(walk_chain(&heap, b, "up"), vec![b, a]);
    }

    #[test]
    fn test_component_wire_shape() {
        let node = ComponentNode {
            origin: Origin::Vue,
            hierarchy: vec!["App".into()],
            props: None,
            state: None,
        };
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            serde_json::json!({"framework": "vue", "hierarchy": ["App"]})
        );
    }
}
