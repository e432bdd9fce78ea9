//! Vue component instance walking.
//!
//! Vue 3 marks each element with the enclosing component instance under
//! `__vueParentComponent`; Vue 2 sets `__vue__` on component root elements.
//! Vue 3 is tried first.

use crate::framework::{ComponentCollector, ComponentNode, InheritedKey, Origin, walk_chain};
use crate::inspect::{Heap, JsValue, ObjectId, PropertyMap, SafeSerializer, SerializeOptions};

/// Where one Vue major version keeps its instance data
struct Layout {
    element_key: &'static str,
    parent_key: &'static str,
    props_key: &'static str,
    state_key: &'static str,
    name: fn(&Heap, ObjectId) -> Option<String>,
}

const VUE3: Layout = Layout {
    element_key: "__vueParentComponent",
    parent_key: "parent",
    props_key: "props",
    state_key: "setupState",
    name: vue3_name,
};

const VUE2: Layout = Layout {
    element_key: "__vue__",
    parent_key: "$parent",
    props_key: "$props",
    state_key: "$data",
    name: vue2_name,
};

#[derive(Debug, Clone)]
pub struct VueCollector {
    options: SerializeOptions,
}

impl Default for VueCollector {
    fn default() -> Self {
        Self::new(SerializeOptions::vue())
    }
}

impl VueCollector {
    pub fn new(options: SerializeOptions) -> Self {
        Self { options }
    }

    fn collect_with(&self, layout: &Layout, heap: &Heap, element: ObjectId) -> Option<ComponentNode> {
        let instance = heap.get_object(element, layout.element_key)?;

        let mut hierarchy: Vec<String> = walk_chain(heap, instance, layout.parent_key)
            .into_iter()
            .filter_map(|vm| (layout.name)(heap, vm))
            .collect();
        hierarchy.reverse();

        let serializer = SafeSerializer::new(heap, self.options.clone());
        let section = |key: &str| -> Option<PropertyMap> {
            let value = heap.read(instance, key);
            if !value.is_truthy() {
                return None;
            }
            serializer.serialize_mapping(&value)
        };

        Some(ComponentNode {
            origin: Origin::Vue,
            hierarchy,
            props: section(layout.props_key),
            state: section(layout.state_key),
        })
    }
}

impl ComponentCollector for VueCollector {
    fn spine_keys(&self) -> &'static [&'static str] {
        &["parent", "$parent"]
    }

    /// Vue 2 defines `$props`/`$data` on `Vue.prototype`, and a child
    /// component's `$options` is `Object.create(Ctor.options)`, so its
    /// `name` sits on the prototype
    fn inherited_keys(&self) -> &'static [InheritedKey] {
        const KEYS: &[InheritedKey] = &[
            InheritedKey::anywhere("$props"),
            InheritedKey::anywhere("$data"),
            InheritedKey::under("$options", "name"),
            InheritedKey::under("$options", "_componentTag"),
        ];
        KEYS
    }

    fn collect(&self, heap: &Heap, element: ObjectId) -> Option<ComponentNode> {
        self.collect_with(&VUE3, heap, element)
            .or_else(|| self.collect_with(&VUE2, heap, element))
    }
}

/// `type.name || type.__name`; the latter is set by `<script setup>` SFCs
fn vue3_name(heap: &Heap, instance: ObjectId) -> Option<String> {
    let component_type = match heap.get(instance, "type")? {
        JsValue::Ref(id) => *id,
        _ => return None,
    };
    heap.get_name(component_type, "name")
        .or_else(|| heap.get_name(component_type, "__name"))
        .map(str::to_string)
}

/// `$options.name || $options._componentTag`
fn vue2_name(heap: &Heap, vm: ObjectId) -> Option<String> {
    let options = heap.get_object(vm, "$options")?;
    heap.get_name(options, "name")
        .or_else(|| heap.get_name(options, "_componentTag"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::SerializedValue;

    fn vue3_instance(heap: &mut Heap, name_key: &str, name: &str, parent: Option<ObjectId>) -> ObjectId {
        let component_type = heap.alloc_object([(name_key, JsValue::from(name))]);
        heap.alloc_object([
            ("uid", JsValue::from(0)),
            ("type", JsValue::from(component_type)),
            ("parent", parent.map_or(JsValue::Null, JsValue::from)),
        ])
    }

    fn vue2_vm(heap: &mut Heap, options: &[(&str, &str)], parent: Option<ObjectId>) -> ObjectId {
        let options = heap.alloc_object(options.iter().map(|(k, v)| (*k, JsValue::from(*v))));
        heap.alloc_object([
            ("$options", JsValue::from(options)),
            ("$parent", parent.map_or(JsValue::Null, JsValue::from)),
        ])
    }

    #[test]
    fn test_plain_element_returns_none() {
        let mut heap = Heap::new();
        let element = heap.alloc_element("div");
        assert_eq!(VueCollector::default().collect(&heap, element), None);
    }

    #[test]
    fn test_vue3_hierarchy_and_setup_state() {
        let mut heap = Heap::new();
        let app = vue3_instance(&mut heap, "name", "App", None);
        let unnamed = heap.alloc_object([("parent", JsValue::from(app))]);
        let card = vue3_instance(&mut heap, "__name", "UserCard", Some(unnamed));

        let props = heap.alloc_object([("userId", JsValue::from(7)), ("$attrs", JsValue::Null)]);
        let count = heap.alloc_object([("value", JsValue::from(1))]);
        let setup = heap.alloc_object([("count", JsValue::from(count)), ("_internal", JsValue::from(true))]);
        heap.set(card, "props", props);
        heap.set(card, "setupState", setup);

        let element = heap.alloc_element("section");
        heap.set(element, "__vueParentComponent", card);

        let node = VueCollector::default().collect(&heap, element).unwrap();
        assert_eq!(node.origin, Origin::Vue);
        assert_eq!(node.hierarchy, vec!["App", "UserCard"]);

        let props = node.props.unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props["userId"], SerializedValue::Number(7.0));

        let state = node.state.unwrap();
        assert_eq!(state.len(), 1);
        assert!(state["count"].as_mapping().is_some());
    }

    #[test]
    fn test_vue2_component_tag_fallback() {
        let mut heap = Heap::new();
        let root = vue2_vm(&mut heap, &[], None);
        let list = vue2_vm(&mut heap, &[("_componentTag", "todo-list")], Some(root));
        let item = vue2_vm(&mut heap, &[("name", "TodoItem"), ("_componentTag", "todo-item")], Some(list));

        let data = heap.alloc_object([("done", JsValue::from(false))]);
        heap.set(item, "$data", data);

        let element = heap.alloc_element("li");
        heap.set(element, "__vue__", item);

        let node = VueCollector::default().collect(&heap, element).unwrap();
        assert_eq!(node.hierarchy, vec!["todo-list", "TodoItem"]);
        assert_eq!(node.props, None);
        assert_eq!(node.state.unwrap()["done"], SerializedValue::Bool(false));
    }

    #[test]
    fn test_vue2_extended_component_name() {
        // Vue.extend components carry `name` on the prototype of `$options`,
        // which the page script exports as a plain property.
        let mut heap = Heap::new();
        let root = vue2_vm(&mut heap, &[], None);
        let item = vue2_vm(&mut heap, &[("name", "TodoItem")], Some(root));

        let props = heap.alloc_object([("title", JsValue::from("Write docs"))]);
        let data = heap.alloc_object([("editing", JsValue::from(true))]);
        heap.set(item, "$props", props);
        heap.set(item, "$data", data);

        let element = heap.alloc_element("li");
        heap.set(element, "__vue__", item);

        let node = VueCollector::default().collect(&heap, element).unwrap();
        assert_eq!(node.hierarchy, vec!["TodoItem"]);
        assert_eq!(node.props.unwrap()["title"], SerializedValue::String("Write docs".to_string()));
        assert_eq!(node.state.unwrap()["editing"], SerializedValue::Bool(true));
    }

    #[test]
    fn test_vue3_preferred_over_vue2() {
        let mut heap = Heap::new();
        let modern = vue3_instance(&mut heap, "name", "Modern", None);
        let legacy = vue2_vm(&mut heap, &[("name", "Legacy")], None);
        let element = heap.alloc_element("div");
        heap.set(element, "__vue__", legacy);
        heap.set(element, "__vueParentComponent", modern);

        let node = VueCollector::default().collect(&heap, element).unwrap();
        assert_eq!(node.hierarchy, vec!["Modern"]);
    }

    #[test]
    fn test_instance_without_names_still_collected() {
        let mut heap = Heap::new();
        let instance = heap.alloc_object([("parent", JsValue::Null)]);
        let element = heap.alloc_element("div");
        heap.set(element, "__vueParentComponent", instance);

        let node = VueCollector::default().collect(&heap, element).unwrap();
        assert!(node.hierarchy.is_empty());
        assert_eq!(node.props, None);
        assert_eq!(node.state, None);
    }

    #[test]
    fn test_cyclic_parent_chain_terminates() {
        let mut heap = Heap::new();
        let a = vue3_instance(&mut heap, "name", "A", None);
        let b = vue3_instance(&mut heap, "name", "B", Some(a));
        heap.set(a, "parent", b);
        let element = heap.alloc_element("div");
        heap.set(element, "__vueParentComponent", b);

        let node = VueCollector::default().collect(&heap, element).unwrap();
        assert_eq!(node.hierarchy, vec!["A", "B"]);
    }
}
