//! React fiber walking.
//!
//! React attaches the fiber for each host element under an own property
//! named `__reactFiber$<random>`. From there `return` leads to the parent
//! fiber, `tag` tells what kind of work the fiber represents, and function
//! components keep their hooks as a linked list starting at `memoizedState`.

use crate::framework::{ComponentCollector, ComponentNode, Origin, walk_chain};
use crate::inspect::{Heap, JsValue, ObjectId, PropertyMap, SafeSerializer, SerializeOptions};

const FIBER_KEY_PREFIX: &str = "__reactFiber$";

/// Fiber `tag` values that carry a user component
const FUNCTION_COMPONENT: i64 = 0;
const CLASS_COMPONENT: i64 = 1;
const FORWARD_REF: i64 = 11;
const SIMPLE_MEMO_COMPONENT: i64 = 15;

#[derive(Debug, Clone)]
pub struct ReactCollector {
    options: SerializeOptions,
}

impl Default for ReactCollector {
    fn default() -> Self {
        Self::new(SerializeOptions::react())
    }
}

impl ReactCollector {
    pub fn new(options: SerializeOptions) -> Self {
        Self { options }
    }

    /// The fiber attached to a host element
    pub fn find_fiber(heap: &Heap, element: ObjectId) -> Option<ObjectId> {
        heap.object(element)?
            .properties
            .iter()
            .find(|(key, _)| key.starts_with(FIBER_KEY_PREFIX))
            .and_then(|(_, value)| value.as_object())
    }

    fn extract_state(&self, heap: &Heap, fiber: ObjectId) -> Option<PropertyMap> {
        let serializer = SafeSerializer::new(heap, self.options.clone());

        match fiber_tag(heap, fiber)? {
            CLASS_COMPONENT => {
                let instance = heap.get_object(fiber, "stateNode")?;
                let state = heap.read(instance, "state");
                if !state.is_truthy() {
                    return None;
                }
                serializer.serialize_mapping(&state)
            }
            FUNCTION_COMPONENT | FORWARD_REF | SIMPLE_MEMO_COMPONENT => {
                let first_hook = heap.get_object(fiber, "memoizedState")?;
                let states: PropertyMap = walk_chain(heap, first_hook, "next")
                    .into_iter()
                    .filter(|&hook| !heap.read(hook, "queue").is_nullish())
                    .enumerate()
                    .map(|(i, hook)| {
                        let value = heap.read(hook, "memoizedState");
                        (format!("state_{}", i), serializer.serialize(&value))
                    })
                    .collect();

                (!states.is_empty()).then_some(states)
            }
            _ => None,
        }
    }
}

impl ComponentCollector for ReactCollector {
    fn spine_keys(&self) -> &'static [&'static str] {
        &["return", "next"]
    }

    fn collect(&self, heap: &Heap, element: ObjectId) -> Option<ComponentNode> {
        let fiber = Self::find_fiber(heap, element)?;
        let ancestors = walk_chain(heap, fiber, "return");

        let mut hierarchy: Vec<String> = ancestors
            .iter()
            .filter(|&&f| is_component_fiber(heap, f))
            .filter_map(|&f| component_name(heap, f))
            .collect();
        if hierarchy.is_empty() {
            return None;
        }
        hierarchy.reverse();

        let nearest = ancestors.iter().copied().find(|&f| is_component_fiber(heap, f));
        let props = nearest.and_then(|f| {
            let props = heap.read(f, "memoizedProps");
            SafeSerializer::new(heap, self.options.clone()).serialize_mapping(&props)
        });
        let state = nearest.and_then(|f| self.extract_state(heap, f));

        Some(ComponentNode {
            origin: Origin::React,
            hierarchy,
            props,
            state,
        })
    }
}

fn fiber_tag(heap: &Heap, fiber: ObjectId) -> Option<i64> {
    heap.get(fiber, "tag")?.as_f64().map(|tag| tag as i64)
}

fn is_component_fiber(heap: &Heap, fiber: ObjectId) -> bool {
    matches!(
        fiber_tag(heap, fiber),
        Some(FUNCTION_COMPONENT | CLASS_COMPONENT | FORWARD_REF | SIMPLE_MEMO_COMPONENT)
    )
}

/// `type.displayName || type.name`; host fibers have a string type and no name
fn component_name(heap: &Heap, fiber: ObjectId) -> Option<String> {
    let component_type = match heap.get(fiber, "type")? {
        JsValue::Ref(id) => *id,
        _ => return None,
    };
    heap.get_name(component_type, "displayName")
        .or_else(|| heap.get_name(component_type, "name"))
        .map(str::to_string)
}
