//! Runtime object export and safe serialization
//!
//! - [`heap`]: the object graph exported from the page, with identities kept
//! - [`serialize`]: bounded projection of heap values into readable values

pub mod heap;
pub mod serialize;

pub use heap::{Heap, HeapObject, JsValue, ObjectId, ObjectKind};
pub use serialize::{PropertyMap, SafeSerializer, SerializeOptions, SerializedValue};
