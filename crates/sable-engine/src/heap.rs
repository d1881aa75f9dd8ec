//! Heap: instance allocation and field storage
//!
//! Slot-indexed arena of object instances. Reference values carry the slot
//! handle; identity comparison is handle equality. Every object also gets a
//! process-wide monotonic id for debug display. Unreachable-object
//! reclamation is out of scope; objects live for the heap's lifetime.

use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::object::{Class, ClassId};
use crate::value::Value;

/// Process-wide counter behind per-object debug ids.
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Heap slot handle. Identity comparison only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

/// Object instance.
#[derive(Debug, Clone)]
pub struct Object {
    /// Monotonic debug id assigned at allocation
    pub object_id: u64,
    /// Runtime class
    pub class_id: ClassId,
    /// Instance field values, keyed by field name
    pub fields: FxHashMap<String, Value>,
}

impl Object {
    /// Read a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write a field by name. The caller has already resolved the
    /// declaration; an unknown name here is a logic error.
    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

/// Object store.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an instance of `class` with every declared instance field
    /// (own plus inherited) set to its zero value.
    pub fn allocate(&mut self, class: &Class) -> ObjectId {
        let mut fields = FxHashMap::default();
        for f in &class.instance_layout {
            fields.insert(f.name.clone(), f.tag.zero());
        }

        let id = ObjectId(self.objects.len());
        self.objects.push(Object {
            object_id: generate_object_id(),
            class_id: class.id,
            fields,
        });
        id
    }

    /// Borrow an object.
    pub fn get(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    /// Mutably borrow an object.
    pub fn get_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.0]
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
