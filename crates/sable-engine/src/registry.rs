//! Class registry
//!
//! Classes live in a vec indexed by `ClassId` with a name map alongside.
//! Registration precomputes everything dispatch and type tests need later:
//! the ancestor chain, the flattened instance layout, and the vtable of
//! most-derived implementations. Native methods are linked against the
//! bridge here, so a miswired bridge fails at setup rather than at a call
//! site.

use rustc_hash::FxHashMap;

use crate::object::{Class, ClassDef, ClassId, InitState, MethodRef};
use crate::{RuntimeError, RuntimeResult};
use sable_sdk::{BridgeError, NativeBridge};

/// Name of the universal root class every chain terminates at.
pub const ROOT_CLASS: &str = "Object";

/// Class registry owning all descriptors.
#[derive(Debug)]
pub struct ClassRegistry {
    classes: Vec<Class>,
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a registry holding only the universal root class.
    pub fn new() -> Self {
        let mut registry = Self {
            classes: Vec::new(),
            name_to_id: FxHashMap::default(),
        };

        let root = Class {
            id: ClassId(0),
            name: ROOT_CLASS.to_string(),
            parent_id: None,
            ancestry: vec![ClassId(0)],
            fields: Vec::new(),
            instance_layout: Vec::new(),
            statics: FxHashMap::default(),
            init_state: InitState::Initialized,
            static_init: None,
            methods: Vec::new(),
            constructors: Vec::new(),
            vtable: FxHashMap::default(),
        };
        registry.name_to_id.insert(root.name.clone(), root.id);
        registry.classes.push(root);
        registry
    }

    /// The universal root class id.
    pub fn root(&self) -> ClassId {
        ClassId(0)
    }

    /// Register a class declaration, linking its native methods against
    /// `bridge`.
    pub fn register(&mut self, def: ClassDef, bridge: &NativeBridge) -> RuntimeResult<ClassId> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RuntimeError::DuplicateClass(def.name));
        }

        let parent_id = match &def.superclass {
            Some(name) => {
                *self
                    .name_to_id
                    .get(name)
                    .ok_or_else(|| RuntimeError::UnknownSuperclass {
                        class: def.name.clone(),
                        superclass: name.clone(),
                    })?
            }
            None => self.root(),
        };

        // Bridge linking happens before anything is committed.
        for m in &def.methods {
            let native = match &m.body {
                crate::object::MethodBody::Native(native) => native,
                crate::object::MethodBody::Host(_) => continue,
            };
            if m.params.len() != 1 {
                return Err(BridgeError::BadSignature {
                    class: def.name.clone(),
                    method: m.name.clone(),
                    reason: format!("expected 1 parameter, declared {}", m.params.len()),
                }
                .into());
            }
            let kind = m.params[0].param_kind().ok_or_else(|| BridgeError::BadSignature {
                class: def.name.clone(),
                method: m.name.clone(),
                reason: format!("parameter type {} has no bridge kind", m.params[0]),
            })?;
            if !bridge.contains(native, kind) {
                return Err(BridgeError::MissingEntry {
                    name: native.clone(),
                    kind,
                }
                .into());
            }
        }

        let id = ClassId(self.classes.len());
        let parent = &self.classes[parent_id.0];

        let mut ancestry = Vec::with_capacity(parent.ancestry.len() + 1);
        ancestry.push(id);
        ancestry.extend_from_slice(&parent.ancestry);

        // Inherited fields first, own declarations after. A redeclared name
        // shadows the inherited slot at allocation time.
        let mut instance_layout = parent.instance_layout.clone();
        instance_layout.extend(def.fields.iter().filter(|f| !f.is_static).cloned());

        let mut statics = FxHashMap::default();
        for f in def.fields.iter().filter(|f| f.is_static) {
            statics.insert(f.name.clone(), f.tag.zero());
        }

        let mut vtable = parent.vtable.clone();
        for (index, m) in def.methods.iter().enumerate() {
            if !m.is_static {
                vtable.insert(m.sig(), MethodRef { class_id: id, index });
            }
        }

        let class = Class {
            id,
            name: def.name,
            parent_id: Some(parent_id),
            ancestry,
            fields: def.fields,
            instance_layout,
            statics,
            init_state: InitState::Uninitialized,
            static_init: def.static_init,
            methods: def.methods,
            constructors: def.constructors,
            vtable,
        };

        self.name_to_id.insert(class.name.clone(), id);
        self.classes.push(class);
        Ok(id)
    }

    /// Look up a class id by name.
    pub fn id_of(&self, name: &str) -> RuntimeResult<ClassId> {
        self.name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownClass(name.to_string()))
    }

    /// Borrow a class by id.
    pub fn get(&self, id: ClassId) -> &Class {
        &self.classes[id.0]
    }

    /// Mutably borrow a class by id.
    pub fn get_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.0]
    }

    /// Whether `class`'s chain (self included) contains `target`.
    pub fn is_subclass_of(&self, class: ClassId, target: ClassId) -> bool {
        self.classes[class.0].has_ancestor(target)
    }

    /// Nearest class in `start`'s chain declaring the named field, together
    /// with the declaration.
    pub fn resolve_field(&self, start: ClassId, name: &str) -> Option<(ClassId, &crate::object::FieldDef)> {
        let chain = &self.classes[start.0].ancestry;
        for &c in chain {
            if let Some(f) = self.classes[c.0].own_field(name) {
                return Some((c, f));
            }
        }
        None
    }

    /// Number of registered classes, root included.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Never true: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}
