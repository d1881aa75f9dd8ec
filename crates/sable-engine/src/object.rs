//! Object model and class metadata
//!
//! `ClassDef` is the declaration a harness hands to the engine; `Class` is
//! the registered descriptor with precomputed ancestry, instance layout,
//! static storage, and the link-time method table that makes dynamic
//! dispatch a single lookup instead of a per-call chain walk.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::interpreter::Vm;
use crate::stack::Frame;
use crate::value::{TypeTag, Value};
use crate::RuntimeResult;

/// Class handle: index into the class registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub usize);

/// Host-implemented method body. Bodies call back into the engine for field
/// access and nested invocation, so recursion flows through engine frames.
pub type HostFn = Arc<dyn Fn(&mut Vm, &Frame) -> RuntimeResult<Value>>;

/// How a method executes.
#[derive(Clone)]
pub enum MethodBody {
    /// Runs host code against the engine.
    Host(HostFn),
    /// Dispatches to a bridge entry point of the given name.
    Native(String),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Host(_) => f.write_str("Host(..)"),
            MethodBody::Native(name) => write!(f, "Native({})", name),
        }
    }
}

/// A declared method.
#[derive(Debug, Clone)]
pub struct Method {
    /// Method name
    pub name: String,
    /// Declared parameter types, in order
    pub params: Vec<TypeTag>,
    /// Class-level rather than instance-level
    pub is_static: bool,
    /// Body
    pub body: MethodBody,
}

impl Method {
    /// Whether this method dispatches to the native bridge.
    pub fn is_native(&self) -> bool {
        matches!(self.body, MethodBody::Native(_))
    }

    /// Signature key for override resolution.
    pub fn sig(&self) -> MethodSig {
        MethodSig {
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }
}

/// A declared constructor.
#[derive(Clone)]
pub struct Constructor {
    /// Declared parameter types, in order
    pub params: Vec<TypeTag>,
    /// When true the body performs its own superclass construction via
    /// `Vm::construct_super`; otherwise the engine default-constructs the
    /// superclass region before the body runs.
    pub explicit_super: bool,
    /// Body
    pub body: HostFn,
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .field("explicit_super", &self.explicit_super)
            .finish()
    }
}

/// Method signature: name plus ordered parameter types. Two methods with
/// the same signature along an inheritance chain are override candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSig {
    /// Method name
    pub name: String,
    /// Ordered parameter types
    pub params: Vec<TypeTag>,
}

/// Resolved method location: declaring class and index into its method vec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRef {
    /// Class whose `methods` vec holds the implementation
    pub class_id: ClassId,
    /// Index into that vec
    pub index: usize,
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared type
    pub tag: TypeTag,
    /// Class-level rather than per-instance
    pub is_static: bool,
}

/// Static initialization state. Explicit so the re-entrancy rule is
/// testable: `Initializing` re-entry is a no-op, and the state never moves
/// backwards once initialization has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// Static storage holds zero values only
    Uninitialized,
    /// The static initializer is on the stack right now
    Initializing,
    /// The initializer ran (or faulted; it is not re-run)
    Initialized,
}

/// Class declaration handed to `Vm::register_class`.
#[derive(Default)]
pub struct ClassDef {
    /// Class name
    pub name: String,
    /// Superclass name; the universal root when absent
    pub superclass: Option<String>,
    /// Declared fields, in declaration order
    pub fields: Vec<FieldDef>,
    /// Declared methods
    pub methods: Vec<Method>,
    /// Declared constructors
    pub constructors: Vec<Constructor>,
    /// Static initializer body, run once before first static use
    pub static_init: Option<HostFn>,
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("superclass", &self.superclass)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .finish()
    }
}

impl ClassDef {
    /// Start a declaration for `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Set the superclass by name.
    pub fn superclass(mut self, name: &str) -> Self {
        self.superclass = Some(name.to_string());
        self
    }

    /// Declare an instance field.
    pub fn instance_field(mut self, name: &str, tag: TypeTag) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            tag,
            is_static: false,
        });
        self
    }

    /// Declare a static field.
    pub fn static_field(mut self, name: &str, tag: TypeTag) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            tag,
            is_static: true,
        });
        self
    }

    /// Declare an instance method with a host body.
    pub fn method<F>(mut self, name: &str, params: &[TypeTag], body: F) -> Self
    where
        F: Fn(&mut Vm, &Frame) -> RuntimeResult<Value> + 'static,
    {
        self.methods.push(Method {
            name: name.to_string(),
            params: params.to_vec(),
            is_static: false,
            body: MethodBody::Host(Arc::new(body)),
        });
        self
    }

    /// Declare a static method with a host body.
    pub fn static_method<F>(mut self, name: &str, params: &[TypeTag], body: F) -> Self
    where
        F: Fn(&mut Vm, &Frame) -> RuntimeResult<Value> + 'static,
    {
        self.methods.push(Method {
            name: name.to_string(),
            params: params.to_vec(),
            is_static: true,
            body: MethodBody::Host(Arc::new(body)),
        });
        self
    }

    /// Declare a static native method dispatching to `native` on the bridge.
    pub fn static_native(mut self, name: &str, param: TypeTag, native: &str) -> Self {
        self.methods.push(Method {
            name: name.to_string(),
            params: vec![param],
            is_static: true,
            body: MethodBody::Native(native.to_string()),
        });
        self
    }

    /// Declare an instance native method dispatching to `native`.
    pub fn native_method(mut self, name: &str, param: TypeTag, native: &str) -> Self {
        self.methods.push(Method {
            name: name.to_string(),
            params: vec![param],
            is_static: false,
            body: MethodBody::Native(native.to_string()),
        });
        self
    }

    /// Declare a constructor with engine-managed superclass construction.
    pub fn constructor<F>(mut self, params: &[TypeTag], body: F) -> Self
    where
        F: Fn(&mut Vm, &Frame) -> RuntimeResult<Value> + 'static,
    {
        self.constructors.push(Constructor {
            params: params.to_vec(),
            explicit_super: false,
            body: Arc::new(body),
        });
        self
    }

    /// Declare a constructor whose body performs its own superclass
    /// construction via `Vm::construct_super`.
    pub fn constructor_with_super<F>(mut self, params: &[TypeTag], body: F) -> Self
    where
        F: Fn(&mut Vm, &Frame) -> RuntimeResult<Value> + 'static,
    {
        self.constructors.push(Constructor {
            params: params.to_vec(),
            explicit_super: true,
            body: Arc::new(body),
        });
        self
    }

    /// Set the static initializer body.
    pub fn static_init<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut Vm, &Frame) -> RuntimeResult<Value> + 'static,
    {
        self.static_init = Some(Arc::new(body));
        self
    }
}

/// Registered class descriptor.
pub struct Class {
    /// Registry index
    pub id: ClassId,
    /// Class name
    pub name: String,
    /// Superclass; `None` only for the universal root
    pub parent_id: Option<ClassId>,
    /// Ancestor chain, self first, root last. Precomputed so type tests
    /// scan a short vec instead of walking the registry.
    pub ancestry: Vec<ClassId>,
    /// Own field declarations, declaration order
    pub fields: Vec<FieldDef>,
    /// Instance fields including inherited ones, ancestors first
    pub instance_layout: Vec<FieldDef>,
    /// Static storage owned by this class
    pub statics: FxHashMap<String, Value>,
    /// Static initialization guard
    pub init_state: InitState,
    /// Static initializer body
    pub static_init: Option<HostFn>,
    /// Own methods
    pub methods: Vec<Method>,
    /// Own constructors
    pub constructors: Vec<Constructor>,
    /// Most-derived implementation per instance-method signature, built at
    /// registration by extending the parent's table.
    pub vtable: FxHashMap<MethodSig, MethodRef>,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent_id", &self.parent_id)
            .field("ancestry", &self.ancestry)
            .field("fields", &self.fields)
            .field("instance_layout", &self.instance_layout)
            .field("statics", &self.statics)
            .field("init_state", &self.init_state)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .field("vtable", &self.vtable)
            .finish()
    }
}

impl Class {
    /// Find the declaration of `field` in this class's own declarations.
    pub fn own_field(&self, field: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == field)
    }

    /// Whether `ancestor` appears in this class's chain (self included).
    pub fn has_ancestor(&self, ancestor: ClassId) -> bool {
        self.ancestry.contains(&ancestor)
    }
}
