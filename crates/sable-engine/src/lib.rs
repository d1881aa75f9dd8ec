//! Sable object runtime
//!
//! A single-threaded class/object execution engine:
//! - tagged value model with sign-extending integer widening
//! - class registry with precomputed ancestor chains and link-time vtables
//! - heap with zero-initialized instances and per-class static storage
//! - execution engine with overload resolution, constructor ordering,
//!   dynamic dispatch, and guarded static initialization
//! - native bridge dispatch against host-supplied entry points
//!
//! Method bodies are host closures that call back into the engine, so
//! recursion, field access, and nested dispatch all flow through engine
//! frames and are bounded by the configured call depth.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod heap;
pub mod interpreter;
pub mod object;
pub mod registry;
pub mod stack;
pub mod value;

pub use heap::{Heap, Object, ObjectId};
pub use interpreter::{Vm, VmOptions};
pub use object::{
    Class, ClassDef, ClassId, Constructor, FieldDef, HostFn, InitState, Method, MethodBody,
    MethodRef, MethodSig,
};
pub use registry::{ClassRegistry, ROOT_CLASS};
pub use stack::{CallState, Frame, FrameRecord, Stack, DEFAULT_MAX_CALL_DEPTH};
pub use value::{widen_i32, TypeTag, Value};

pub use sable_sdk::{
    install_print, BridgeError, CaptureContext, NativeArg, NativeBridge, NativeContext,
    NativeFn, ParamKind, StdoutContext,
};

/// Runtime error taxonomy. Every variant surfaces to the immediate caller
/// of the entry point that triggered it; nothing is retried, and registry
/// or heap state committed before the fault stays committed.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A class with this name is already registered
    #[error("class {0} is already registered")]
    DuplicateClass(String),

    /// A declaration names a superclass that is not registered
    #[error("class {class} extends unknown superclass {superclass}")]
    UnknownSuperclass {
        /// Declaring class
        class: String,
        /// Missing superclass name
        superclass: String,
    },

    /// An entry point was handed an unregistered class name
    #[error("unknown class {0}")]
    UnknownClass(String),

    /// No class in the chain declares the named field
    #[error("no field {field} in class {class} or its superclasses")]
    NoSuchField {
        /// Class the lookup started from
        class: String,
        /// Field name
        field: String,
    },

    /// No declared method matches the call after widening
    #[error("no applicable method {method} on class {class}")]
    NoSuchMethod {
        /// Class the lookup started from
        class: String,
        /// Method name
        method: String,
    },

    /// More than one candidate matches at the same widening cost
    #[error("ambiguous call to {method} on class {class}")]
    AmbiguousOverload {
        /// Class the lookup started from
        class: String,
        /// Method name
        method: String,
    },

    /// A cast target is neither the runtime class nor one of its ancestors
    #[error("cannot cast {from} to {to}")]
    InvalidCast {
        /// Runtime class name, or a primitive type name
        from: String,
        /// Target class name
        to: String,
    },

    /// Call depth limit exceeded
    #[error("stack overflow")]
    StackOverflow,

    /// An instance operation was given a null receiver
    #[error("null receiver")]
    NullPointer,

    /// A value of the wrong type reached a typed slot
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the slot expects
        expected: String,
        /// What arrived
        found: String,
    },

    /// Native bridge configuration error, surfaced at class registration
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Runtime result.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
