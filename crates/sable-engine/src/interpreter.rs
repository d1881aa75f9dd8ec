//! Execution engine
//!
//! `Vm` owns the class registry, heap, call stack, and the linked native
//! bridge. The public entry points are the only way harness code runs
//! anything: `invoke_static`, `invoke_instance`, `invoke_constructor`, the
//! field accessors, and the type-test pair.
//!
//! Every call moves through `Dispatching -> Bound -> Executing` and ends
//! `Returned` or `Faulted`. Overload resolution is shared by statics,
//! instance calls, and constructors: exact parameter matches cost zero,
//! value-preserving widenings (i32 to i64, f32 to f64) cost one each, the
//! cheapest candidate wins, a cost tie is ambiguous, and native-bodied
//! candidates accept exact matches only.

use sable_sdk::{BridgeError, NativeArg, NativeBridge, NativeContext, ParamKind, StdoutContext};

use crate::heap::{Heap, ObjectId};
use crate::object::{ClassId, HostFn, InitState, MethodBody};
use crate::registry::ClassRegistry;
use crate::stack::{CallState, Frame, Stack, DEFAULT_MAX_CALL_DEPTH};
use crate::value::{TypeTag, Value};
use crate::{ClassDef, RuntimeError, RuntimeResult};

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct VmOptions {
    /// Maximum call depth before `StackOverflow`
    pub max_call_depth: usize,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// One overload candidate under resolution.
struct Candidate {
    params: Vec<TypeTag>,
    exact_only: bool,
}

/// The execution engine.
pub struct Vm {
    registry: ClassRegistry,
    heap: Heap,
    stack: Stack,
    bridge: NativeBridge,
    ctx: Box<dyn NativeContext>,
}

impl Vm {
    /// Engine with the given bridge, writing native output to stdout.
    pub fn new(bridge: NativeBridge) -> Self {
        Self::with_context(bridge, Box::new(StdoutContext))
    }

    /// Engine with the given bridge and output context.
    pub fn with_context(bridge: NativeBridge, ctx: Box<dyn NativeContext>) -> Self {
        Self::with_options(bridge, ctx, VmOptions::default())
    }

    /// Engine with explicit options.
    pub fn with_options(bridge: NativeBridge, ctx: Box<dyn NativeContext>, options: VmOptions) -> Self {
        Self {
            registry: ClassRegistry::new(),
            heap: Heap::new(),
            stack: Stack::with_max_depth(options.max_call_depth),
            bridge,
            ctx,
        }
    }

    /// Borrow the class registry.
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Borrow the heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Current call depth.
    pub fn call_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Register a class declaration, linking native methods to the bridge.
    pub fn register_class(&mut self, def: ClassDef) -> RuntimeResult<ClassId> {
        self.registry.register(def, &self.bridge)
    }

    /// Resolve a class id by name.
    pub fn class_id(&self, name: &str) -> RuntimeResult<ClassId> {
        self.registry.id_of(name)
    }

    fn class_name(&self, id: ClassId) -> String {
        self.registry.get(id).name.clone()
    }

    // ========================================================================
    // Type tests
    // ========================================================================

    /// `instanceof`: a non-null reference whose runtime class is `target`
    /// or one of its descendants. Null is not an instance of any type,
    /// the universal root included.
    pub fn is_instance(&self, value: &Value, target: ClassId) -> bool {
        match value {
            Value::Ref(Some(id)) => {
                let runtime = self.heap.get(*id).class_id;
                self.registry.is_subclass_of(runtime, target)
            }
            _ => false,
        }
    }

    /// Checked cast: identity on success, null passes every reference
    /// cast, anything else is `InvalidCast`. Representation never changes.
    pub fn check_cast(&self, value: &Value, target: ClassId) -> RuntimeResult<Value> {
        match value {
            Value::Ref(None) => Ok(value.clone()),
            Value::Ref(Some(_)) if self.is_instance(value, target) => Ok(value.clone()),
            Value::Ref(Some(id)) => Err(RuntimeError::InvalidCast {
                from: self.class_name(self.heap.get(*id).class_id),
                to: self.class_name(target),
            }),
            other => Err(RuntimeError::InvalidCast {
                from: other.type_name().to_string(),
                to: self.class_name(target),
            }),
        }
    }

    // ========================================================================
    // Static initialization
    // ========================================================================

    /// Run static initializers for `class` and its ancestors, ancestors
    /// first, each at most once. Re-entry from a class's own initializer
    /// returns immediately. Once an initializer begins, the class counts as
    /// initialized even if the body faults; a failing initializer is never
    /// re-run.
    pub fn ensure_initialized(&mut self, class: ClassId) -> RuntimeResult<()> {
        let chain = self.registry.get(class).ancestry.clone();
        for &c in chain.iter().rev() {
            self.init_class(c)?;
        }
        Ok(())
    }

    fn init_class(&mut self, class: ClassId) -> RuntimeResult<()> {
        match self.registry.get(class).init_state {
            InitState::Initialized | InitState::Initializing => return Ok(()),
            InitState::Uninitialized => {}
        }
        self.registry.get_mut(class).init_state = InitState::Initializing;

        let body = self.registry.get(class).static_init.clone();
        let result = match body {
            None => Ok(()),
            Some(body) => self.run_body(class, "static initializer", &body, Frame::for_static(class, Vec::new())),
        };

        // In-progress status is durable: no re-execution after a fault.
        self.registry.get_mut(class).init_state = InitState::Initialized;
        result
    }

    // ========================================================================
    // Field access
    // ========================================================================

    /// Read a field through an object reference. The declared kind picks
    /// instance or static storage; a static resolves to the declaring
    /// class's storage.
    pub fn read_field(&mut self, recv: &Value, name: &str) -> RuntimeResult<Value> {
        let id = recv.as_ref_id()?.ok_or(RuntimeError::NullPointer)?;
        let runtime = self.heap.get(id).class_id;
        let (declaring, is_static) = self.resolve_field(runtime, name)?;

        if is_static {
            self.read_static_slot(declaring, name)
        } else {
            self.heap
                .get(id)
                .get_field(name)
                .cloned()
                .ok_or_else(|| RuntimeError::NoSuchField {
                    class: self.class_name(runtime),
                    field: name.to_string(),
                })
        }
    }

    /// Write a field through an object reference. A value-preserving
    /// widening is applied when the declared type is wider.
    pub fn write_field(&mut self, recv: &Value, name: &str, value: Value) -> RuntimeResult<()> {
        let id = recv.as_ref_id()?.ok_or(RuntimeError::NullPointer)?;
        let runtime = self.heap.get(id).class_id;
        let (declaring, is_static) = self.resolve_field(runtime, name)?;
        let tag = self.field_tag(declaring, name);
        let stored = self.check_assignable(value, tag)?;

        if is_static {
            self.write_static_slot(declaring, name, stored)
        } else {
            self.heap.get_mut(id).set_field(name, stored);
            Ok(())
        }
    }

    /// Read a static field through the class itself.
    pub fn read_static(&mut self, class: ClassId, name: &str) -> RuntimeResult<Value> {
        let declaring = self.resolve_static_field(class, name)?;
        self.read_static_slot(declaring, name)
    }

    /// Write a static field through the class itself.
    pub fn write_static(&mut self, class: ClassId, name: &str, value: Value) -> RuntimeResult<()> {
        let declaring = self.resolve_static_field(class, name)?;
        let tag = self.field_tag(declaring, name);
        let stored = self.check_assignable(value, tag)?;
        self.write_static_slot(declaring, name, stored)
    }

    fn resolve_field(&self, start: ClassId, name: &str) -> RuntimeResult<(ClassId, bool)> {
        self.registry
            .resolve_field(start, name)
            .map(|(c, f)| (c, f.is_static))
            .ok_or_else(|| RuntimeError::NoSuchField {
                class: self.class_name(start),
                field: name.to_string(),
            })
    }

    fn resolve_static_field(&self, start: ClassId, name: &str) -> RuntimeResult<ClassId> {
        let (declaring, is_static) = self.resolve_field(start, name)?;
        if !is_static {
            return Err(RuntimeError::TypeMismatch {
                expected: "static field".to_string(),
                found: format!("instance field {}", name),
            });
        }
        Ok(declaring)
    }

    fn field_tag(&self, declaring: ClassId, name: &str) -> TypeTag {
        // resolve_field already proved the declaration exists.
        self.registry
            .get(declaring)
            .own_field(name)
            .map(|f| f.tag)
            .unwrap_or(TypeTag::I32)
    }

    fn read_static_slot(&mut self, declaring: ClassId, name: &str) -> RuntimeResult<Value> {
        self.ensure_initialized(declaring)?;
        Ok(self.registry.get(declaring).statics[name].clone())
    }

    fn write_static_slot(&mut self, declaring: ClassId, name: &str, value: Value) -> RuntimeResult<()> {
        self.ensure_initialized(declaring)?;
        self.registry
            .get_mut(declaring)
            .statics
            .insert(name.to_string(), value);
        Ok(())
    }

    fn check_assignable(&self, value: Value, tag: TypeTag) -> RuntimeResult<Value> {
        match self.widening_cost(&value, tag) {
            Some(_) => Ok(coerce(value, tag)),
            None => Err(RuntimeError::TypeMismatch {
                expected: tag.to_string(),
                found: value.type_name().to_string(),
            }),
        }
    }

    // ========================================================================
    // Invocation entry points
    // ========================================================================

    /// Invoke a static method. Candidates come from the nearest class in
    /// the chain declaring any static of that name.
    pub fn invoke_static(&mut self, class: ClassId, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        self.ensure_initialized(class)?;

        let chain = self.registry.get(class).ancestry.clone();
        let mut binding: Option<(ClassId, Vec<usize>)> = None;
        for c in chain {
            let indices: Vec<usize> = self
                .registry
                .get(c)
                .methods
                .iter()
                .enumerate()
                .filter(|(_, m)| m.is_static && m.name == name)
                .map(|(i, _)| i)
                .collect();
            if !indices.is_empty() {
                binding = Some((c, indices));
                break;
            }
        }
        let (declaring, indices) = binding.ok_or_else(|| RuntimeError::NoSuchMethod {
            class: self.class_name(class),
            method: name.to_string(),
        })?;

        let record = self.stack.push(declaring, name)?;
        let result = self.dispatch_static(record, declaring, &indices, name, args);
        self.stack.pop(result.is_err());
        result
    }

    /// Invoke a static method with the class given by name.
    pub fn invoke_static_by_name(&mut self, class: &str, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        let id = self.class_id(class)?;
        self.invoke_static(id, name, args)
    }

    fn dispatch_static(
        &mut self,
        record: usize,
        declaring: ClassId,
        indices: &[usize],
        name: &str,
        args: &[Value],
    ) -> RuntimeResult<Value> {
        let candidates: Vec<Candidate> = {
            let cls = self.registry.get(declaring);
            indices
                .iter()
                .map(|&i| Candidate {
                    params: cls.methods[i].params.clone(),
                    exact_only: cls.methods[i].is_native(),
                })
                .collect()
        };
        let chosen = self.resolve_overload(declaring, name, &candidates, args)?;
        self.stack.set_state(record, CallState::Bound);

        let method_index = indices[chosen];
        let (params, body) = {
            let m = &self.registry.get(declaring).methods[method_index];
            (m.params.clone(), m.body.clone())
        };
        let frame = Frame::for_static(declaring, coerce_args(args, &params));
        self.stack.set_state(record, CallState::Executing);
        self.run_bound(&body, frame)
    }

    /// Invoke an instance method through a reference value. Dispatch is
    /// dynamic: overloads resolve against the receiver's runtime class's
    /// vtable, so the most specific override wins no matter what the
    /// reference was declared as.
    pub fn invoke_instance(&mut self, recv: &Value, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        let id = recv.as_ref_id()?.ok_or(RuntimeError::NullPointer)?;
        let runtime = self.heap.get(id).class_id;

        let entries: Vec<(Vec<TypeTag>, crate::object::MethodRef)> = self
            .registry
            .get(runtime)
            .vtable
            .iter()
            .filter(|(sig, _)| sig.name == name)
            .map(|(sig, mref)| (sig.params.clone(), *mref))
            .collect();
        if entries.is_empty() {
            return Err(RuntimeError::NoSuchMethod {
                class: self.class_name(runtime),
                method: name.to_string(),
            });
        }

        let record = self.stack.push(runtime, name)?;
        let result = self.dispatch_instance(record, runtime, id, &entries, name, args);
        self.stack.pop(result.is_err());
        result
    }

    fn dispatch_instance(
        &mut self,
        record: usize,
        runtime: ClassId,
        this: ObjectId,
        entries: &[(Vec<TypeTag>, crate::object::MethodRef)],
        name: &str,
        args: &[Value],
    ) -> RuntimeResult<Value> {
        let candidates: Vec<Candidate> = entries
            .iter()
            .map(|(params, mref)| Candidate {
                params: params.clone(),
                exact_only: self.registry.get(mref.class_id).methods[mref.index].is_native(),
            })
            .collect();
        let chosen = self.resolve_overload(runtime, name, &candidates, args)?;
        self.stack.set_state(record, CallState::Bound);

        let (params, mref) = entries[chosen].clone();
        let body = self.registry.get(mref.class_id).methods[mref.index].body.clone();
        let frame = Frame::for_instance(mref.class_id, this, coerce_args(args, &params));
        self.stack.set_state(record, CallState::Executing);
        self.run_bound(&body, frame)
    }

    /// Construct an instance: initialize the class chain, allocate with
    /// zeroed fields, default-construct the superclass region unless the
    /// bound constructor does its own, then run the constructor body.
    pub fn invoke_constructor(&mut self, class: ClassId, args: &[Value]) -> RuntimeResult<Value> {
        self.ensure_initialized(class)?;
        let obj = self.heap.allocate(self.registry.get(class));
        self.construct_onto(obj, class, args)?;
        Ok(Value::object(obj))
    }

    /// Construct an instance with the class given by name.
    pub fn invoke_constructor_by_name(&mut self, class: &str, args: &[Value]) -> RuntimeResult<Value> {
        let id = self.class_id(class)?;
        self.invoke_constructor(id, args)
    }

    /// Explicit superclass construction step, for constructor bodies
    /// declared with their own super call.
    pub fn construct_super(&mut self, obj: ObjectId, super_class: ClassId, args: &[Value]) -> RuntimeResult<()> {
        let runtime = self.heap.get(obj).class_id;
        if !self.registry.is_subclass_of(runtime, super_class) {
            return Err(RuntimeError::TypeMismatch {
                expected: format!("superclass of {}", self.class_name(runtime)),
                found: self.class_name(super_class),
            });
        }
        self.construct_onto(obj, super_class, args)
    }

    fn construct_onto(&mut self, obj: ObjectId, class: ClassId, args: &[Value]) -> RuntimeResult<()> {
        let (parent_id, ctor_count) = {
            let cls = self.registry.get(class);
            (cls.parent_id, cls.constructors.len())
        };

        if ctor_count == 0 {
            if !args.is_empty() {
                return Err(RuntimeError::NoSuchMethod {
                    class: self.class_name(class),
                    method: "constructor".to_string(),
                });
            }
            // Implicit default: the superclass region is default-constructed,
            // own fields stay at their zero values.
            if let Some(parent) = parent_id {
                self.construct_onto(obj, parent, &[])?;
            }
            return Ok(());
        }

        let record = self.stack.push(class, "constructor")?;
        let result = self.dispatch_constructor(record, obj, class, parent_id, args);
        self.stack.pop(result.is_err());
        result
    }

    fn dispatch_constructor(
        &mut self,
        record: usize,
        obj: ObjectId,
        class: ClassId,
        parent_id: Option<ClassId>,
        args: &[Value],
    ) -> RuntimeResult<()> {
        let candidates: Vec<Candidate> = self
            .registry
            .get(class)
            .constructors
            .iter()
            .map(|c| Candidate {
                params: c.params.clone(),
                exact_only: false,
            })
            .collect();
        let chosen = self.resolve_overload(class, "constructor", &candidates, args)?;
        self.stack.set_state(record, CallState::Bound);

        let (params, explicit_super, body) = {
            let c = &self.registry.get(class).constructors[chosen];
            (c.params.clone(), c.explicit_super, c.body.clone())
        };

        // The superclass portion is never observed unconstructed: default
        // construction runs first unless the body takes over.
        if !explicit_super {
            if let Some(parent) = parent_id {
                self.construct_onto(obj, parent, &[])?;
            }
        }

        let frame = Frame::for_instance(class, obj, coerce_args(args, &params));
        self.stack.set_state(record, CallState::Executing);
        body(self, &frame).map(|_| ())
    }

    // ========================================================================
    // Bodies and natives
    // ========================================================================

    fn run_bound(&mut self, body: &MethodBody, frame: Frame) -> RuntimeResult<Value> {
        match body {
            MethodBody::Host(f) => f(self, &frame),
            MethodBody::Native(native) => {
                // Natives produce a side effect and no value; callers see
                // the null reference.
                self.call_native(native, frame.arg(0))?;
                Ok(Value::null())
            }
        }
    }

    fn run_body(&mut self, class: ClassId, name: &str, body: &HostFn, frame: Frame) -> RuntimeResult<()> {
        let record = self.stack.push(class, name)?;
        self.stack.set_state(record, CallState::Bound);
        self.stack.set_state(record, CallState::Executing);
        let result = body(self, &frame);
        self.stack.pop(result.is_err());
        result.map(|_| ())
    }

    fn call_native(&mut self, native: &str, arg: &Value) -> RuntimeResult<()> {
        let (kind, native_arg) = match arg {
            Value::Str(s) => (ParamKind::Text, NativeArg::Text(s)),
            Value::I32(v) => (ParamKind::I32, NativeArg::I32(*v)),
            Value::I64(v) => (ParamKind::I64, NativeArg::I64(*v)),
            Value::F32(v) => (ParamKind::F32, NativeArg::F32(*v)),
            Value::F64(v) => (ParamKind::F64, NativeArg::F64(*v)),
            Value::Ref(_) => {
                return Err(RuntimeError::TypeMismatch {
                    expected: "bridgeable primitive".to_string(),
                    found: "reference".to_string(),
                })
            }
        };
        // Linked at registration; a miss here means the bridge changed
        // underneath us and is still a configuration error.
        let handler = self
            .bridge
            .resolve(native, kind)
            .ok_or_else(|| BridgeError::MissingEntry {
                name: native.to_string(),
                kind,
            })?;
        handler(self.ctx.as_mut(), native_arg);
        Ok(())
    }

    // ========================================================================
    // Overload resolution
    // ========================================================================

    fn widening_cost(&self, arg: &Value, param: TypeTag) -> Option<u32> {
        match (arg, param) {
            (Value::I32(_), TypeTag::I32)
            | (Value::I64(_), TypeTag::I64)
            | (Value::F32(_), TypeTag::F32)
            | (Value::F64(_), TypeTag::F64)
            | (Value::Str(_), TypeTag::Str) => Some(0),
            (Value::I32(_), TypeTag::I64) => Some(1),
            (Value::F32(_), TypeTag::F64) => Some(1),
            (Value::Ref(None), TypeTag::Object(_)) => Some(0),
            (Value::Ref(Some(id)), TypeTag::Object(target)) => {
                let runtime = self.heap.get(*id).class_id;
                if self.registry.is_subclass_of(runtime, target) {
                    Some(0)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn resolve_overload(
        &self,
        class: ClassId,
        method: &str,
        candidates: &[Candidate],
        args: &[Value],
    ) -> RuntimeResult<usize> {
        let mut best: Option<(u32, usize)> = None;
        let mut tied = false;

        for (i, cand) in candidates.iter().enumerate() {
            if cand.params.len() != args.len() {
                continue;
            }
            let mut total = 0u32;
            let mut applicable = true;
            for (arg, param) in args.iter().zip(&cand.params) {
                match self.widening_cost(arg, *param) {
                    Some(cost) => total += cost,
                    None => {
                        applicable = false;
                        break;
                    }
                }
            }
            if !applicable || (cand.exact_only && total != 0) {
                continue;
            }
            match best {
                None => best = Some((total, i)),
                Some((best_cost, _)) if total < best_cost => {
                    best = Some((total, i));
                    tied = false;
                }
                Some((best_cost, _)) if total == best_cost => tied = true,
                Some(_) => {}
            }
        }

        match best {
            Some((_, i)) if !tied => Ok(i),
            Some(_) => Err(RuntimeError::AmbiguousOverload {
                class: self.class_name(class),
                method: method.to_string(),
            }),
            None => Err(RuntimeError::NoSuchMethod {
                class: self.class_name(class),
                method: method.to_string(),
            }),
        }
    }
}

/// Apply the widening the chosen overload requires, so bodies see values of
/// the declared parameter types.
fn coerce(value: Value, param: TypeTag) -> Value {
    match (&value, param) {
        (Value::I32(v), TypeTag::I64) => Value::I64(crate::value::widen_i32(*v)),
        (Value::F32(v), TypeTag::F64) => Value::F64(*v as f64),
        _ => value,
    }
}

fn coerce_args(args: &[Value], params: &[TypeTag]) -> Vec<Value> {
    args.iter()
        .cloned()
        .zip(params)
        .map(|(a, p)| coerce(a, *p))
        .collect()
}
