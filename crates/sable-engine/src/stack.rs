//! Call stack and frames
//!
//! Each invocation gets an independent `Frame` holding its receiver and
//! coerced arguments; the `Stack` tracks one record per active call so
//! recursion depth is bounded and diagnosable. Recursive self-calls are
//! ordinary calls; exceeding the depth limit faults the current top-level
//! invocation only.

use crate::heap::ObjectId;
use crate::object::ClassId;
use crate::value::Value;
use crate::{RuntimeError, RuntimeResult};

/// Per-call state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Overload resolution in progress
    Dispatching,
    /// A concrete implementation has been selected
    Bound,
    /// The body is running
    Executing,
    /// The body returned normally
    Returned,
    /// The body (or dispatch) failed
    Faulted,
}

/// Locals of one invocation: receiver plus coerced arguments.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Class the bound implementation belongs to
    pub class_id: ClassId,
    /// Receiver; `None` for static and initializer frames
    pub this: Option<ObjectId>,
    /// Arguments after widening coercion to the declared parameter types
    pub args: Vec<Value>,
}

impl Frame {
    /// Frame for a static call.
    pub fn for_static(class_id: ClassId, args: Vec<Value>) -> Self {
        Self {
            class_id,
            this: None,
            args,
        }
    }

    /// Frame for an instance call.
    pub fn for_instance(class_id: ClassId, this: ObjectId, args: Vec<Value>) -> Self {
        Self {
            class_id,
            this: Some(this),
            args,
        }
    }

    /// The receiver, faulting on static frames.
    pub fn this(&self) -> RuntimeResult<ObjectId> {
        self.this.ok_or(RuntimeError::NullPointer)
    }

    /// Borrow argument `i`.
    pub fn arg(&self, i: usize) -> &Value {
        &self.args[i]
    }

    /// Argument `i` as i64 (widening an i32).
    pub fn arg_i64(&self, i: usize) -> RuntimeResult<i64> {
        self.args[i].as_i64()
    }

    /// Argument `i` as i32.
    pub fn arg_i32(&self, i: usize) -> RuntimeResult<i32> {
        self.args[i].as_i32()
    }

    /// Argument `i` as a reference payload.
    pub fn arg_ref(&self, i: usize) -> RuntimeResult<Option<ObjectId>> {
        self.args[i].as_ref_id()
    }
}

/// One record per active call, for depth accounting and diagnostics.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// Class the call was dispatched against
    pub class_id: ClassId,
    /// Method (or pseudo-method) name
    pub method: String,
    /// Where the call is in its lifecycle
    pub state: CallState,
}

/// Default maximum call depth.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// Call stack.
#[derive(Debug)]
pub struct Stack {
    records: Vec<FrameRecord>,
    max_depth: usize,
}

impl Stack {
    /// Create a stack with the default depth limit.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    /// Create a stack with a specific depth limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            records: Vec::new(),
            max_depth,
        }
    }

    /// Push a record for a new call in the `Dispatching` state.
    ///
    /// # Errors
    ///
    /// `RuntimeError::StackOverflow` when the depth limit is reached.
    pub fn push(&mut self, class_id: ClassId, method: &str) -> RuntimeResult<usize> {
        if self.records.len() >= self.max_depth {
            return Err(RuntimeError::StackOverflow);
        }
        self.records.push(FrameRecord {
            class_id,
            method: method.to_string(),
            state: CallState::Dispatching,
        });
        Ok(self.records.len() - 1)
    }

    /// Advance the state of the record at `index`.
    pub fn set_state(&mut self, index: usize, state: CallState) {
        if let Some(record) = self.records.get_mut(index) {
            record.state = state;
        }
    }

    /// Pop the top record, tagging it `Returned` or `Faulted`.
    pub fn pop(&mut self, faulted: bool) {
        if let Some(mut record) = self.records.pop() {
            record.state = if faulted {
                CallState::Faulted
            } else {
                CallState::Returned
            };
        }
    }

    /// Current call depth.
    pub fn depth(&self) -> usize {
        self.records.len()
    }

    /// Whether no call is active.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
