//! Value model
//!
//! Runtime values are a tagged union over the four numeric widths, text,
//! and nullable references. Mixed 32/64-bit integer arithmetic widens the
//! 32-bit operand by sign extension before operating; overflow wraps with
//! two's-complement semantics. Floats follow IEEE-754 with no implicit
//! float/integer conversion.

use std::fmt;
use std::sync::Arc;

use crate::heap::ObjectId;
use crate::object::ClassId;
use crate::{RuntimeError, RuntimeResult};
use sable_sdk::ParamKind;

/// Runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 32-bit IEEE-754 float
    F32(f32),
    /// 64-bit IEEE-754 float
    F64(f64),
    /// Immutable text
    Str(Arc<str>),
    /// Object reference; `None` is the null reference
    Ref(Option<ObjectId>),
}

/// Declared type of a field or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit IEEE-754 float
    F32,
    /// 64-bit IEEE-754 float
    F64,
    /// Immutable text
    Str,
    /// Reference to an instance of the given class (or a descendant)
    Object(ClassId),
}

impl TypeTag {
    /// Zero value of this type: numeric zero, empty text, null reference.
    pub fn zero(&self) -> Value {
        match self {
            TypeTag::I32 => Value::I32(0),
            TypeTag::I64 => Value::I64(0),
            TypeTag::F32 => Value::F32(0.0),
            TypeTag::F64 => Value::F64(0.0),
            TypeTag::Str => Value::Str(Arc::from("")),
            TypeTag::Object(_) => Value::Ref(None),
        }
    }

    /// Bridge kind this type maps to, if it is bridgeable.
    pub fn param_kind(&self) -> Option<ParamKind> {
        match self {
            TypeTag::I32 => Some(ParamKind::I32),
            TypeTag::I64 => Some(ParamKind::I64),
            TypeTag::F32 => Some(ParamKind::F32),
            TypeTag::F64 => Some(ParamKind::F64),
            TypeTag::Str => Some(ParamKind::Text),
            TypeTag::Object(_) => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::I32 => f.write_str("i32"),
            TypeTag::I64 => f.write_str("i64"),
            TypeTag::F32 => f.write_str("f32"),
            TypeTag::F64 => f.write_str("f64"),
            TypeTag::Str => f.write_str("text"),
            TypeTag::Object(id) => write!(f, "object#{}", id.0),
        }
    }
}

/// Sign-extending widening of a 32-bit integer to 64 bits.
#[inline]
pub fn widen_i32(i: i32) -> i64 {
    i as i64
}

impl Value {
    /// Text value from a string slice.
    pub fn text(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// The null reference.
    pub const fn null() -> Self {
        Value::Ref(None)
    }

    /// Reference to a heap object.
    pub const fn object(id: ObjectId) -> Self {
        Value::Ref(Some(id))
    }

    /// Whether this is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Ref(None))
    }

    /// Type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "text",
            Value::Ref(_) => "reference",
        }
    }

    /// Extract as i64, widening an i32 operand.
    pub fn as_i64(&self) -> RuntimeResult<i64> {
        match self {
            Value::I32(i) => Ok(widen_i32(*i)),
            Value::I64(i) => Ok(*i),
            other => Err(RuntimeError::TypeMismatch {
                expected: "i64".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Extract as i32 without conversion.
    pub fn as_i32(&self) -> RuntimeResult<i32> {
        match self {
            Value::I32(i) => Ok(*i),
            other => Err(RuntimeError::TypeMismatch {
                expected: "i32".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Extract as f64, widening an f32 operand.
    pub fn as_f64(&self) -> RuntimeResult<f64> {
        match self {
            Value::F32(f) => Ok(*f as f64),
            Value::F64(f) => Ok(*f),
            other => Err(RuntimeError::TypeMismatch {
                expected: "f64".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Extract the reference payload.
    pub fn as_ref_id(&self) -> RuntimeResult<Option<ObjectId>> {
        match self {
            Value::Ref(id) => Ok(*id),
            other => Err(RuntimeError::TypeMismatch {
                expected: "reference".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Extract as text.
    pub fn as_text(&self) -> RuntimeResult<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(RuntimeError::TypeMismatch {
                expected: "text".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Numeric addition.
    ///
    /// Integer operands widen any i32 side to i64 before a wrapping 64-bit
    /// add; two i32 operands stay 32-bit with wraparound. Float operands
    /// follow IEEE-754. Mixing floats with integers is a type error.
    pub fn add(&self, other: &Value) -> RuntimeResult<Value> {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => Ok(Value::I32(a.wrapping_add(*b))),
            (Value::I32(a), Value::I64(b)) => Ok(Value::I64(widen_i32(*a).wrapping_add(*b))),
            (Value::I64(a), Value::I32(b)) => Ok(Value::I64(a.wrapping_add(widen_i32(*b)))),
            (Value::I64(a), Value::I64(b)) => Ok(Value::I64(a.wrapping_add(*b))),
            (Value::F32(a), Value::F32(b)) => Ok(Value::F32(a + b)),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a + b)),
            (a, b) => Err(RuntimeError::TypeMismatch {
                expected: format!("numeric operands of one family, got {}", a.type_name()),
                found: b.type_name().to_string(),
            }),
        }
    }

    /// Reference identity: both null, or the same heap object.
    pub fn ref_eq(&self, other: &Value) -> RuntimeResult<bool> {
        Ok(self.as_ref_id()? == other.as_ref_id()?)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
            Value::Ref(None) => f.write_str("null"),
            Value::Ref(Some(id)) => write!(f, "object@{}", id.0),
        }
    }
}
