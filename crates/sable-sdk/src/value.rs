//! Bridge-side argument representation
//!
//! Native handlers receive a borrowed view of the engine value. The set of
//! kinds a native entry point can accept is closed: text plus the four
//! numeric widths. There is no implicit conversion at this boundary — each
//! kind has its own dedicated entry point.

use std::fmt;

/// Primitive kind tag for a native entry point parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Textual argument
    Text,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit IEEE-754 float
    F32,
    /// 64-bit IEEE-754 float
    F64,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Text => "text",
            ParamKind::I32 => "i32",
            ParamKind::I64 => "i64",
            ParamKind::F32 => "f32",
            ParamKind::F64 => "f64",
        };
        f.write_str(s)
    }
}

/// Borrowed argument handed to a native handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeArg<'a> {
    /// Textual argument
    Text(&'a str),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 32-bit IEEE-754 float
    F32(f32),
    /// 64-bit IEEE-754 float
    F64(f64),
}

impl NativeArg<'_> {
    /// The kind tag of this argument.
    pub fn kind(&self) -> ParamKind {
        match self {
            NativeArg::Text(_) => ParamKind::Text,
            NativeArg::I32(_) => ParamKind::I32,
            NativeArg::I64(_) => ParamKind::I64,
            NativeArg::F32(_) => ParamKind::F32,
            NativeArg::F64(_) => ParamKind::F64,
        }
    }
}

impl fmt::Display for NativeArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeArg::Text(s) => f.write_str(s),
            NativeArg::I32(v) => write!(f, "{}", v),
            NativeArg::I64(v) => write!(f, "{}", v),
            NativeArg::F32(v) => write!(f, "{}", v),
            NativeArg::F64(v) => write!(f, "{}", v),
        }
    }
}
