//! Sable SDK - the native bridge boundary
//!
//! This crate provides the minimal types a host needs to supply native
//! entry points to the Sable engine without depending on engine internals:
//!
//! - [`NativeBridge`] — `(name, kind) -> handler` registry, filled before
//!   any native method runs
//! - [`NativeContext`] — the output channel handlers emit to
//! - [`NativeArg`] / [`ParamKind`] — the closed set of argument kinds
//!
//! # Example
//!
//! ```
//! use sable_sdk::{install_print, NativeBridge};
//!
//! let mut bridge = NativeBridge::new();
//! install_print(&mut bridge, "print");
//! assert_eq!(bridge.len(), 5);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod context;
mod error;
mod registry;
mod value;

pub use context::{CaptureContext, NativeContext, StdoutContext};
pub use error::BridgeError;
pub use registry::{install_print, NativeBridge, NativeFn, PRINT_KINDS};
pub use value::{NativeArg, ParamKind};
