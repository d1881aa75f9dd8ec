//! Native bridge registry
//!
//! A fixed table of `(name, kind) -> handler` entries the embedding host
//! supplies before any native method is invoked. Each primitive kind has
//! its own dedicated entry point; resolution is exact-kind only.

use std::collections::HashMap;

use crate::context::NativeContext;
use crate::value::{NativeArg, ParamKind};

/// Native handler function pointer.
pub type NativeFn = fn(&mut dyn NativeContext, NativeArg<'_>);

/// Registry of host-provided native entry points.
#[derive(Default)]
pub struct NativeBridge {
    entries: HashMap<(String, ParamKind), NativeFn>,
}

impl std::fmt::Debug for NativeBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBridge")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl NativeBridge {
    /// Create an empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `(name, kind)`. A later registration under the
    /// same key replaces the earlier one.
    pub fn register(&mut self, name: &str, kind: ParamKind, handler: NativeFn) {
        self.entries.insert((name.to_string(), kind), handler);
    }

    /// Resolve a handler by exact name and kind.
    pub fn resolve(&self, name: &str, kind: ParamKind) -> Option<NativeFn> {
        self.entries.get(&(name.to_string(), kind)).copied()
    }

    /// Whether an entry exists for `(name, kind)`.
    pub fn contains(&self, name: &str, kind: ParamKind) -> bool {
        self.entries.contains_key(&(name.to_string(), kind))
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bridge has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The five diagnostic print signatures, one entry per primitive kind.
pub const PRINT_KINDS: [ParamKind; 5] = [
    ParamKind::Text,
    ParamKind::I32,
    ParamKind::I64,
    ParamKind::F32,
    ParamKind::F64,
];

fn print_handler(ctx: &mut dyn NativeContext, arg: NativeArg<'_>) {
    ctx.emit(&arg.to_string());
}

/// Install the diagnostic print entries under a shared name, one per
/// primitive kind. Each emits the textual form of its argument.
pub fn install_print(bridge: &mut NativeBridge, name: &str) {
    for kind in PRINT_KINDS {
        bridge.register(name, kind, print_handler);
    }
}
