//! Bridge configuration errors
//!
//! A bridge that cannot satisfy a declared native signature is a wiring
//! mistake, not a runtime condition. These errors surface when classes are
//! linked against the bridge, not at each call site.

use crate::value::ParamKind;

/// Native bridge configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// A declared native method has no matching `(name, kind)` entry.
    #[error("no native entry for {name}({kind})")]
    MissingEntry {
        /// Native operation name
        name: String,
        /// Declared parameter kind
        kind: ParamKind,
    },

    /// A native method was declared with a signature the bridge cannot carry.
    #[error("native method {class}.{method} has an unbridgeable signature: {reason}")]
    BadSignature {
        /// Declaring class name
        class: String,
        /// Method name
        method: String,
        /// What is wrong with the declaration
        reason: String,
    },
}
