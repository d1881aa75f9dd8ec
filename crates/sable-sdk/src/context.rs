//! NativeContext trait — the output channel natives write to
//!
//! The engine hands every native call a `&mut dyn NativeContext`. Hosts
//! program against this trait without depending on engine internals.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Output channel for native side effects.
pub trait NativeContext {
    /// Emit a textual representation to the channel.
    fn emit(&mut self, text: &str);
}

/// Context writing directly to process stdout.
#[derive(Debug, Default)]
pub struct StdoutContext;

impl NativeContext for StdoutContext {
    fn emit(&mut self, text: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        // Diagnostic output; a failed write has nowhere to report to.
        let _ = lock.write_all(text.as_bytes());
    }
}

/// Context collecting output into a shared buffer.
///
/// The buffer handle can be cloned out before the context is moved into the
/// engine, so tests and embedders can read everything emitted so far.
#[derive(Debug, Default)]
pub struct CaptureContext {
    buf: Arc<Mutex<String>>,
}

impl CaptureContext {
    /// Create an empty capture context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the shared buffer handle.
    pub fn handle(&self) -> Arc<Mutex<String>> {
        Arc::clone(&self.buf)
    }
}

impl NativeContext for CaptureContext {
    fn emit(&mut self, text: &str) {
        self.buf.lock().push_str(text);
    }
}
