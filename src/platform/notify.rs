//! Terminal notifications

use crate::platform::{Notifier, ToastOptions};
use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

/// Prints toasts to stderr and mirrors them into tracing
///
/// Toasts never touch stdout, which stays reserved for command output such as
/// the `--json` status.
pub struct ConsoleNotifier {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleNotifier {
    /// Create a notifier that writes to stderr
    pub fn new() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Create a notifier that writes toasts to `out`
    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    fn print(&self, mark: char, message: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(out, "{mark} {message}").and_then(|()| out.flush()) {
            tracing::debug!(error = %err, "Failed to print toast");
        }
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConsoleNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleNotifier").finish_non_exhaustive()
    }
}

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str, options: &ToastOptions) {
        tracing::info!(target: "qrshare::toast", position = options.position.as_str(), "{message}");
        self.print('✓', message);
    }

    fn error(&self, message: &str, options: &ToastOptions) {
        tracing::warn!(target: "qrshare::toast", position = options.position.as_str(), "{message}");
        self.print('✗', message);
    }
}
