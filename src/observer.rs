//! Host-facing contracts
//!
//! The engine never draws anything and never reads an editor widget.  It
//! talks to its host through two small traits: [`Observer`], which the
//! host implements to be told about state changes, focus movement,
//! output, and errors; and [`SourceProvider`], which the host implements
//! to hand the preprocessor raw program text one line at a time.
//!
//! All `Observer` methods default to no-ops so a host only implements
//! the notifications it cares about.  Continuous runs execute on a
//! worker thread, so observers must be `Send + Sync`; implementations
//! that mutate (a recording test observer, a UI channel) use interior
//! mutability.

/// Notifications emitted by the machine state and the execution engine.
///
/// Line numbers are 1-based source line numbers; addresses and indices
/// are 0-based.  The engine guarantees exactly one [`on_error`] or
/// [`on_halted`] per run, never both.
///
/// [`on_error`]: Observer::on_error
/// [`on_halted`]: Observer::on_halted
pub trait Observer: Send + Sync {
    /// A register's value changed.
    fn on_register_changed(&self, name: &str, value: i32) {
        let _ = (name, value);
    }

    /// A main-memory cell changed.
    fn on_memory_changed(&self, address: usize, value: i32) {
        let _ = (address, value);
    }

    /// A string-buffer cell changed.
    fn on_string_buffer_changed(&self, index: usize, text: &str) {
        let _ = (index, text);
    }

    /// The instruction on this source line is about to execute.
    fn on_line_focus(&self, line: usize) {
        let _ = line;
    }

    /// This memory address is now the active one (for focus/scroll).
    fn on_memory_focus(&self, address: usize) {
        let _ = address;
    }

    /// The program produced text output.
    fn on_output(&self, text: &str) {
        let _ = text;
    }

    /// A fatal error ended the run; the host should return to editing.
    fn on_error(&self, line: usize, message: &str) {
        let _ = (line, message);
    }

    /// The run ended by natural or explicit termination.
    fn on_halted(&self) {}
}

/// An observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Per-line access to program source, as an editor buffer provides it.
///
/// Lookup is 0-based; the preprocessor converts to 1-based line numbers
/// when tagging instructions and reporting errors.
pub trait SourceProvider {
    /// The text of line `index`, or `None` past the end of the source.
    fn line(&self, index: usize) -> Option<&str>;

    /// Total number of source lines.
    fn line_count(&self) -> usize;
}

impl SourceProvider for str {
    fn line(&self, index: usize) -> Option<&str> {
        self.lines().nth(index)
    }

    fn line_count(&self) -> usize {
        self.lines().count()
    }
}

impl SourceProvider for [String] {
    fn line(&self, index: usize) -> Option<&str> {
        self.get(index).map(String::as_str)
    }

    fn line_count(&self) -> usize {
        self.len()
    }
}
