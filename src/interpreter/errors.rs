//! Runtime error types for the execution engine
//!
//! Every runtime failure is fatal: the engine transitions to Halted and
//! reports the error to the observer exactly once.  The interpreter is
//! deterministic, so re-running the same program from Idle reproduces
//! the same error at the same line.

use crate::machine::MachineError;
use std::fmt;

/// What went wrong while executing an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// A machine-state accessor rejected the access: unknown register,
    /// value out of range, or address out of bounds.
    Machine(MachineError),

    /// Division (or an intermediate result) by zero.
    DivisionByZero,

    /// `HALT "MSG"` — an explicit halt that carries a message for the
    /// host, surfaced through the error channel so the host drops back
    /// to edit mode with the message shown.
    Halt(String),
}

/// A runtime failure wrapped with the 1-based source line of the
/// instruction that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub line: usize,
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn machine(line: usize, error: MachineError) -> Self {
        RuntimeError {
            line,
            kind: RuntimeErrorKind::Machine(error),
        }
    }

    pub fn division_by_zero(line: usize) -> Self {
        RuntimeError {
            line,
            kind: RuntimeErrorKind::DivisionByZero,
        }
    }

    pub fn halt(line: usize, message: String) -> Self {
        RuntimeError {
            line,
            kind: RuntimeErrorKind::Halt(message),
        }
    }

    /// The human-readable message without the line prefix, as handed to
    /// [`Observer::on_error`](crate::observer::Observer::on_error)
    /// alongside the line number.
    pub fn message(&self) -> String {
        match &self.kind {
            RuntimeErrorKind::Machine(error) => error.to_string(),
            RuntimeErrorKind::DivisionByZero => "division by zero".to_string(),
            RuntimeErrorKind::Halt(message) => message.clone(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message())
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            RuntimeErrorKind::Machine(error) => Some(error),
            _ => None,
        }
    }
}
