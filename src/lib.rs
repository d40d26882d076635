//! # Introduction
//!
//! A100 is a small assembly-like teaching language.  This crate is its
//! execution core: it turns source text into a validated instruction
//! sequence and interprets it against an explicit machine state made of
//! named registers, a fixed-size main memory, and a fixed-size string
//! buffer.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Preprocessor → Program → Engine → Observer notifications
//! ```
//!
//! 1. [`preprocessor`] — tokenises each source line, validates operand
//!    shapes, resolves labels, and produces a line-tagged
//!    [`preprocessor::Program`].
//! 2. [`machine`] — the machine state: range-checked registers, main
//!    memory, and the string buffer.
//! 3. [`interpreter`] — the fetch-decode-execute engine with single-step
//!    and continuous-run disciplines, plus the cancellable worker used
//!    for continuous runs.
//! 4. [`observer`] — the notification contract a host (an editor UI, a
//!    CLI, a test harness) implements to watch execution.
//!
//! The host drives the engine only through `start` / `step` / `run` /
//! cancellation and reacts to notifications; it never reaches into
//! engine internals.
//!
//! ## The language
//!
//! Assignments between registers, literals, and memory cells
//! (`R1 = R0 + 2`, `M[MH] = R1`), string-buffer stores (`S[0] = "HI"`),
//! label-based branches (`JUMP LOOP`, `JUMPZ R0 DONE`, `JUMPN R2 NEG`),
//! text output (`PRINT R1`), and `HALT` with an optional message.
//! Comments start with `#`; blank lines are ignored.  Source files use
//! the `.A1` extension and are plain UTF-8 text.

pub mod config;
pub mod interpreter;
pub mod machine;
pub mod observer;
pub mod preprocessor;
