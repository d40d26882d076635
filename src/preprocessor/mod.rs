//! Source-to-program translation
//!
//! The preprocessor turns raw source lines into an ordered, validated
//! [`Program`].  It is re-run in full on every transition into
//! execution mode; nothing is preprocessed incrementally and a previous
//! program is simply discarded.
//!
//! # Architecture
//!
//! - [`lexer`] — per-line tokenizer.
//! - [`instruction`] — the validated instruction representation.
//! - [`parse`] — statement parsing and two-pass label resolution,
//!   exposed as [`preprocess`].

pub mod instruction;
pub mod lexer;
pub mod parse;

pub use instruction::{
    Address, BinOp, Expr, Instruction, NumericTarget, Op, Operand, Printable, Program,
};
pub use parse::{preprocess, SyntaxError};
