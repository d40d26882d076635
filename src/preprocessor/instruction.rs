//! Validated instruction representation
//!
//! Instructions are produced by preprocessing and are immutable from
//! then on.  Every [`Instruction`] carries the 1-based source line it
//! was parsed from; the engine uses it for line focus and for error
//! attribution.  Program positions are distinct from line numbers:
//! blank, comment, and label lines occupy no position but still count
//! as lines.

use std::fmt;

/// A value source in numeric context: a literal, a register, or a
/// main-memory cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(i32),
    Register(String),
    Memory(Address),
}

/// An address expression inside `M[..]` or `S[..]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Literal(i32),
    Register(String),
}

/// A value source in text context: anything printable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Printable {
    Operand(Operand),
    StringSlot(Address),
    Text(String),
}

/// Destination of a numeric assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericTarget {
    Register(String),
    Memory(Address),
}

/// The four arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => f.write_str("+"),
            BinOp::Sub => f.write_str("-"),
            BinOp::Mul => f.write_str("*"),
            BinOp::Div => f.write_str("/"),
        }
    }
}

/// Right-hand side of a numeric assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Operand(Operand),
    Binary {
        lhs: Operand,
        op: BinOp,
        rhs: Operand,
    },
}

/// Opcode plus operands.  Branch targets are resolved instruction
/// positions, not labels; label resolution happens during
/// preprocessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// `R1 = R0 + 2`, `M[MH] = R1`
    Assign { target: NumericTarget, value: Expr },
    /// `S[0] = "HI"`, `S[R1] = R0`
    AssignText { slot: Address, value: Printable },
    /// `JUMP LOOP`
    Jump { target: usize },
    /// `JUMPZ R0 DONE` — branch when the operand is zero
    JumpZero { cond: Operand, target: usize },
    /// `JUMPN R0 NEG` — branch when the operand is negative
    JumpNegative { cond: Operand, target: usize },
    /// `PRINT R1`
    Print { value: Printable },
    /// `HALT` or `HALT "MSG"`
    Halt { message: Option<String> },
}

/// One validated instruction tagged with its originating source line
/// (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub line: usize,
    pub op: Op,
}

/// An ordered, position-indexable instruction sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Program { instructions }
    }

    /// The instruction at `position`, or `None` past the end.
    pub fn instruction(&self, position: usize) -> Option<&Instruction> {
        self.instructions.get(position)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}
