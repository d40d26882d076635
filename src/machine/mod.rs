//! Machine state: registers, main memory, and the string buffer
//!
//! [`MachineState`] owns every mutable cell the interpreter touches.
//! All access goes through checked accessors that enforce the numeric
//! range invariant and the array bounds, notify the shared
//! [`Observer`](crate::observer::Observer) on success, and mutate
//! nothing on failure.
//!
//! Errors at this layer carry no line number: the machine does not know
//! which instruction asked.  The engine wraps them with the offending
//! line as a [`RuntimeError`](crate::interpreter::RuntimeError).

mod state;

pub use state::{MachineState, MH, PC};

use std::fmt;

/// Which fixed-size array an out-of-bounds access targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    MainMemory,
    StringBuffer,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::MainMemory => f.write_str("main memory"),
            Region::StringBuffer => f.write_str("string buffer"),
        }
    }
}

/// Errors raised by the machine-state accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    /// A register name that was never registered.
    UnknownRegister { name: String },

    /// `add_register` was called twice with the same name.
    DuplicateRegister { name: String },

    /// A value outside the configured numeric range.  Carried as `i64`
    /// so intermediate arithmetic results wider than a cell can be
    /// reported through the same variant.
    ValueOutOfRange { value: i64, min: i32, max: i32 },

    /// An address outside a fixed-size array.
    AddressOutOfRange {
        region: Region,
        address: i32,
        length: usize,
    },
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineError::UnknownRegister { name } => {
                write!(f, "unknown register '{}'", name)
            }
            MachineError::DuplicateRegister { name } => {
                write!(f, "register '{}' already exists", name)
            }
            MachineError::ValueOutOfRange { value, min, max } => {
                write!(f, "value {} outside allowed range [{}, {}]", value, min, max)
            }
            MachineError::AddressOutOfRange {
                region,
                address,
                length,
            } => {
                write!(
                    f,
                    "address {} outside {} bounds [0, {})",
                    address, region, length
                )
            }
        }
    }
}

impl std::error::Error for MachineError {}
