//! The execution engine and its run disciplines
//!
//! - [`engine`] — the fetch-decode-execute core and the
//!   Idle/Running/Halted state machine.
//! - [`errors`] — fatal runtime errors, line-tagged.
//! - [`worker`] — the dedicated thread and cancellation flag used for
//!   continuous runs.

pub mod engine;
pub mod errors;
pub mod worker;

pub use engine::{Engine, Mode};
pub use errors::{RuntimeError, RuntimeErrorKind};
pub use worker::{CancelFlag, Worker};
