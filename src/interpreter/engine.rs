//! Fetch-decode-execute engine
//!
//! The engine owns the [`MachineState`] and drives it through a three
//! mode state machine:
//!
//! - **Idle** — editing; no program loaded.
//! - **Running** — a program is loaded and executing (stepped or
//!   continuous).
//! - **Halted** — stopped after natural termination, `HALT`, a runtime
//!   error, or cancellation.
//!
//! `start` re-runs preprocessing from scratch every time; `step`
//! executes exactly one instruction; `run` loops `step` with a
//! cooperative cancellation check between instructions.  All state
//! changes and errors surface through the shared
//! [`Observer`](crate::observer::Observer); errors additionally park in
//! [`Engine::last_error`] for hosts that want the typed value.

use crate::config::MachineConfig;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::worker::CancelFlag;
use crate::machine::{MachineError, MachineState, PC};
use crate::observer::{Observer, SourceProvider};
use crate::preprocessor::{
    preprocess, Address, BinOp, Expr, Instruction, NumericTarget, Op, Operand, Printable, Program,
};
use std::sync::Arc;

/// Execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Running,
    Halted,
}

/// What the executed instruction decided about control flow.
enum Flow {
    /// Advance the program counter by one.
    Next,
    /// The instruction already wrote the program counter itself.
    Stay,
    /// Branch to an instruction position.
    Jump(usize),
    /// Clean halt; no more instructions execute.
    Halt,
}

/// The A100 execution engine.
pub struct Engine {
    config: MachineConfig,
    state: MachineState,
    program: Program,
    mode: Mode,
    cancel: CancelFlag,
    observer: Arc<dyn Observer>,
    last_error: Option<RuntimeError>,
}

impl Engine {
    /// Builds an idle engine with a freshly zeroed machine.
    pub fn new(config: MachineConfig, observer: Arc<dyn Observer>) -> Result<Self, MachineError> {
        let state = MachineState::new(&config, Arc::clone(&observer))?;
        Ok(Engine {
            config,
            state,
            program: Program::default(),
            mode: Mode::Idle,
            cancel: CancelFlag::new(),
            observer,
            last_error: None,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Read access to the machine for hosts and tests.  The engine
    /// keeps exclusive write access.
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The error that ended the last run, if any.
    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.last_error.as_ref()
    }

    /// A clone of the cancellation flag, safe to hand to another
    /// thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Requests cooperative cancellation of a continuous run.  No
    /// effect unless Running; never interrupts an in-flight
    /// instruction.
    pub fn request_cancel(&self) {
        if self.mode == Mode::Running {
            self.cancel.request();
        }
    }

    /// Idle → Running: resets the machine, re-preprocesses the source,
    /// and loads the resulting program.  A syntax error goes straight
    /// to Halted via `on_error` and the run never starts.
    pub fn start<S: SourceProvider + ?Sized>(&mut self, source: &S) -> Mode {
        if self.mode != Mode::Idle {
            return self.mode;
        }

        self.last_error = None;
        self.cancel.clear();
        self.state.reset();

        match preprocess(source, &self.config) {
            Ok(program) => {
                self.program = program;
                self.mode = Mode::Running;
            }
            Err(error) => {
                self.mode = Mode::Halted;
                self.observer.on_error(error.line, &error.message);
            }
        }
        self.mode
    }

    /// Halted → Idle, when the host returns to editing.
    pub fn edit(&mut self) {
        if self.mode == Mode::Halted {
            self.mode = Mode::Idle;
        }
    }

    /// Executes exactly one instruction at the current program counter.
    ///
    /// Past the last instruction this transitions to Halted (natural
    /// termination) without executing anything.  Outside Running mode
    /// it is a no-op.
    pub fn step(&mut self) -> Mode {
        if self.mode != Mode::Running {
            return self.mode;
        }

        let pc = self.state.register(PC).unwrap_or(0);
        let instruction = match usize::try_from(pc).ok().and_then(|position| {
            self.program.instruction(position).cloned()
        }) {
            Some(instruction) => instruction,
            // Past the end (or a negative counter): natural termination.
            None => {
                self.mode = Mode::Halted;
                self.observer.on_halted();
                return self.mode;
            }
        };

        self.observer.on_line_focus(instruction.line);

        match self.execute(&instruction) {
            Ok(Flow::Next) => self.set_pc(pc + 1, instruction.line),
            Ok(Flow::Stay) => {}
            Ok(Flow::Jump(position)) => self.set_pc(position as i32, instruction.line),
            Ok(Flow::Halt) => {
                self.mode = Mode::Halted;
                self.observer.on_halted();
            }
            Err(error) => self.fail(error),
        }
        self.mode
    }

    /// Steps until Halted or cancelled.  The cancellation flag is
    /// checked once per iteration, so a request made mid-instruction
    /// takes effect only after that instruction finishes.  Returns only
    /// once Halted.
    pub fn run(&mut self) -> Mode {
        while self.mode == Mode::Running {
            if self.cancel.is_requested() {
                self.mode = Mode::Halted;
                self.observer.on_halted();
                break;
            }
            self.step();
        }
        self.mode
    }

    fn set_pc(&mut self, position: i32, line: usize) {
        if let Err(error) = self.state.set_register(PC, position) {
            self.fail(RuntimeError::machine(line, error));
        }
    }

    fn fail(&mut self, error: RuntimeError) {
        self.mode = Mode::Halted;
        self.observer.on_error(error.line, &error.message());
        self.last_error = Some(error);
    }

    /// Applies one instruction's semantics.  Operands are evaluated
    /// before any mutation, so a failing check precedes side effects;
    /// individual accessor calls are atomic either way.
    fn execute(&mut self, instruction: &Instruction) -> Result<Flow, RuntimeError> {
        let line = instruction.line;
        match &instruction.op {
            Op::Assign { target, value } => {
                let value = self.eval_expr(value, line)?;
                match target {
                    NumericTarget::Register(name) => {
                        self.state
                            .set_register(name, value)
                            .map_err(|e| RuntimeError::machine(line, e))?;
                        if name == PC {
                            // A write to PC is a computed branch.
                            Ok(Flow::Stay)
                        } else {
                            Ok(Flow::Next)
                        }
                    }
                    NumericTarget::Memory(address) => {
                        let address = self.eval_address(address, line)?;
                        self.state
                            .set_memory(address, value)
                            .map_err(|e| RuntimeError::machine(line, e))?;
                        Ok(Flow::Next)
                    }
                }
            }
            Op::AssignText { slot, value } => {
                let text = self.eval_printable(value, line)?;
                let index = self.eval_address(slot, line)?;
                self.state
                    .set_string_buffer(index, text)
                    .map_err(|e| RuntimeError::machine(line, e))?;
                Ok(Flow::Next)
            }
            Op::Jump { target } => Ok(Flow::Jump(*target)),
            Op::JumpZero { cond, target } => {
                if self.eval_operand(cond, line)? == 0 {
                    Ok(Flow::Jump(*target))
                } else {
                    Ok(Flow::Next)
                }
            }
            Op::JumpNegative { cond, target } => {
                if self.eval_operand(cond, line)? < 0 {
                    Ok(Flow::Jump(*target))
                } else {
                    Ok(Flow::Next)
                }
            }
            Op::Print { value } => {
                let text = self.eval_printable(value, line)?;
                self.observer.on_output(text.trim());
                Ok(Flow::Next)
            }
            Op::Halt { message: None } => Ok(Flow::Halt),
            Op::Halt {
                message: Some(message),
            } => Err(RuntimeError::halt(line, message.clone())),
        }
    }

    fn eval_expr(&self, expr: &Expr, line: usize) -> Result<i32, RuntimeError> {
        match expr {
            Expr::Operand(operand) => self.eval_operand(operand, line),
            Expr::Binary { lhs, op, rhs } => {
                let lhs = self.eval_operand(lhs, line)?;
                let rhs = self.eval_operand(rhs, line)?;
                self.apply(*op, lhs, rhs, line)
            }
        }
    }

    fn apply(&self, op: BinOp, lhs: i32, rhs: i32, line: usize) -> Result<i32, RuntimeError> {
        let wide = match op {
            BinOp::Add => lhs as i64 + rhs as i64,
            BinOp::Sub => lhs as i64 - rhs as i64,
            BinOp::Mul => lhs as i64 * rhs as i64,
            BinOp::Div => {
                if rhs == 0 {
                    return Err(RuntimeError::division_by_zero(line));
                }
                (lhs / rhs) as i64
            }
        };
        // The store re-checks against the configured range; this only
        // keeps the intermediate result representable.
        i32::try_from(wide).map_err(|_| {
            RuntimeError::machine(
                line,
                MachineError::ValueOutOfRange {
                    value: wide,
                    min: self.config.min_number_range,
                    max: self.config.max_number_range,
                },
            )
        })
    }

    fn eval_operand(&self, operand: &Operand, line: usize) -> Result<i32, RuntimeError> {
        match operand {
            Operand::Literal(value) => Ok(*value),
            Operand::Register(name) => self
                .state
                .register(name)
                .map_err(|e| RuntimeError::machine(line, e)),
            Operand::Memory(address) => {
                let address = self.eval_address(address, line)?;
                self.state
                    .memory(address)
                    .map_err(|e| RuntimeError::machine(line, e))
            }
        }
    }

    fn eval_address(&self, address: &Address, line: usize) -> Result<i32, RuntimeError> {
        match address {
            Address::Literal(value) => Ok(*value),
            Address::Register(name) => self
                .state
                .register(name)
                .map_err(|e| RuntimeError::machine(line, e)),
        }
    }

    fn eval_printable(&self, value: &Printable, line: usize) -> Result<String, RuntimeError> {
        match value {
            Printable::Operand(operand) => {
                self.eval_operand(operand, line).map(|v| v.to_string())
            }
            Printable::StringSlot(address) => {
                let index = self.eval_address(address, line)?;
                self.state
                    .string_buffer(index)
                    .map(str::to_string)
                    .map_err(|e| RuntimeError::machine(line, e))
            }
            Printable::Text(text) => Ok(text.clone()),
        }
    }
}
