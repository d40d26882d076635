//! The mutable interpreter state

use super::{MachineError, Region};
use crate::config::MachineConfig;
use crate::observer::Observer;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Name of the reserved program-counter register.
pub const PC: &str = "PC";

/// Name of the reserved memory-head register.
pub const MH: &str = "MH";

/// All mutable interpreter state: the register table, main memory, and
/// the string buffer.
///
/// Constructed once per engine.  Registers are created at setup
/// (reserved `PC` and `MH` first, then the general-purpose ones) and
/// never removed; only their values mutate.  Every write is atomic: a
/// failed check leaves the previous value in place.
pub struct MachineState {
    registers: FxHashMap<String, i32>,
    /// Creation order, for hosts that lay registers out left to right.
    register_order: Vec<String>,
    memory: Vec<i32>,
    string_buffer: Vec<String>,
    min_value: i32,
    max_value: i32,
    observer: Arc<dyn Observer>,
}

impl MachineState {
    /// Builds the machine with the reserved registers and
    /// `R0..R{register_count-1}`, everything zeroed.
    pub fn new(config: &MachineConfig, observer: Arc<dyn Observer>) -> Result<Self, MachineError> {
        let mut state = MachineState {
            registers: FxHashMap::default(),
            register_order: Vec::new(),
            memory: vec![0; config.main_memory_length],
            string_buffer: vec![String::new(); config.string_buffer_size],
            min_value: config.min_number_range,
            max_value: config.max_number_range,
            observer,
        };

        state.add_register(PC, 0)?;
        state.add_register(MH, 0)?;
        for index in 0..config.register_count {
            state.add_register(&format!("R{}", index), 0)?;
        }

        Ok(state)
    }

    fn check_value(&self, value: i32) -> Result<(), MachineError> {
        if value < self.min_value || value > self.max_value {
            return Err(MachineError::ValueOutOfRange {
                value: value as i64,
                min: self.min_value,
                max: self.max_value,
            });
        }
        Ok(())
    }

    fn check_address(&self, region: Region, address: i32, length: usize) -> Result<usize, MachineError> {
        if address < 0 || address as usize >= length {
            return Err(MachineError::AddressOutOfRange {
                region,
                address,
                length,
            });
        }
        Ok(address as usize)
    }

    /// Registers a new named register.  Setup only; duplicate names and
    /// out-of-range initial values are rejected.
    pub fn add_register(&mut self, name: &str, initial: i32) -> Result<(), MachineError> {
        self.check_value(initial)?;
        if self.registers.contains_key(name) {
            return Err(MachineError::DuplicateRegister {
                name: name.to_string(),
            });
        }
        self.registers.insert(name.to_string(), initial);
        self.register_order.push(name.to_string());
        Ok(())
    }

    /// Reads a register.
    pub fn register(&self, name: &str) -> Result<i32, MachineError> {
        self.registers
            .get(name)
            .copied()
            .ok_or_else(|| MachineError::UnknownRegister {
                name: name.to_string(),
            })
    }

    /// Writes a register, range-checked, and notifies the observer.
    pub fn set_register(&mut self, name: &str, value: i32) -> Result<(), MachineError> {
        self.check_value(value)?;
        let slot = self
            .registers
            .get_mut(name)
            .ok_or_else(|| MachineError::UnknownRegister {
                name: name.to_string(),
            })?;
        *slot = value;
        self.observer.on_register_changed(name, value);
        Ok(())
    }

    /// Reads a main-memory cell and marks its address as the active one.
    pub fn memory(&self, address: i32) -> Result<i32, MachineError> {
        let index = self.check_address(Region::MainMemory, address, self.memory.len())?;
        self.observer.on_memory_focus(index);
        Ok(self.memory[index])
    }

    /// Writes a main-memory cell, bound- and range-checked.
    pub fn set_memory(&mut self, address: i32, value: i32) -> Result<(), MachineError> {
        let index = self.check_address(Region::MainMemory, address, self.memory.len())?;
        self.check_value(value)?;
        self.memory[index] = value;
        self.observer.on_memory_changed(index, value);
        self.observer.on_memory_focus(index);
        Ok(())
    }

    /// Reads a string-buffer cell.
    pub fn string_buffer(&self, index: i32) -> Result<&str, MachineError> {
        let index = self.check_address(Region::StringBuffer, index, self.string_buffer.len())?;
        Ok(&self.string_buffer[index])
    }

    /// Writes a string-buffer cell.  Text payloads carry no range
    /// invariant.
    pub fn set_string_buffer(&mut self, index: i32, text: String) -> Result<(), MachineError> {
        let index = self.check_address(Region::StringBuffer, index, self.string_buffer.len())?;
        self.string_buffer[index] = text;
        self.observer
            .on_string_buffer_changed(index, &self.string_buffer[index]);
        Ok(())
    }

    /// Restores every register (including `PC` and `MH`) to 0 and
    /// notifies the observer per register.  Idempotent; memory and the
    /// string buffer are left alone, matching the editor convention
    /// that only a fresh run clears them implicitly by overwriting.
    pub fn reset(&mut self) {
        for name in &self.register_order {
            if let Some(slot) = self.registers.get_mut(name) {
                *slot = 0;
                self.observer.on_register_changed(name, 0);
            }
        }
    }

    /// Register names in creation order.
    pub fn register_names(&self) -> &[String] {
        &self.register_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;

    fn small_state() -> MachineState {
        let config = MachineConfig {
            min_number_range: -99,
            max_number_range: 99,
            register_count: 3,
            main_memory_length: 8,
            string_buffer_size: 4,
        };
        MachineState::new(&config, Arc::new(NullObserver)).expect("setup failed")
    }

    #[test]
    fn registers_created_in_order() {
        let state = small_state();
        assert_eq!(state.register_names(), &["PC", "MH", "R0", "R1", "R2"]);
        assert_eq!(state.register("R2").unwrap(), 0);
    }

    #[test]
    fn duplicate_register_rejected() {
        let mut state = small_state();
        assert_eq!(
            state.add_register("R0", 0),
            Err(MachineError::DuplicateRegister {
                name: "R0".to_string()
            })
        );
    }

    #[test]
    fn rejected_register_write_leaves_value() {
        let mut state = small_state();
        state.set_register("R0", 42).unwrap();
        let err = state.set_register("R0", 100).unwrap_err();
        assert!(matches!(err, MachineError::ValueOutOfRange { value: 100, .. }));
        assert_eq!(state.register("R0").unwrap(), 42);
    }

    #[test]
    fn unknown_register_read_and_write() {
        let mut state = small_state();
        assert!(matches!(
            state.register("R9"),
            Err(MachineError::UnknownRegister { .. })
        ));
        assert!(matches!(
            state.set_register("R9", 1),
            Err(MachineError::UnknownRegister { .. })
        ));
    }

    #[test]
    fn memory_bounds_are_enforced_without_mutation() {
        let mut state = small_state();
        state.set_memory(7, 5).unwrap();
        assert_eq!(state.memory(7).unwrap(), 5);

        let err = state.set_memory(8, 1).unwrap_err();
        assert_eq!(
            err,
            MachineError::AddressOutOfRange {
                region: Region::MainMemory,
                address: 8,
                length: 8,
            }
        );
        let err = state.memory(-1).unwrap_err();
        assert!(matches!(err, MachineError::AddressOutOfRange { address: -1, .. }));
    }

    #[test]
    fn string_buffer_accepts_arbitrary_text() {
        let mut state = small_state();
        state.set_string_buffer(0, "HELLO THERE".to_string()).unwrap();
        assert_eq!(state.string_buffer(0).unwrap(), "HELLO THERE");
        assert!(matches!(
            state.set_string_buffer(4, String::new()),
            Err(MachineError::AddressOutOfRange {
                region: Region::StringBuffer,
                ..
            })
        ));
    }

    #[test]
    fn reset_is_idempotent() {
        let mut state = small_state();
        state.set_register("PC", 9).unwrap();
        state.set_register("R1", -42).unwrap();
        state.reset();
        state.reset();
        assert_eq!(state.register("PC").unwrap(), 0);
        assert_eq!(state.register("R1").unwrap(), 0);
    }
}
