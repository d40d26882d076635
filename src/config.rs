//! Machine configuration
//!
//! All sizing and range parameters are carried in a [`MachineConfig`]
//! value handed to the engine at construction, never read from ambient
//! state.  The defaults match the classic classroom setup: seven general
//! registers, 10 000 memory cells, and values clamped to four digits.

/// Configuration for one machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Smallest value a register or memory cell may hold.
    pub min_number_range: i32,
    /// Largest value a register or memory cell may hold.
    pub max_number_range: i32,
    /// Number of general-purpose registers `R0..R{n-1}`.
    pub register_count: usize,
    /// Number of main-memory cells.
    pub main_memory_length: usize,
    /// Number of string-buffer cells.
    pub string_buffer_size: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            min_number_range: -9999,
            max_number_range: 9999,
            register_count: 7,
            main_memory_length: 10000,
            string_buffer_size: 100,
        }
    }
}

impl MachineConfig {
    /// Returns true if `name` denotes a register that exists under this
    /// configuration: the reserved `PC` and `MH`, or `R0..R{n-1}`.
    pub fn is_register(&self, name: &str) -> bool {
        if name == "PC" || name == "MH" {
            return true;
        }
        match name.strip_prefix('R') {
            // Reject forms like "R07" so every register has one spelling
            Some(digits) if digits == "0" || (!digits.is_empty() && !digits.starts_with('0')) => {
                digits
                    .parse::<usize>()
                    .map(|index| index < self.register_count)
                    .unwrap_or(false)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_reserved_and_general_registers() {
        let config = MachineConfig::default();
        assert!(config.is_register("PC"));
        assert!(config.is_register("MH"));
        assert!(config.is_register("R0"));
        assert!(config.is_register("R6"));
        assert!(!config.is_register("R7"));
        assert!(!config.is_register("R"));
        assert!(!config.is_register("R01"));
        assert!(!config.is_register("X1"));
    }
}
