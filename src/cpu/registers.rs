//! General-purpose register file.
//!
//! 32 signed 32-bit registers, indexed 0-31. Register 0 is named `zero`
//! after the MIPS convention, but writes to it are not discarded.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 32;

/// MIPS ABI register names, by index.
pub const ABI_NAMES: [&str; NUM_REGISTERS] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3",
    "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7",
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7",
    "t8", "t9", "k0", "k1", "gp", "sp", "fp", "ra",
];

/// Index of `t0`, the first temporary.
pub const T0: usize = 8;

/// ABI name of a register, or `$n` for an index outside the file.
pub fn abi_name(index: usize) -> String {
    match ABI_NAMES.get(index) {
        Some(name) => (*name).to_string(),
        None => format!("${}", index),
    }
}

/// The register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    regs: [i32; NUM_REGISTERS],
}

impl RegisterFile {
    /// Create a register file with all values zeroed.
    pub fn new() -> Self {
        Self { regs: [0; NUM_REGISTERS] }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.regs = [0; NUM_REGISTERS];
    }

    /// Read a register.
    pub fn read(&self, index: usize) -> Result<i32, RegisterError> {
        self.regs
            .get(index)
            .copied()
            .ok_or(RegisterError::OutOfRange(index))
    }

    /// Write a register.
    pub fn write(&mut self, index: usize, value: i32) -> Result<(), RegisterError> {
        let slot = self.regs
            .get_mut(index)
            .ok_or(RegisterError::OutOfRange(index))?;
        *slot = value;
        Ok(())
    }

    /// All register values in index order.
    pub fn values(&self) -> &[i32; NUM_REGISTERS] {
        &self.regs
    }

    /// Iterate `(index, abi name, value)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'static str, i32)> + '_ {
        self.regs
            .iter()
            .enumerate()
            .map(|(i, &v)| (i, ABI_NAMES[i], v))
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when addressing a register.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register index {0} out of range (0-31)")]
    OutOfRange(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_start_zeroed() {
        let regs = RegisterFile::new();
        assert!(regs.values().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_read_write() {
        let mut regs = RegisterFile::new();
        regs.write(8, 42).unwrap();
        assert_eq!(regs.read(8).unwrap(), 42);
        assert_eq!(regs.read(9).unwrap(), 0);
    }

    #[test]
    fn test_zero_register_is_writable() {
        let mut regs = RegisterFile::new();
        regs.write(0, 7).unwrap();
        assert_eq!(regs.read(0).unwrap(), 7);
    }

    #[test]
    fn test_bounds() {
        let mut regs = RegisterFile::new();
        assert!(regs.read(31).is_ok());
        assert_eq!(regs.read(32), Err(RegisterError::OutOfRange(32)));
        assert_eq!(regs.write(99, 1), Err(RegisterError::OutOfRange(99)));
    }

    #[test]
    fn test_abi_names() {
        assert_eq!(abi_name(0), "zero");
        assert_eq!(abi_name(T0), "t0");
        assert_eq!(abi_name(14), "t6");
        assert_eq!(abi_name(40), "$40");
    }

    #[test]
    fn test_reset() {
        let mut regs = RegisterFile::new();
        regs.write(5, -3).unwrap();
        regs.reset();
        assert_eq!(regs.read(5).unwrap(), 0);
    }
}
