//! Memory subsystem.
//!
//! Two separate stores, Harvard style: a word-addressed data memory and
//! an instruction store indexed by the program counter. Both are sized
//! at load time rather than by compile-time constants.

use crate::cpu::decode::Instruction;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Default number of data memory words.
pub const DEFAULT_DATA_MEM_SIZE: usize = 100;

/// Word-addressed data memory.
///
/// No opcode in the current instruction set touches it; it is part of the
/// CPU state so load/store instructions can be added later.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMemory {
    cells: Vec<i32>,
}

impl DataMemory {
    /// Create a zeroed memory of `size` words.
    pub fn new(size: usize) -> Self {
        Self { cells: vec![0; size] }
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the memory has no words at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read a word.
    #[inline]
    pub fn read(&self, addr: usize) -> Result<i32, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::DataAddressOutOfRange { addr, size: self.cells.len() })
    }

    /// Write a word.
    #[inline]
    pub fn write(&mut self, addr: usize, value: i32) -> Result<(), MemoryError> {
        let size = self.cells.len();
        let cell = self.cells
            .get_mut(addr)
            .ok_or(MemoryError::DataAddressOutOfRange { addr, size })?;
        *cell = value;
        Ok(())
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Dump a window of memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, i32)> {
        let end = start.saturating_add(count).min(self.cells.len());
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }

    /// All words in address order.
    pub fn words(&self) -> &[i32] {
        &self.cells
    }
}

impl Default for DataMemory {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_MEM_SIZE)
    }
}

impl std::fmt::Debug for DataMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&w| w != 0).count();

        f.debug_struct("DataMemory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .finish()
    }
}

/// Instruction store, indexed by the program counter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionStore {
    instructions: Vec<Instruction>,
    capacity: Option<usize>,
}

impl InstructionStore {
    /// Create an empty store. `capacity = None` accepts programs of any length.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            instructions: Vec::new(),
            capacity,
        }
    }

    /// Replace the stored program.
    pub fn load(&mut self, program: &[Instruction]) -> Result<(), MemoryError> {
        if let Some(capacity) = self.capacity {
            if program.len() > capacity {
                return Err(MemoryError::ProgramTooLarge {
                    size: program.len(),
                    available: capacity,
                });
            }
        }

        self.instructions = program.to_vec();
        Ok(())
    }

    /// Fetch the instruction at `pc`.
    pub fn fetch(&self, pc: usize) -> Result<&Instruction, MemoryError> {
        self.instructions
            .get(pc)
            .ok_or(MemoryError::FetchOutOfRange { pc, len: self.instructions.len() })
    }

    /// Get the number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The loaded program.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program counter {pc} outside instruction store of {len} instructions")]
    FetchOutOfRange { pc: usize, len: usize },

    #[error("data address {addr} out of range for {size}-word memory")]
    DataAddressOutOfRange { addr: usize, size: usize },

    #[error("program size {size} exceeds instruction store capacity {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = DataMemory::new(16);
        mem.write(10, 42).unwrap();
        assert_eq!(mem.read(10).unwrap(), 42);
        assert_eq!(mem.read(11).unwrap(), 0);
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = DataMemory::new(100);
        assert!(mem.read(99).is_ok());
        assert_eq!(
            mem.read(100),
            Err(MemoryError::DataAddressOutOfRange { addr: 100, size: 100 })
        );
        assert!(mem.write(100, 1).is_err());
    }

    #[test]
    fn test_default_size() {
        let mem = DataMemory::default();
        assert_eq!(mem.len(), DEFAULT_DATA_MEM_SIZE);
        assert!(mem.words().iter().all(|&w| w == 0));
    }

    #[test]
    fn test_clear_and_dump() {
        let mut mem = DataMemory::new(8);
        mem.write(2, 5).unwrap();
        mem.write(3, -6).unwrap();
        assert_eq!(mem.dump(1, 3), vec![(1, 0), (2, 5), (3, -6)]);
        assert_eq!(mem.dump(6, 10), vec![(6, 0), (7, 0)]);
        assert!(mem.dump(20, 4).is_empty());

        mem.clear();
        assert_eq!(mem.read(2).unwrap(), 0);
    }

    #[test]
    fn test_fetch_bounds() {
        let mut store = InstructionStore::new(None);
        store.load(&[Instruction::halt()]).unwrap();

        assert_eq!(store.fetch(0).unwrap(), &Instruction::halt());
        assert_eq!(
            store.fetch(1),
            Err(MemoryError::FetchOutOfRange { pc: 1, len: 1 })
        );
    }

    #[test]
    fn test_capacity_limit() {
        let mut store = InstructionStore::new(Some(2));
        let program = vec![Instruction::halt(); 3];

        assert_eq!(
            store.load(&program),
            Err(MemoryError::ProgramTooLarge { size: 3, available: 2 })
        );
        assert!(store.load(&program[..2]).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unbounded_store() {
        let mut store = InstructionStore::new(None);
        let program = vec![Instruction::halt(); 1000];
        store.load(&program).unwrap();
        assert_eq!(store.len(), 1000);
    }
}
