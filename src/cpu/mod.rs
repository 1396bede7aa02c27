//! CPU emulation.
//!
//! A single-cycle MIPS-like machine:
//! - 32 signed 32-bit general-purpose registers
//! - a program counter indexing a separate instruction store
//! - word-addressed data memory
//! - an ALU with add, sub, and, or, slt

pub mod alu;
pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use alu::{AluOp, AluResult};
pub use memory::{DataMemory, InstructionStore, MemoryError};
pub use registers::{RegisterFile, RegisterError};
pub use decode::{Instruction, Form, Opcode, Operation, DecodeError};
pub use execute::{Cpu, CpuConfig, CpuError, CpuSnapshot, CpuState, Effect, StepRecord};
