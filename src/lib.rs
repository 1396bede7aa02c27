//! # MIPS Simulator
//!
//! An instructional instruction-set simulator for a small MIPS-like CPU.
//!
//! The machine steps through a preloaded program one instruction at a
//! time: fetch at the program counter, decode the opcode, run the ALU,
//! write the result back to the register file. A `halt` instruction
//! stops it; anything malformed stops it with an error.

pub mod cpu;
pub mod program;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuConfig, CpuError, CpuSnapshot, CpuState, Instruction, Opcode, StepRecord};
pub use cpu::alu::{AluOp, AluResult};
pub use program::{demo_program, disassemble, load_program, save_program, ProgramError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
