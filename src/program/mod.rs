//! Program handling.
//!
//! This module provides:
//! - The built-in demo program
//! - JSON program files (load/save)
//! - A disassembler (instructions → readable text)

pub mod demo;
pub mod disasm;
pub mod file;

pub use demo::demo_program;
pub use disasm::{disassemble, format_instruction};
pub use file::{load_program, save_program, parse_program, to_json, ProgramError};
