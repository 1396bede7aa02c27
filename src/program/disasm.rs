//! Disassembler.
//!
//! Renders instruction records as MIPS-style assembly using ABI
//! register names.

use crate::cpu::decode::{decode, Instruction, Operation};
use crate::cpu::registers::abi_name;

/// Format a single instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match decode(instr) {
        Ok(decoded) => match decoded.operation {
            Operation::Immediate { rd, rs, imm, .. } => {
                format!("{} {}, {}, {}", decoded.opcode, abi_name(rd), abi_name(rs), imm)
            }
            Operation::Register { rd, rs, rt, .. } => format!(
                "{} {}, {}, {}",
                decoded.opcode,
                abi_name(rd),
                abi_name(rs),
                abi_name(rt)
            ),
            Operation::Halt => decoded.opcode.to_string(),
        },
        Err(e) => format!("??? {} ; {}", instr.op, e),
    }
}

/// Disassemble a program into a numbered listing.
pub fn disassemble(program: &[Instruction]) -> String {
    let mut output = String::new();
    output.push_str("; MIPS Disassembly\n");
    output.push_str("; ----------------\n\n");

    for (addr, instr) in program.iter().enumerate() {
        let line = format_instruction(instr);
        output.push_str(&format!("{:03}: {}\n", addr, line));
    }

    output
}
