//! Instruction decoder.
//!
//! Instructions are symbolic records rather than encoded words: a form
//! tag (R or I), register indices, an immediate and an opcode name.
//! Decoding maps the name to an [`Opcode`] and checks that the record's
//! form matches what the opcode expects.

use crate::cpu::alu::AluOp;
use serde::{Serialize, Deserialize};
use std::str::FromStr;
use thiserror::Error;

/// Instruction form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Form {
    /// Register-register: rd := rs op rt
    #[serde(rename = "R")]
    R,
    /// Register-immediate: rd := rs op imm
    #[serde(rename = "I")]
    I,
}

impl std::fmt::Display for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Form::R => write!(f, "R"),
            Form::I => write!(f, "I"),
        }
    }
}

/// An instruction as loaded into the instruction store.
///
/// `rt` is ignored by I-form instructions and `imm` by R-form ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(rename = "type")]
    pub form: Form,
    pub op: String,
    #[serde(default)]
    pub rd: usize,
    #[serde(default)]
    pub rs: usize,
    #[serde(default)]
    pub rt: usize,
    #[serde(default)]
    pub imm: i32,
}

impl Instruction {
    /// Build an R-form instruction: `op rd, rs, rt`.
    pub fn r_type(op: &str, rd: usize, rs: usize, rt: usize) -> Self {
        Self {
            form: Form::R,
            op: op.to_string(),
            rd,
            rs,
            rt,
            imm: 0,
        }
    }

    /// Build an I-form instruction: `op rd, rs, imm`.
    pub fn i_type(op: &str, rd: usize, rs: usize, imm: i32) -> Self {
        Self {
            form: Form::I,
            op: op.to_string(),
            rd,
            rs,
            rt: 0,
            imm,
        }
    }

    /// The halt instruction, encoded I-form with zero operands.
    pub fn halt() -> Self {
        Self::i_type(Opcode::Halt.name(), 0, 0, 0)
    }
}

/// Opcodes understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    Addi,
    Add,
    Sub,
    And,
    Or,
    Slt,
    Halt,
}

impl Opcode {
    /// Every opcode.
    pub const ALL: [Opcode; 7] = [
        Opcode::Addi,
        Opcode::Add,
        Opcode::Sub,
        Opcode::And,
        Opcode::Or,
        Opcode::Slt,
        Opcode::Halt,
    ];

    /// Mnemonic as written in programs.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Addi => "addi",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Slt => "slt",
            Opcode::Halt => "halt",
        }
    }

    /// The form this opcode requires. `halt` takes no operands and accepts either.
    pub fn form(self) -> Option<Form> {
        match self {
            Opcode::Addi => Some(Form::I),
            Opcode::Add | Opcode::Sub | Opcode::And | Opcode::Or | Opcode::Slt => Some(Form::R),
            Opcode::Halt => None,
        }
    }
}

impl FromStr for Opcode {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| DecodeError::UnknownOpcode(s.to_string()))
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What an instruction asks the datapath to do.
///
/// Register fields are raw indices; the executor bounds-checks them
/// against the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// rd := rs `op` imm
    Immediate { op: AluOp, rd: usize, rs: usize, imm: i32 },
    /// rd := rs `op` rt
    Register { op: AluOp, rd: usize, rs: usize, rt: usize },
    /// Stop the machine.
    Halt,
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub opcode: Opcode,
    pub operation: Operation,
}

/// Decode an instruction record.
pub fn decode(instr: &Instruction) -> Result<Decoded, DecodeError> {
    let opcode: Opcode = instr.op.parse()?;

    let immediate = |op| Operation::Immediate {
        op,
        rd: instr.rd,
        rs: instr.rs,
        imm: instr.imm,
    };
    let register = |op| Operation::Register {
        op,
        rd: instr.rd,
        rs: instr.rs,
        rt: instr.rt,
    };

    let operation = match (opcode, instr.form) {
        (Opcode::Halt, _) => Operation::Halt,
        (Opcode::Addi, Form::I) => immediate(AluOp::Add),
        (Opcode::Add, Form::R) => register(AluOp::Add),
        (Opcode::Sub, Form::R) => register(AluOp::Sub),
        (Opcode::And, Form::R) => register(AluOp::And),
        (Opcode::Or, Form::R) => register(AluOp::Or),
        (Opcode::Slt, Form::R) => register(AluOp::Slt),
        (opcode, found) => {
            return Err(DecodeError::FormMismatch {
                opcode,
                expected: opcode.form().unwrap_or(found),
                found,
            })
        }
    };

    Ok(Decoded { opcode, operation })
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),

    #[error("`{opcode}` expects an {expected}-type instruction, found {found}-type")]
    FormMismatch { opcode: Opcode, expected: Form, found: Form },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_addi() {
        let decoded = decode(&Instruction::i_type("addi", 8, 0, 1)).unwrap();
        assert_eq!(decoded.opcode, Opcode::Addi);
        assert_eq!(
            decoded.operation,
            Operation::Immediate { op: AluOp::Add, rd: 8, rs: 0, imm: 1 }
        );
    }

    #[test]
    fn test_decode_register_ops() {
        let table = [
            ("add", AluOp::Add),
            ("sub", AluOp::Sub),
            ("and", AluOp::And),
            ("or", AluOp::Or),
            ("slt", AluOp::Slt),
        ];

        for (name, alu_op) in table {
            let decoded = decode(&Instruction::r_type(name, 10, 8, 9)).unwrap();
            assert_eq!(decoded.opcode.name(), name);
            assert_eq!(
                decoded.operation,
                Operation::Register { op: alu_op, rd: 10, rs: 8, rt: 9 }
            );
        }
    }

    #[test]
    fn test_decode_halt_either_form() {
        assert_eq!(decode(&Instruction::halt()).unwrap().operation, Operation::Halt);
        assert_eq!(
            decode(&Instruction::r_type("halt", 0, 0, 0)).unwrap().operation,
            Operation::Halt
        );
    }

    #[test]
    fn test_unknown_opcode() {
        let err = decode(&Instruction::r_type("mul", 1, 2, 3)).unwrap_err();
        assert_eq!(err, DecodeError::UnknownOpcode("mul".into()));

        // Mnemonics are case sensitive
        assert!(matches!(
            decode(&Instruction::r_type("ADD", 1, 2, 3)),
            Err(DecodeError::UnknownOpcode(_))
        ));
    }

    #[test]
    fn test_form_mismatch() {
        let err = decode(&Instruction::i_type("add", 1, 2, 3)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::FormMismatch { opcode: Opcode::Add, expected: Form::R, found: Form::I }
        );

        let err = decode(&Instruction::r_type("addi", 1, 2, 3)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::FormMismatch { opcode: Opcode::Addi, expected: Form::I, found: Form::R }
        );
    }

    #[test]
    fn test_opcode_names_parse_back() {
        for op in Opcode::ALL {
            assert_eq!(op.name().parse::<Opcode>().unwrap(), op);
        }
    }

    #[test]
    fn test_instruction_json_defaults() {
        let instr: Instruction =
            serde_json::from_str(r#"{"type": "I", "op": "addi", "rd": 9, "imm": 2}"#).unwrap();
        assert_eq!(instr, Instruction::i_type("addi", 9, 0, 2));

        let instr: Instruction = serde_json::from_str(r#"{"type": "I", "op": "halt"}"#).unwrap();
        assert_eq!(instr, Instruction::halt());
    }
}
