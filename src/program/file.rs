//! JSON program files.
//!
//! A program file is a JSON array of instruction records:
//!
//! ```json
//! [
//!   { "type": "I", "op": "addi", "rd": 8, "rs": 0, "imm": 1 },
//!   { "type": "R", "op": "add", "rd": 10, "rs": 8, "rt": 9 },
//!   { "type": "I", "op": "halt" }
//! ]
//! ```
//!
//! Omitted fields default to 0. Opcodes are not checked here; the CPU
//! decoder reports bad ones when it reaches them.

use crate::cpu::Instruction;
use std::path::Path;
use thiserror::Error;

/// Parse a program from JSON text.
pub fn parse_program(source: &str) -> Result<Vec<Instruction>, ProgramError> {
    serde_json::from_str(source).map_err(|e| ProgramError::ParseError {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })
}

/// Render a program as pretty-printed JSON.
pub fn to_json(program: &[Instruction]) -> Result<String, ProgramError> {
    serde_json::to_string_pretty(program).map_err(|e| ProgramError::ParseError {
        line: 0,
        column: 0,
        message: e.to_string(),
    })
}

/// Load a program file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<Instruction>, ProgramError> {
    let source = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;
    parse_program(&source)
}

/// Save a program file to disk.
pub fn save_program<P: AsRef<Path>>(path: P, program: &[Instruction]) -> Result<(), ProgramError> {
    let mut json = to_json(program)?;
    json.push('\n');
    std::fs::write(path.as_ref(), json).map_err(|e| ProgramError::IoError(e.to_string()))
}

/// Errors that can occur while reading or writing program files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}, column {column}: {message}")]
    ParseError { line: usize, column: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::demo_program;

    #[test]
    fn test_parse_program() {
        let source = r#"[
            { "type": "I", "op": "addi", "rd": 8, "imm": 1 },
            { "type": "R", "op": "add", "rd": 10, "rs": 8, "rt": 9 },
            { "type": "I", "op": "halt" }
        ]"#;

        let program = parse_program(source).unwrap();

        assert_eq!(
            program,
            vec![
                Instruction::i_type("addi", 8, 0, 1),
                Instruction::r_type("add", 10, 8, 9),
                Instruction::halt(),
            ]
        );
    }

    #[test]
    fn test_parse_error_location() {
        let err = parse_program("[\n  { \"type\": \"X\", \"op\": \"add\" }\n]").unwrap_err();
        assert!(matches!(err, ProgramError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_unknown_opcode_still_parses() {
        let program = parse_program(r#"[{ "type": "R", "op": "nor" }]"#).unwrap();
        assert_eq!(program[0].op, "nor");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");

        save_program(&path, &demo_program()).unwrap();
        let loaded = load_program(&path).unwrap();

        assert_eq!(loaded, demo_program());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_program(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ProgramError::IoError(_)));
    }
}
