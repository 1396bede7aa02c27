//! Arithmetic-logic unit.
//!
//! A pure function over two 32-bit operands. Arithmetic wraps on
//! overflow, matching a fixed-width hardware adder.

use serde::{Serialize, Deserialize};

/// ALU operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AluOp {
    /// operand1 + operand2
    Add,
    /// operand1 - operand2
    Sub,
    /// Bitwise AND
    And,
    /// Bitwise OR
    Or,
    /// Set on less than: 1 if operand1 < operand2, else 0
    Slt,
}

impl AluOp {
    /// Every operation kind, in control-signal order.
    pub const ALL: [AluOp; 5] = [AluOp::Add, AluOp::Sub, AluOp::And, AluOp::Or, AluOp::Slt];
}

/// Output of one ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AluResult {
    /// Computed value.
    pub result: i32,
    /// Set when `result == 0`. Reserved for conditional branches.
    pub zero: bool,
}

/// Run one ALU operation.
pub fn execute(operand1: i32, operand2: i32, op: AluOp) -> AluResult {
    let result = match op {
        AluOp::Add => operand1.wrapping_add(operand2),
        AluOp::Sub => operand1.wrapping_sub(operand2),
        AluOp::And => operand1 & operand2,
        AluOp::Or => operand1 | operand2,
        AluOp::Slt => i32::from(operand1 < operand2),
    };

    AluResult { result, zero: result == 0 }
}
