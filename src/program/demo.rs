//! The built-in demo program.

use crate::cpu::Instruction;

/// Exercise every ALU operation on the temporaries, then halt.
///
/// ```text
/// addi t0, zero, 1
/// addi t1, zero, 2
/// add  t2, t0, t1
/// sub  t3, t2, t1
/// and  t4, t0, t1
/// or   t5, t0, t1
/// slt  t6, t2, t1
/// halt
/// ```
///
/// Final state: t0..t6 = 1, 2, 3, 1, 0, 3, 0 and PC = 7.
pub fn demo_program() -> Vec<Instruction> {
    vec![
        Instruction::i_type("addi", 8, 0, 1),
        Instruction::i_type("addi", 9, 0, 2),
        Instruction::r_type("add", 10, 8, 9),
        Instruction::r_type("sub", 11, 10, 9),
        Instruction::r_type("and", 12, 8, 9),
        Instruction::r_type("or", 13, 8, 9),
        Instruction::r_type("slt", 14, 10, 9),
        Instruction::halt(),
    ]
}
