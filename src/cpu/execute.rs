//! CPU execution engine.
//!
//! Implements the fetch-decode-execute cycle. One `step` runs one
//! instruction to completion; there is no pipelining.

use crate::cpu::alu::{self, AluResult};
use crate::cpu::decode::{self, DecodeError, Opcode, Operation};
use crate::cpu::memory::{DataMemory, InstructionStore, MemoryError, DEFAULT_DATA_MEM_SIZE};
use crate::cpu::registers::{RegisterError, RegisterFile, NUM_REGISTERS, T0};
use crate::cpu::Instruction;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed `halt`).
    Halted,
    /// CPU stopped on a fatal error.
    Faulted,
}

/// Sizing of the CPU's stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Data memory size in words.
    pub data_mem_size: usize,
    /// Maximum program length. `None` sizes the store by the program.
    pub instr_capacity: Option<usize>,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            data_mem_size: DEFAULT_DATA_MEM_SIZE,
            instr_capacity: None,
        }
    }
}

/// Side effect of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// The ALU result was written to register `rd`.
    Write { rd: usize, value: i32, zero: bool },
    /// The machine halted.
    Halt,
}

/// Record of one executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Arithmetic cycles retired before this step.
    pub cycle: u64,
    /// Address the instruction was fetched from.
    pub pc: usize,
    pub opcode: Opcode,
    pub effect: Effect,
}

impl std::fmt::Display for StepRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Cycle {}] Executing: {}", self.cycle, self.opcode)
    }
}

/// Read-only copy of the CPU state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub pc: usize,
    pub state: CpuState,
    pub cycles: u64,
    pub regs: [i32; NUM_REGISTERS],
    pub data_mem: Vec<i32>,
}

impl CpuSnapshot {
    /// Temporaries reported by the state dump: t0-t6.
    pub const REPORTED: std::ops::RangeInclusive<usize> = T0..=T0 + 6;
}

impl std::fmt::Display for CpuSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PC: {}", self.pc)?;
        for i in Self::REPORTED {
            writeln!(f, "t{} = {}", i - T0, self.regs[i])?;
        }
        Ok(())
    }
}

/// The simulated CPU.
///
/// Owns all machine state; callers drive it through [`Cpu::step`] and
/// observe it through the accessors and [`Cpu::snapshot`].
#[derive(Clone)]
pub struct Cpu {
    regs: RegisterFile,
    pc: usize,
    program: InstructionStore,
    data_mem: DataMemory,
    state: CpuState,
    cycles: u64,
    last_step: Option<StepRecord>,
}

impl Cpu {
    /// Create a new CPU with zeroed state and the default configuration.
    pub fn new() -> Self {
        Self::with_config(CpuConfig::default())
    }

    /// Create a new CPU with zeroed state.
    pub fn with_config(config: CpuConfig) -> Self {
        Self {
            regs: RegisterFile::new(),
            pc: 0,
            program: InstructionStore::new(config.instr_capacity),
            data_mem: DataMemory::new(config.data_mem_size),
            state: CpuState::Running,
            cycles: 0,
            last_step: None,
        }
    }

    /// Reset registers, data memory and the program counter, keeping the program.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.data_mem.clear();
        self.pc = 0;
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_step = None;
    }

    /// Load a program into the instruction store.
    pub fn load_program(&mut self, program: &[Instruction]) -> Result<(), MemoryError> {
        self.program.load(program)?;
        tracing::debug!(len = program.len(), "program loaded");
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// On error the CPU moves to [`CpuState::Faulted`] with no register
    /// written and the program counter left at the faulting instruction.
    pub fn step(&mut self) -> Result<StepRecord, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        match self.try_step() {
            Ok(record) => {
                self.last_step = Some(record);
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(pc = self.pc, error = %e, "cpu fault");
                self.state = CpuState::Faulted;
                Err(e)
            }
        }
    }

    fn try_step(&mut self) -> Result<StepRecord, CpuError> {
        let pc = self.pc;

        // Fetch
        let instr = self.program.fetch(pc)?;

        // Decode
        let decoded = decode::decode(instr).map_err(|source| CpuError::Decode {
            pc,
            op: instr.op.clone(),
            source,
        })?;
        let opcode = decoded.opcode;
        tracing::debug!(cycle = self.cycles, pc, op = %opcode, "executing");

        // Execute and write back
        let effect = match decoded.operation {
            Operation::Halt => {
                self.state = CpuState::Halted;
                tracing::info!(pc, cycles = self.cycles, "halted");
                return Ok(StepRecord { cycle: self.cycles, pc, opcode, effect: Effect::Halt });
            }
            Operation::Immediate { op, rd, rs, imm } => {
                let a = self.read_reg(pc, opcode, rs)?;
                self.write_back(pc, opcode, rd, alu::execute(a, imm, op))?
            }
            Operation::Register { op, rd, rs, rt } => {
                let a = self.read_reg(pc, opcode, rs)?;
                let b = self.read_reg(pc, opcode, rt)?;
                self.write_back(pc, opcode, rd, alu::execute(a, b, op))?
            }
        };

        let record = StepRecord { cycle: self.cycles, pc, opcode, effect };
        self.pc += 1;
        self.cycles += 1;
        Ok(record)
    }

    fn read_reg(&self, pc: usize, opcode: Opcode, index: usize) -> Result<i32, CpuError> {
        self.regs
            .read(index)
            .map_err(|source| CpuError::Register { pc, opcode, source })
    }

    fn write_back(
        &mut self,
        pc: usize,
        opcode: Opcode,
        rd: usize,
        out: AluResult,
    ) -> Result<Effect, CpuError> {
        self.regs
            .write(rd, out.result)
            .map_err(|source| CpuError::Register { pc, opcode, source })?;
        tracing::trace!(rd, value = out.result, zero = out.zero, "write back");
        Ok(Effect::Write { rd, value: out.result, zero: out.zero })
    }

    /// Run until halt or error.
    ///
    /// Returns the number of arithmetic cycles executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_steps` instructions.
    ///
    /// Returns the number of arithmetic cycles executed.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let mut steps = 0;

        while self.state == CpuState::Running && steps < max_steps {
            self.step()?;
            steps += 1;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Copy out the architectural state.
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.pc,
            state: self.state,
            cycles: self.cycles,
            regs: *self.regs.values(),
            data_mem: self.data_mem.words().to_vec(),
        }
    }

    /// Current program counter.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Current execution state.
    pub fn state(&self) -> CpuState {
        self.state
    }

    /// Arithmetic cycles retired so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn data_memory(&self) -> &DataMemory {
        &self.data_mem
    }

    pub fn program(&self) -> &InstructionStore {
        &self.program
    }

    /// Get the last executed step.
    pub fn last_step(&self) -> Option<StepRecord> {
        self.last_step
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("decode error at PC={pc} (`{op}`): {source}")]
    Decode {
        pc: usize,
        op: String,
        #[source]
        source: DecodeError,
    },

    #[error("register error at PC={pc} (`{opcode}`): {source}")]
    Register {
        pc: usize,
        opcode: Opcode,
        #[source]
        source: RegisterError,
    },
}

impl CpuError {
    /// Program counter or register index outside its valid range.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(
            self,
            CpuError::MemoryError(MemoryError::FetchOutOfRange { .. })
                | CpuError::MemoryError(MemoryError::DataAddressOutOfRange { .. })
                | CpuError::Register { .. }
        )
    }

    /// Unknown opcode or form mismatch.
    pub fn is_decode(&self) -> bool {
        matches!(self, CpuError::Decode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::demo_program;

    fn cpu_with(program: &[Instruction]) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.load_program(program).unwrap();
        cpu
    }

    #[test]
    fn test_cpu_halt() {
        let mut cpu = cpu_with(&[Instruction::halt()]);

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 0);
        assert!(cpu.is_halted());
        assert_eq!(cpu.pc(), 0);
    }

    #[test]
    fn test_demo_program() {
        let mut cpu = cpu_with(&demo_program());

        let executed = cpu.run().unwrap();
        let snap = cpu.snapshot();

        assert_eq!(executed, 7);
        assert_eq!(snap.pc, 7);
        assert_eq!(snap.state, CpuState::Halted);
        assert_eq!(&snap.regs[8..=14], &[1, 2, 3, 1, 0, 3, 0]);
    }

    #[test]
    fn test_demo_trace() {
        let mut cpu = cpu_with(&demo_program());
        let mut lines = Vec::new();

        while cpu.is_running() {
            lines.push(cpu.step().unwrap().to_string());
        }

        assert_eq!(
            lines,
            [
                "[Cycle 0] Executing: addi",
                "[Cycle 1] Executing: addi",
                "[Cycle 2] Executing: add",
                "[Cycle 3] Executing: sub",
                "[Cycle 4] Executing: and",
                "[Cycle 5] Executing: or",
                "[Cycle 6] Executing: slt",
                "[Cycle 7] Executing: halt",
            ]
        );
    }

    #[test]
    fn test_report_format() {
        let mut cpu = cpu_with(&demo_program());
        cpu.run().unwrap();

        assert_eq!(
            cpu.snapshot().to_string(),
            "PC: 7\nt0 = 1\nt1 = 2\nt2 = 3\nt3 = 1\nt4 = 0\nt5 = 3\nt6 = 0\n"
        );
    }

    #[test]
    fn test_step_record_effect() {
        let mut cpu = cpu_with(&[
            Instruction::i_type("addi", 8, 0, 5),
            Instruction::r_type("sub", 9, 8, 8),
            Instruction::halt(),
        ]);

        let first = cpu.step().unwrap();
        assert_eq!(first.pc, 0);
        assert_eq!(first.effect, Effect::Write { rd: 8, value: 5, zero: false });

        let second = cpu.step().unwrap();
        assert_eq!(second.effect, Effect::Write { rd: 9, value: 0, zero: true });

        let third = cpu.step().unwrap();
        assert_eq!(third.effect, Effect::Halt);
        assert_eq!(cpu.last_step(), Some(third));
    }

    #[test]
    fn test_step_after_halt() {
        let mut cpu = cpu_with(&[Instruction::halt()]);
        cpu.step().unwrap();

        assert_eq!(cpu.step(), Err(CpuError::NotRunning(CpuState::Halted)));
    }

    #[test]
    fn test_unknown_opcode_faults() {
        let mut cpu = cpu_with(&[
            Instruction::i_type("addi", 8, 0, 1),
            Instruction::r_type("mul", 9, 8, 8),
            Instruction::halt(),
        ]);

        let err = cpu.run().unwrap_err();

        assert!(err.is_decode());
        assert!(matches!(err, CpuError::Decode { pc: 1, .. }));
        assert_eq!(cpu.state(), CpuState::Faulted);
        assert_eq!(cpu.pc(), 1);
        assert_eq!(cpu.registers().read(9).unwrap(), 0);
        assert!(matches!(cpu.step(), Err(CpuError::NotRunning(CpuState::Faulted))));
    }

    #[test]
    fn test_form_mismatch_faults() {
        let mut cpu = cpu_with(&[Instruction::i_type("add", 8, 0, 1)]);

        let err = cpu.step().unwrap_err();

        assert!(err.is_decode());
        assert_eq!(cpu.registers().read(8).unwrap(), 0);
    }

    #[test]
    fn test_fetch_past_end_faults() {
        // No halt: the counter runs off the end of the store
        let mut cpu = cpu_with(&[Instruction::i_type("addi", 8, 0, 1)]);

        let err = cpu.run().unwrap_err();

        assert!(err.is_out_of_bounds());
        assert_eq!(
            err,
            CpuError::MemoryError(MemoryError::FetchOutOfRange { pc: 1, len: 1 })
        );
        assert_eq!(cpu.registers().read(8).unwrap(), 1);
    }

    #[test]
    fn test_empty_program_faults() {
        let mut cpu = Cpu::new();
        assert!(cpu.step().unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_bad_register_index_faults() {
        let mut cpu = cpu_with(&[Instruction::r_type("add", 8, 40, 0)]);
        let err = cpu.step().unwrap_err();
        assert!(err.is_out_of_bounds());
        assert!(matches!(
            err,
            CpuError::Register { pc: 0, opcode: Opcode::Add, source: RegisterError::OutOfRange(40) }
        ));

        // Bad destination: nothing is written
        let mut cpu = cpu_with(&[Instruction::i_type("addi", 32, 0, 9)]);
        let err = cpu.step().unwrap_err();
        assert!(err.is_out_of_bounds());
        assert!(cpu.registers().values().iter().all(|&v| v == 0));
        assert_eq!(cpu.pc(), 0);
    }

    #[test]
    fn test_run_limited() {
        let mut cpu = cpu_with(&demo_program());

        assert_eq!(cpu.run_limited(3).unwrap(), 3);
        assert_eq!(cpu.pc(), 3);
        assert!(cpu.is_running());

        assert_eq!(cpu.run_limited(100).unwrap(), 4);
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_reset_keeps_program() {
        let mut cpu = cpu_with(&demo_program());
        cpu.run().unwrap();

        cpu.reset();
        assert_eq!(cpu.pc(), 0);
        assert!(cpu.is_running());
        assert_eq!(cpu.registers().read(10).unwrap(), 0);

        cpu.run().unwrap();
        assert_eq!(cpu.registers().read(10).unwrap(), 3);
    }

    #[test]
    fn test_config_sizes() {
        let mut cpu = Cpu::with_config(CpuConfig { data_mem_size: 16, instr_capacity: Some(4) });
        assert_eq!(cpu.data_memory().len(), 16);
        assert!(cpu.data_memory().words().iter().all(|&w| w == 0));

        let err = cpu.load_program(&demo_program()).unwrap_err();
        assert_eq!(err, MemoryError::ProgramTooLarge { size: 8, available: 4 });
    }

    #[test]
    fn test_config_json() {
        let config: CpuConfig = serde_json::from_str(r#"{"data_mem_size": 8}"#).unwrap();
        assert_eq!(config.data_mem_size, 8);
        assert_eq!(config.instr_capacity, None);
    }

    #[test]
    fn test_wrapping_write_back() {
        let mut cpu = cpu_with(&[
            Instruction::i_type("addi", 8, 0, i32::MAX),
            Instruction::i_type("addi", 8, 8, 1),
            Instruction::halt(),
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.registers().read(8).unwrap(), i32::MIN);
    }
}
