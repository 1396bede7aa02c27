//! WebAssembly bindings for the simulator.
//!
//! This module provides JavaScript-friendly wrappers around the core CPU.

use wasm_bindgen::prelude::*;
use crate::{Cpu, CpuConfig, Instruction};
use crate::program::{demo_program, format_instruction, parse_program, to_json};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    program: Vec<Instruction>,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance with the demo program loaded.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let program = demo_program();
        let mut cpu = Cpu::new();
        // The default store is unbounded, so the demo always fits
        let _ = cpu.load_program(&program);
        Self { cpu, program }
    }

    /// Load a program from JSON source. Returns the instruction count.
    #[wasm_bindgen]
    pub fn load_json(&mut self, source: &str, data_mem_size: usize) -> Result<usize, JsError> {
        let program = parse_program(source)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let mut cpu = Cpu::with_config(CpuConfig { data_mem_size, instr_capacity: None });
        cpu.load_program(&program)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let len = program.len();
        self.cpu = cpu;
        self.program = program;
        Ok(len)
    }

    /// Export the loaded program as JSON.
    #[wasm_bindgen]
    pub fn program_json(&self) -> Result<String, JsError> {
        to_json(&self.program).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Step one instruction. Returns the trace line.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let record = self.cpu.step()
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(record.to_string())
    }

    /// Run until halt or `max_steps`. Returns the total cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(u64::from(max_steps))
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.cpu.cycles())
    }

    /// Reset CPU to initial state with the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if CPU is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> usize {
        self.cpu.pc()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state())
    }

    /// Get one register, or 0 for an index outside the file.
    #[wasm_bindgen]
    pub fn register(&self, index: usize) -> i32 {
        self.cpu.registers().read(index).unwrap_or(0)
    }

    /// Get all 32 registers.
    #[wasm_bindgen]
    pub fn registers(&self) -> js_sys::Int32Array {
        js_sys::Int32Array::from(&self.cpu.registers().values()[..])
    }

    /// Get data memory word, or 0 for an address outside memory.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: usize) -> i32 {
        self.cpu.data_memory().read(addr).unwrap_or(0)
    }

    /// Get the full state as a JSON string.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.snapshot())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Get the state dump (`PC: ..`, `t0 = ..`).
    #[wasm_bindgen]
    pub fn report(&self) -> String {
        self.cpu.snapshot().to_string()
    }

    /// Disassemble the instruction at `addr`.
    #[wasm_bindgen]
    pub fn disassemble_at(&self, addr: usize) -> Option<String> {
        self.program.get(addr).map(format_instruction)
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a JSON program and return its instruction count.
#[wasm_bindgen]
pub fn wasm_parse_program(source: &str) -> Result<usize, JsError> {
    let program = parse_program(source)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(program.len())
}
