//! Debugger application state and logic.

use crate::{Cpu, CpuConfig, Instruction};
use crate::program::format_instruction;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Breakpoints (by program counter).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Trace lines of executed steps, newest last.
    pub trace: Vec<String>,
}

impl DebuggerApp {
    /// Maximum number of trace lines kept.
    const TRACE_LIMIT: usize = 64;

    /// Create a new debugger with a loaded program.
    pub fn new(program: &[Instruction], config: CpuConfig) -> Result<Self, crate::cpu::MemoryError> {
        let mut cpu = Cpu::with_config(config);
        cpu.load_program(program)?;

        Ok(Self {
            cpu,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
            trace: Vec::new(),
        })
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU stopped: {:?}", self.cpu.state());
            self.running = false;
            return;
        }

        match self.cpu.step() {
            Ok(record) => {
                self.status = format!("PC={:03}: {}", record.pc, self.disassemble(record.pc));
                self.trace.push(record.to_string());
                if self.trace.len() > Self::TRACE_LIMIT {
                    self.trace.remove(0);
                }
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("{:?} after {} cycles", self.cpu.state(), self.cpu.cycles());
            return;
        }

        // Check for breakpoint
        let pc = self.cpu.pc();
        if self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.running = false;
        self.trace.clear();
        self.status = "Reset. Ready.".into();
    }

    /// Scroll the memory view, clamped to the memory size.
    pub fn scroll_memory(&mut self, down: bool) {
        if down {
            if self.mem_scroll + 1 < self.cpu.data_memory().len() {
                self.mem_scroll += 1;
            }
        } else {
            self.mem_scroll = self.mem_scroll.saturating_sub(1);
        }
    }

    fn disassemble(&self, pc: usize) -> String {
        self.cpu
            .program()
            .fetch(pc)
            .map(format_instruction)
            .unwrap_or_else(|_| "<out of range>".into())
    }

    /// Get disassembly around current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let pc = self.cpu.pc();
        let program = self.cpu.program().instructions();
        let start = pc.saturating_sub(lines / 2);

        program
            .iter()
            .enumerate()
            .skip(start)
            .take(lines)
            .map(|(addr, instr)| (addr, format_instruction(instr), addr == pc))
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: &[Instruction], config: CpuConfig) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Create app before touching the terminal so load errors print normally
    let mut app = DebuggerApp::new(program, config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_memory(false),
                        KeyCode::Down => app.scroll_memory(true),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
