//! TUI debugger for the simulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register file view with ABI names
//! - Data memory view
//! - Step/run/breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
