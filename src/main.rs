//! MIPS Simulator - CLI Entry Point
//!
//! Commands:
//! - `mips-sim` - Run the built-in demo program
//! - `mips-sim run [program]` - Run a JSON program (or the demo)
//! - `mips-sim debug [program]` - Interactive debugger
//! - `mips-sim disasm [program]` - Print a listing
//! - `mips-sim export` - Write the demo program as JSON
//! - `mips-sim test` - Built-in self-test

use clap::{Args, Parser, Subcommand};
use mipsim::{CpuConfig, Instruction};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mips-sim")]
#[command(version = "0.1.0")]
#[command(about = "An instructional MIPS-like instruction-set simulator")]
struct Cli {
    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Sizing flags shared by the commands that build a CPU.
#[derive(Args, Clone, Copy)]
struct ConfigArgs {
    /// Data memory size in words
    #[arg(long, default_value = "100")]
    data_mem_size: usize,
    /// Maximum program length accepted by the instruction store
    #[arg(long)]
    instr_capacity: Option<usize>,
}

impl From<ConfigArgs> for CpuConfig {
    fn from(args: ConfigArgs) -> Self {
        CpuConfig {
            data_mem_size: args.data_mem_size,
            instr_capacity: args.instr_capacity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to a JSON program file (default: built-in demo)
        program: Option<String>,
        /// Maximum number of steps to run (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Suppress per-cycle trace output
        #[arg(short, long)]
        quiet: bool,
        /// Print the final state as JSON instead of the text report
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Interactive debugger
    Debug {
        /// Path to a JSON program file (default: built-in demo)
        program: Option<String>,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Disassemble a program to readable text
    Disasm {
        /// Path to a JSON program file (default: built-in demo)
        program: Option<String>,
    },
    /// Write the built-in demo program as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run { program, max_cycles, quiet, json, config }) => {
            run_program(program.as_deref(), max_cycles, quiet, json, config.into());
        }
        Some(Commands::Debug { program, config }) => {
            debug_program(program.as_deref(), config.into());
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(program.as_deref());
        }
        Some(Commands::Export { output }) => {
            export_demo(output.as_deref());
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            run_demo();
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mipsim={0},mips_sim={0}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load a program file, or the demo when no path is given.
fn load_or_demo(path: Option<&str>) -> Vec<Instruction> {
    let Some(path) = path else {
        return mipsim::demo_program();
    };

    match mipsim::load_program(path) {
        Ok(program) => {
            tracing::info!(path, len = program.len(), "loaded program file");
            program
        }
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run the demo, printing the trace and the state dump.
fn run_demo() {
    let mut cpu = mipsim::Cpu::new();
    if let Err(e) = cpu.load_program(&mipsim::demo_program()) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    while cpu.is_running() {
        match cpu.step() {
            Ok(record) => println!("{}", record),
            Err(e) => {
                eprintln!("❌ CPU error at PC={}: {}", cpu.pc(), e);
                std::process::exit(1);
            }
        }
    }

    print!("{}", cpu.snapshot());
}

fn run_program(path: Option<&str>, max_cycles: u64, quiet: bool, json: bool, config: CpuConfig) {
    let program = load_or_demo(path);

    let mut cpu = mipsim::Cpu::with_config(config);
    if let Err(e) = cpu.load_program(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    let mut steps = 0u64;
    while cpu.is_running() && steps < max_cycles {
        match cpu.step() {
            Ok(record) => {
                if !quiet {
                    println!("{}", record);
                }
                steps += 1;
            }
            Err(e) => {
                eprintln!("❌ CPU error at PC={}: {}", cpu.pc(), e);
                std::process::exit(1);
            }
        }
    }

    let snapshot = cpu.snapshot();
    if json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", snapshot);
    }

    if cpu.is_running() {
        eprintln!();
        eprintln!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: Option<&str>, config: CpuConfig) {
    let program = load_or_demo(path);

    if let Err(e) = mipsim::run_debugger(&program, config) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: Option<&str>, _config: CpuConfig) {
    eprintln!("❌ Built without the `tui` feature; the debugger is unavailable");
    std::process::exit(1);
}

fn disassemble_file(path: Option<&str>) {
    let program = load_or_demo(path);
    print!("{}", mipsim::disassemble(&program));
}

fn export_demo(output: Option<&str>) {
    let program = mipsim::demo_program();

    match output {
        Some(path) => {
            if let Err(e) = mipsim::save_program(path, &program) {
                eprintln!("❌ Failed to save program: {}", e);
                std::process::exit(1);
            }
            println!("✓ Saved {} instructions to {}", program.len(), path);
        }
        None => match mipsim::program::to_json(&program) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize program: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn run_self_test() {
    use mipsim::{AluOp, Cpu, CpuError, Opcode};
    use mipsim::cpu::alu;

    println!("━━━ MIPS Simulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    let samples = [i32::MIN, -7, -1, 0, 1, 2, 7, i32::MAX];

    check("Zero flag matches result", samples.iter().all(|&a| {
        samples.iter().all(|&b| {
            AluOp::ALL.iter().all(|&op| {
                let out = alu::execute(a, b, op);
                out.zero == (out.result == 0)
            })
        })
    }));

    check("SLT ordering", samples.iter().all(|&a| {
        samples.iter().all(|&b| (alu::execute(a, b, AluOp::Slt).result == 1) == (a < b))
    }));

    check("Bitwise identities", samples.iter().all(|&x| {
        alu::execute(x, x, AluOp::And).result == x
            && alu::execute(x, 0, AluOp::Or).result == x
            && alu::execute(x, 0, AluOp::And).result == 0
    }));

    let mut cpu = Cpu::new();
    let demo_ok = cpu.load_program(&mipsim::demo_program()).is_ok()
        && cpu.run().ok() == Some(7)
        && cpu.pc() == 7
        && cpu.registers().values()[8..=14] == [1, 2, 3, 1, 0, 3, 0];
    check("Demo program results", demo_ok);

    let mut cpu = Cpu::new();
    let bad = [Instruction::r_type("mul", 8, 0, 0)];
    let decode_ok = cpu.load_program(&bad).is_ok()
        && cpu.step().is_err_and(|e| e.is_decode());
    check("Unknown opcode rejected", decode_ok);

    let mut cpu = Cpu::new();
    let runaway = [Instruction::i_type(Opcode::Addi.name(), 8, 0, 1)];
    let bounds_ok = cpu.load_program(&runaway).is_ok()
        && cpu.run().is_err_and(|e: CpuError| e.is_out_of_bounds());
    check("Fetch past end rejected", bounds_ok);

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
