//! IRATA2 simulator CLI
//!
//! Runs a cartridge until halt, crash, or a cycle cap. Exit codes:
//! 0 = expected termination, 2 = unexpected termination (crash when halt
//! was expected, or the reverse under --expect-crash), 4 = timeout,
//! 1 = I/O or construction error.

use std::process::ExitCode;

use clap::Parser;
use irata2_sim::cartridge;
use irata2_sim::debug_symbols;
use irata2_sim::{Cpu, RunReason};

const DEFAULT_TRACE_DEPTH: usize = 64;

#[derive(Parser)]
#[command(name = "irata2-sim")]
#[command(about = "IRATA2 CPU simulator")]
struct Args {
    /// Cartridge image to run
    cartridge: String,

    /// Maximum cycles before the run times out
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Treat a crash as the expected outcome
    #[arg(long)]
    expect_crash: bool,

    /// Debug-symbol JSON; enables instruction tracing
    #[arg(long)]
    debug: Option<String>,

    /// Instruction trace depth
    #[arg(long)]
    trace_depth: Option<usize>,
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cart = cartridge::load_cartridge(&args.cartridge)?;

    let hdl = irata2_sim::default_hdl()?;
    let program = irata2_sim::default_microcode_program(&hdl)?;
    let mut cpu = Cpu::new(&hdl, &program, cart.rom, Vec::new())?;
    cpu.reset(cart.header.entry);

    if let Some(path) = &args.debug {
        cpu.attach_debug_symbols(debug_symbols::load_debug_symbols(path)?);
        cpu.enable_trace(args.trace_depth.unwrap_or(DEFAULT_TRACE_DEPTH));
    } else if let Some(depth) = args.trace_depth {
        cpu.enable_trace(depth);
    }

    tracing::info!(
        cartridge = %args.cartridge,
        entry = %cart.header.entry,
        "sim.start"
    );

    let max_cycles = args.max_cycles.unwrap_or(u64::MAX);
    let result = cpu.run_until_halt(max_cycles);

    match result.reason {
        RunReason::Timeout | RunReason::Running => {
            tracing::info!(
                max_cycles,
                cycles = result.cycles,
                instruction_address = %cpu.instruction_address(),
                "sim.timeout"
            );
        }
        RunReason::Crash => {
            tracing::info!(
                cycles = result.cycles,
                instruction_address = %cpu.instruction_address(),
                "sim.crash"
            );
        }
        RunReason::Halt => {
            tracing::info!(
                cycles = result.cycles,
                instruction_address = %cpu.instruction_address(),
                "sim.halt"
            );
        }
    }

    let unexpected = match result.reason {
        RunReason::Timeout | RunReason::Running => {
            dump_failure(&cpu, "timeout");
            return Ok(ExitCode::from(4));
        }
        RunReason::Crash => !args.expect_crash,
        RunReason::Halt => args.expect_crash,
    };

    if unexpected {
        dump_failure(&cpu, if cpu.crashed() { "crash" } else { "halt" });
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the end-of-run state and trace to stderr for failure triage
fn dump_failure(cpu: &Cpu, reason: &str) {
    let state = cpu.state();
    eprintln!("--- {reason} at {} ---", cpu.instruction_address());
    eprintln!(
        "A={} X={} Y={} SP={} P={} PC={} SC={}",
        state.a, state.x, state.y, state.sp, state.status, state.pc, state.sc
    );

    for entry in cpu.trace().entries() {
        let source = cpu
            .debug_symbols()
            .and_then(|symbols| symbols.lookup(entry.instruction_address))
            .map(|location| format!(" ; {}:{} {}", location.file, location.line, location.text))
            .unwrap_or_default();
        eprintln!(
            "cycle {:>6} {} ir={} a={} x={} p={}{}",
            entry.cycle, entry.instruction_address, entry.ir, entry.a, entry.x, entry.status, source
        );
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::from(1)
        }
    }
}
