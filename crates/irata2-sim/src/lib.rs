//! IRATA2 Datapath Simulator
//!
//! A structural model of the CPU: bus-connected registers, an ALU, a
//! memory subsystem, and a microcoded controller, all driven by a strict
//! five-phase tick cycle (Control, Write, Read, Process, Clear). Controls
//! and buses enforce their phase discipline at runtime; violations are
//! wiring or microcode bugs and abort the simulation with the offending
//! component's path.

pub mod alu;
pub mod bus;
pub mod cartridge;
pub mod component;
pub mod control;
pub mod controller;
pub mod cpu;
pub mod debug_symbols;
pub mod debug_trace;
pub mod error;
pub mod memory;
pub mod program_counter;
pub mod register;
pub mod rom_storage;
pub mod status;

pub use bus::{Bus, ByteBus, WordBus};
pub use component::{join_path, Component, SimCtx};
pub use control::Control;
pub use cpu::{Cpu, CpuState, RunReason, RunResult};
pub use error::SimError;

use irata2_hdl::Cpu as HdlCpu;
use irata2_microcode::MicrocodeProgram;

/// The canonical CPU descriptor, shared by every default CPU instance
pub fn default_hdl() -> Result<HdlCpu, SimError> {
    Ok(HdlCpu::new()?)
}

/// Compile the IRATA instruction set for the canonical descriptor
pub fn default_microcode_program(hdl: &HdlCpu) -> Result<MicrocodeProgram, SimError> {
    Ok(irata2_microcode::irata::compile(hdl)?)
}
