//! Root CPU: component tree, tick loop, and run driver
//!
//! The CPU owns every simulator component and drives the five phases in
//! order each tick. Children tick in a fixed order with two load-bearing
//! placements: the ALU before the status register (a direct carry
//! set/clear in microcode overrides the ALU's carry-out in the same
//! step), and the controller before the PC (the IPC latch observes the
//! pre-increment PC at instruction start).

use indexmap::IndexMap;
use irata2_core::{Byte, TickPhase, Word};
use irata2_hdl::Cpu as HdlCpu;
use irata2_microcode::MicrocodeProgram;

use crate::alu::Alu;
use crate::bus::{Bus, ByteBus, WordBus};
use crate::component::{Component, SimCtx};
use crate::control::Control;
use crate::controller::{Controller, InstructionMemory};
use crate::debug_symbols::DebugSymbols;
use crate::debug_trace::{DebugTraceBuffer, DebugTraceEntry};
use crate::error::SimError;
use crate::memory::{Memory, Ram, RegionSpec, Rom};
use crate::program_counter::ProgramCounter;
use crate::register::{ByteRegister, Register, StackPointer, TempRegister};
use crate::status::StatusRegister;

/// Default memory map: RAM covering the zero and stack pages
pub const RAM_BASE: Word = Word(0x0000);
pub const RAM_SIZE: usize = 0x4000;

/// Default memory map: cartridge ROM
pub const ROM_BASE: Word = Word(0x8000);
pub const ROM_SIZE: usize = 0x8000;

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunReason {
    Halt,
    Crash,
    Timeout,
    Running,
}

/// Register snapshot captured at the end of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuState {
    pub a: Byte,
    pub x: Byte,
    pub y: Byte,
    pub sp: Byte,
    pub status: Byte,
    pub pc: Word,
    pub sc: Byte,
}

#[derive(Clone, Copy, Debug)]
pub struct RunResult {
    pub reason: RunReason,
    /// Cycles executed by this run call
    pub cycles: u64,
    pub state: Option<CpuState>,
}

pub struct Cpu {
    ctx: SimCtx,
    halt: Control,
    crash: Control,
    irq_line: Control,
    data_bus: ByteBus,
    address_bus: WordBus,
    a: ByteRegister,
    x: ByteRegister,
    y: ByteRegister,
    sp: StackPointer,
    tmp: TempRegister,
    alu: Alu,
    controller: Controller,
    pc: ProgramCounter,
    status: StatusRegister,
    memory: Memory,
    controls_by_path: IndexMap<String, Control>,
    halted: bool,
    crashed: bool,
    cycle_count: u64,
    trace: DebugTraceBuffer,
    debug_symbols: Option<DebugSymbols>,
}

impl Cpu {
    /// Build a CPU from a descriptor and a compiled microcode program,
    /// with the default memory map (RAM at 0x0000, cartridge ROM at
    /// 0x8000) plus any extra regions (MMIO devices).
    ///
    /// Device factories typically capture a clone of [`Cpu::irq_line`]
    /// handed out via [`RegionSpec`] construction; see the integration
    /// tests for the pattern.
    pub fn new(
        hdl: &HdlCpu,
        program: &MicrocodeProgram,
        cartridge_rom: Vec<Byte>,
        extra_regions: Vec<RegionSpec>,
    ) -> Result<Cpu, SimError> {
        if cartridge_rom.len() > ROM_SIZE {
            return Err(SimError::CartridgeRomTooLarge {
                size: cartridge_rom.len(),
            });
        }

        let ctx = SimCtx::new();

        let halt = Control::new(&ctx, "halt".to_string(), TickPhase::Process);
        let crash = Control::new(&ctx, "crash".to_string(), TickPhase::Process);
        let irq_line = Control::latched(&ctx, "irq_line".to_string(), TickPhase::Process);

        let data_bus: ByteBus = Bus::new(&ctx, "data_bus".to_string());
        let address_bus: WordBus = Bus::new(&ctx, "address_bus".to_string());

        let a = Register::new(&ctx, "", "a", data_bus.clone());
        let x = Register::new(&ctx, "", "x", data_bus.clone());
        let y = Register::new(&ctx, "", "y", data_bus.clone());
        let sp = StackPointer::new(&ctx, "", "sp", data_bus.clone());
        let tmp = TempRegister::new(&ctx, "", "tmp", address_bus.clone(), data_bus.clone());

        // Constructed before the ALU and controller, which borrow its
        // flag handles; it still ticks after both.
        let status = StatusRegister::new(&ctx, "", "status", data_bus.clone());

        let alu = Alu::new(
            &ctx,
            "",
            "alu",
            data_bus.clone(),
            status.carry(),
            status.overflow(),
        );

        let pc = ProgramCounter::new(&ctx, "", "pc", address_bus.clone(), data_bus.clone());
        let controller = Controller::new(
            &ctx,
            "",
            "controller",
            data_bus.clone(),
            pc.share_value(),
            irq_line.clone(),
            status.interrupt_disable(),
        );

        let mut regions = Vec::with_capacity(2 + extra_regions.len());
        regions.push(RegionSpec::new(
            "ram",
            RAM_BASE,
            Box::new(|hooks| Box::new(Ram::new(hooks.path, RAM_SIZE, Byte::ZERO))),
        ));
        regions.push(RegionSpec::new(
            "cartridge",
            ROM_BASE,
            Box::new(move |hooks| {
                Box::new(Rom::with_size(
                    hooks.path,
                    &cartridge_rom,
                    ROM_SIZE,
                    Byte(0xFF),
                ))
            }),
        ));
        regions.extend(extra_regions);

        let memory = Memory::new(
            &ctx,
            "",
            "memory",
            data_bus.clone(),
            address_bus.clone(),
            irq_line.clone(),
            regions,
        )?;

        let mut cpu = Cpu {
            halt,
            crash,
            irq_line,
            data_bus,
            address_bus,
            a,
            x,
            y,
            sp,
            tmp,
            alu,
            controller,
            pc,
            status,
            memory,
            controls_by_path: IndexMap::new(),
            halted: false,
            crashed: false,
            cycle_count: 0,
            trace: DebugTraceBuffer::default(),
            debug_symbols: None,
            ctx,
        };

        cpu.index_controls(hdl)?;
        cpu.load_program(program)?;

        tracing::debug!(
            controls = cpu.controls_by_path.len(),
            "cpu constructed"
        );
        Ok(cpu)
    }

    /// Collect every control registered during construction and check
    /// the result against the descriptor's catalog.
    fn index_controls(&mut self, hdl: &HdlCpu) -> Result<(), SimError> {
        let mut controls_by_path = IndexMap::new();
        for control in self.ctx.take_controls() {
            controls_by_path.insert(control.info().path.clone(), control);
        }
        controls_by_path.sort_keys();

        let expected = hdl.catalog().paths();
        if expected.len() != controls_by_path.len() {
            return Err(SimError::ControlTableSize {
                program: expected.len(),
                cpu: controls_by_path.len(),
            });
        }
        for (bit, (expected, actual)) in
            expected.iter().zip(controls_by_path.keys()).enumerate()
        {
            if expected != actual {
                return Err(SimError::ControlOrderMismatch {
                    bit,
                    program: expected.clone(),
                    cpu: actual.clone(),
                });
            }
        }

        self.controls_by_path = controls_by_path;
        Ok(())
    }

    /// Bind a compiled program, replacing any previous instruction memory
    pub fn load_program(&mut self, program: &MicrocodeProgram) -> Result<(), SimError> {
        let instruction_memory = InstructionMemory::new(
            "controller",
            "instruction_memory",
            program,
            &self.controls_by_path,
            &self.status,
        )?;
        self.controller.load_program(instruction_memory);
        Ok(())
    }

    /// Reset to a cartridge entry point: PC at entry, step counter at 0,
    /// IR primed with the entry byte, stack pointer at the top of the
    /// stack page.
    pub fn reset(&mut self, entry: Word) {
        self.pc.set_value(entry);
        self.controller.sc_mut().set_value(Byte::ZERO);
        let opcode = self.memory.read_at(entry);
        self.controller.ir_mut().set_value(opcode);
        self.sp.set_value(Byte(0xFF));
        self.halted = false;
        self.crashed = false;
    }

    /// Execute one clock cycle (five phases). No-op once halted.
    pub fn tick(&mut self) {
        if self.halted {
            return;
        }

        self.ctx.set_phase(TickPhase::Control);
        self.tick_control();

        self.ctx.set_phase(TickPhase::Write);
        self.tick_write();

        self.ctx.set_phase(TickPhase::Read);
        self.tick_read();

        self.ctx.set_phase(TickPhase::Process);
        self.tick_process();

        self.ctx.set_phase(TickPhase::Clear);
        self.tick_clear();

        self.ctx.set_phase(TickPhase::None);
        self.cycle_count += 1;
    }

    /// Run until halt or crash, up to a cycle cap
    pub fn run_until_halt(&mut self, max_cycles: u64) -> RunResult {
        let mut executed = 0u64;
        while !self.halted && executed < max_cycles {
            self.tick();
            executed += 1;
        }

        let reason = if self.crashed {
            RunReason::Crash
        } else if self.halted {
            RunReason::Halt
        } else if executed >= max_cycles {
            RunReason::Timeout
        } else {
            RunReason::Running
        };

        tracing::debug!(?reason, cycles = executed, "run finished");
        RunResult {
            reason,
            cycles: executed,
            state: Some(self.state()),
        }
    }

    /// Current register snapshot
    pub fn state(&self) -> CpuState {
        CpuState {
            a: self.a.value(),
            x: self.x.value(),
            y: self.y.value(),
            sp: self.sp.value(),
            status: self.status.value(),
            pc: self.pc.value(),
            sc: self.controller.sc().value(),
        }
    }

    pub fn current_phase(&self) -> TickPhase {
        self.ctx.phase()
    }

    /// Shared context handle; tests use it to drive single phases
    pub fn ctx(&self) -> &SimCtx {
        &self.ctx
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn crashed(&self) -> bool {
        self.crashed
    }

    pub fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn a(&self) -> &ByteRegister {
        &self.a
    }

    pub fn a_mut(&mut self) -> &mut ByteRegister {
        &mut self.a
    }

    pub fn x(&self) -> &ByteRegister {
        &self.x
    }

    pub fn y(&self) -> &ByteRegister {
        &self.y
    }

    pub fn sp(&self) -> &StackPointer {
        &self.sp
    }

    pub fn pc(&self) -> &ProgramCounter {
        &self.pc
    }

    pub fn pc_mut(&mut self) -> &mut ProgramCounter {
        &mut self.pc
    }

    pub fn status(&self) -> &StatusRegister {
        &self.status
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// The shared interrupt request line; devices set it during Control
    pub fn irq_line(&self) -> &Control {
        &self.irq_line
    }

    /// Instruction address latched at the most recent instruction start
    pub fn instruction_address(&self) -> Word {
        self.controller.ipc().value()
    }

    /// Look up a live control by path
    pub fn resolve_control(&self, path: &str) -> Option<&Control> {
        self.controls_by_path.get(path)
    }

    /// Every control path, sorted (bit order)
    pub fn all_control_paths(&self) -> Vec<String> {
        self.controls_by_path.keys().cloned().collect()
    }

    /// Enable the instruction trace with the given depth
    pub fn enable_trace(&mut self, depth: usize) {
        self.trace.configure(depth);
    }

    pub fn trace(&self) -> &DebugTraceBuffer {
        &self.trace
    }

    pub fn attach_debug_symbols(&mut self, symbols: DebugSymbols) {
        self.debug_symbols = Some(symbols);
    }

    pub fn debug_symbols(&self) -> Option<&DebugSymbols> {
        self.debug_symbols.as_ref()
    }
}

impl Component for Cpu {
    fn path(&self) -> &str {
        ""
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.halt);
        f(&mut self.crash);
        f(&mut self.irq_line);
        f(&mut self.data_bus);
        f(&mut self.address_bus);
        f(&mut self.a);
        f(&mut self.x);
        f(&mut self.y);
        f(&mut self.sp);
        f(&mut self.tmp);
        f(&mut self.alu);
        // The controller must tick before the PC so the IPC latch sees
        // the pre-increment value, and the ALU before the status register
        // so direct flag controls win over ALU flag writes.
        f(&mut self.controller);
        f(&mut self.pc);
        f(&mut self.status);
        f(&mut self.memory);
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());

        if self.halt.is_asserted() {
            self.halted = true;
        }
        if self.crash.is_asserted() {
            self.crashed = true;
            self.halted = true;
        }

        if self.trace.enabled() && self.controller.instruction_start().is_asserted() {
            let entry = DebugTraceEntry {
                cycle: self.cycle_count,
                instruction_address: self.controller.ipc().value(),
                pc: self.pc.value(),
                ir: self.controller.ir().observed_value(),
                sc: self.controller.sc().value(),
                a: self.a.value(),
                x: self.x.value(),
                status: self.status.value(),
            };
            self.trace.record(entry);
        }
    }
}
