//! Microcoded controller
//!
//! Every Control phase the controller reads its current state (the
//! observed opcode, the step counter, and the encoded status byte), looks
//! the triple up in instruction memory, and asserts the resulting control
//! set. The instruction register injects the reserved IRQ opcode when an
//! interrupt is pending at an instruction boundary; the IPC register
//! latches the address of the instruction being decoded so traces and the
//! interrupt sequence see it even after the PC advances.

pub mod instruction_memory;

pub use instruction_memory::InstructionMemory;

use irata2_core::{Byte, TickPhase, Word};

use crate::bus::Bus;
use crate::component::{join_path, Component, SimCtx};
use crate::control::Control;
use crate::register::{LocalCounter, WordCell};
use crate::status::StatusBit;

/// Opcode synthesized by the IR when an interrupt is taken
pub const IRQ_OPCODE: Byte = Byte(0x00);

/// Instruction register with IRQ injection
///
/// The stored byte is only overwritten by its bus read control; the
/// observed value differs from it exactly when an interrupt was pending
/// (and not masked) at the most recent instruction start.
pub struct InstructionRegister {
    path: String,
    value: Byte,
    data_bus: Bus<Byte>,
    read: Control,
    irq_line: Control,
    instruction_start: Control,
    interrupt_disable: StatusBit,
    inject_interrupt: bool,
}

impl InstructionRegister {
    fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        data_bus: Bus<Byte>,
        irq_line: Control,
        instruction_start: Control,
        interrupt_disable: StatusBit,
    ) -> InstructionRegister {
        let path = join_path(parent, name);
        InstructionRegister {
            read: Control::new(ctx, join_path(&path, "read"), TickPhase::Read),
            path,
            value: Byte::ZERO,
            data_bus,
            irq_line,
            instruction_start,
            interrupt_disable,
            inject_interrupt: false,
        }
    }

    /// The opcode the controller dispatches on
    pub fn observed_value(&self) -> Byte {
        if self.inject_interrupt {
            IRQ_OPCODE
        } else {
            self.value
        }
    }

    /// The latched byte, ignoring injection
    pub fn stored_value(&self) -> Byte {
        self.value
    }

    pub fn set_value(&mut self, value: Byte) {
        self.value = value;
        self.inject_interrupt = false;
    }
}

impl Component for InstructionRegister {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.read);
    }

    fn tick_read(&mut self) {
        if self.read.is_asserted() {
            self.value = self.data_bus.read(&self.path);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if self.instruction_start.is_asserted() {
            self.inject_interrupt =
                self.irq_line.is_asserted() && !self.interrupt_disable.get();
        }
    }
}

/// Latched copy of the PC taken at instruction start, with write-only
/// byte ports used by the interrupt microcode to push the return address
pub struct IpcRegister {
    path: String,
    low_path: String,
    high_path: String,
    value: Word,
    source: WordCell,
    data_bus: Bus<Byte>,
    latch: Control,
    low_write: Control,
    high_write: Control,
}

impl IpcRegister {
    fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        source: WordCell,
        data_bus: Bus<Byte>,
    ) -> IpcRegister {
        let path = join_path(parent, name);
        let low_path = join_path(&path, "low");
        let high_path = join_path(&path, "high");
        IpcRegister {
            latch: Control::new(ctx, join_path(&path, "latch"), TickPhase::Process),
            low_write: Control::new(ctx, join_path(&low_path, "write"), TickPhase::Write),
            high_write: Control::new(ctx, join_path(&high_path, "write"), TickPhase::Write),
            path,
            low_path,
            high_path,
            value: Word::ZERO,
            source,
            data_bus,
        }
    }

    pub fn value(&self) -> Word {
        self.value
    }

    pub fn set_value(&mut self, value: Word) {
        self.value = value;
    }
}

impl Component for IpcRegister {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.latch);
        f(&mut self.low_write);
        f(&mut self.high_write);
    }

    fn tick_write(&mut self) {
        if self.low_write.is_asserted() {
            self.data_bus.write(self.value.low(), &self.low_path);
        }
        if self.high_write.is_asserted() {
            self.data_bus.write(self.value.high(), &self.high_path);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if self.latch.is_asserted() {
            self.value = self.source.get();
        }
    }
}

pub struct Controller {
    path: String,
    instruction_start: Control,
    ir: InstructionRegister,
    sc: LocalCounter,
    ipc: IpcRegister,
    pc: WordCell,
    instruction_memory: Option<InstructionMemory>,
}

impl Controller {
    pub fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        data_bus: Bus<Byte>,
        pc: WordCell,
        irq_line: Control,
        interrupt_disable: StatusBit,
    ) -> Controller {
        let path = join_path(parent, name);
        let instruction_start = Control::new(
            ctx,
            join_path(&path, "instruction_start"),
            TickPhase::Process,
        );
        Controller {
            ir: InstructionRegister::new(
                ctx,
                &path,
                "ir",
                data_bus.clone(),
                irq_line,
                instruction_start.clone(),
                interrupt_disable,
            ),
            sc: LocalCounter::new(ctx, &path, "sc"),
            ipc: IpcRegister::new(ctx, &path, "ipc", pc.clone(), data_bus),
            instruction_start,
            path,
            pc,
            instruction_memory: None,
        }
    }

    /// Install (or replace) the compiled microcode
    pub fn load_program(&mut self, instruction_memory: InstructionMemory) {
        self.instruction_memory = Some(instruction_memory);
    }

    pub fn instruction_memory(&self) -> Option<&InstructionMemory> {
        self.instruction_memory.as_ref()
    }

    pub fn ir(&self) -> &InstructionRegister {
        &self.ir
    }

    pub fn ir_mut(&mut self) -> &mut InstructionRegister {
        &mut self.ir
    }

    pub fn sc(&self) -> &LocalCounter {
        &self.sc
    }

    pub fn sc_mut(&mut self) -> &mut LocalCounter {
        &mut self.sc
    }

    pub fn ipc(&self) -> &IpcRegister {
        &self.ipc
    }

    /// The instruction-boundary pulse; readable during Process phase
    pub fn instruction_start(&self) -> &Control {
        &self.instruction_start
    }
}

impl Component for Controller {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.instruction_start);
        f(&mut self.ir);
        f(&mut self.sc);
        f(&mut self.ipc);
    }

    fn tick_control(&mut self) {
        self.for_each_child(&mut |child| child.tick_control());

        let memory = self
            .instruction_memory
            .as_ref()
            .unwrap_or_else(|| panic!("controller has no microcode program: {}", self.path));

        let opcode = self.ir.observed_value();
        let step = self.sc.value();
        let status = memory.encode_status();
        for control in memory.lookup(opcode.0, step.0, status) {
            control.assert();
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());

        // The controller ticks before the PC, so this latches the address
        // of the instruction whose fetch just completed, not the
        // incremented PC.
        if self.instruction_start.is_asserted() {
            self.ipc.set_value(self.pc.get());
        }
    }
}
