//! Bus-connected registers and counters
//!
//! A register stores a value, drives its bus when its write control is
//! asserted, latches from the bus when its read control is asserted, and
//! zeroes itself when its reset control fires during Process. The stack
//! pointer and the controller's local step counter extend this with
//! increment/decrement behavior; `tmp` is the operand-assembly register
//! that gathers little-endian bytes from the data bus and drives the
//! address bus with the result.

use std::cell::Cell;
use std::rc::Rc;

use irata2_core::{Byte, TickPhase, Word};

use crate::bus::Bus;
use crate::component::{join_path, Component, SimCtx};
use crate::control::Control;

/// Shared view of a 16-bit register value
#[derive(Clone, Default)]
pub struct WordCell(Rc<Cell<u16>>);

impl WordCell {
    pub(crate) fn from_raw(cell: Rc<Cell<u16>>) -> WordCell {
        WordCell(cell)
    }

    pub fn get(&self) -> Word {
        Word(self.0.get())
    }

    pub fn set(&self, value: Word) {
        self.0.set(value.0);
    }
}

/// A value register connected to one bus
pub struct Register<T: Copy + Default> {
    path: String,
    value: T,
    bus: Bus<T>,
    read: Control,
    write: Control,
    reset: Control,
}

impl<T: Copy + Default> Register<T> {
    pub fn new(ctx: &SimCtx, parent: &str, name: &str, bus: Bus<T>) -> Register<T> {
        let path = join_path(parent, name);
        Register {
            read: Control::new(ctx, join_path(&path, "read"), TickPhase::Read),
            write: Control::new(ctx, join_path(&path, "write"), TickPhase::Write),
            reset: Control::new(ctx, join_path(&path, "reset"), TickPhase::Process),
            path,
            value: T::default(),
            bus,
        }
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }
}

impl<T: Copy + Default> Component for Register<T> {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.read);
        f(&mut self.write);
        f(&mut self.reset);
    }

    fn tick_write(&mut self) {
        if self.write.is_asserted() {
            self.bus.write(self.value, &self.path);
        }
    }

    fn tick_read(&mut self) {
        if self.read.is_asserted() {
            self.value = self.bus.read(&self.path);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if self.reset.is_asserted() {
            self.value = T::default();
        }
    }
}

pub type ByteRegister = Register<Byte>;

/// Stack pointer: a byte register with increment and decrement controls.
/// Reset wins over both; increment and decrement are mutually exclusive
/// by microcode validation.
pub struct StackPointer {
    path: String,
    value: Byte,
    bus: Bus<Byte>,
    read: Control,
    write: Control,
    reset: Control,
    increment: Control,
    decrement: Control,
}

impl StackPointer {
    pub fn new(ctx: &SimCtx, parent: &str, name: &str, bus: Bus<Byte>) -> StackPointer {
        let path = join_path(parent, name);
        StackPointer {
            read: Control::new(ctx, join_path(&path, "read"), TickPhase::Read),
            write: Control::new(ctx, join_path(&path, "write"), TickPhase::Write),
            reset: Control::new(ctx, join_path(&path, "reset"), TickPhase::Process),
            increment: Control::new(ctx, join_path(&path, "increment"), TickPhase::Process),
            decrement: Control::new(ctx, join_path(&path, "decrement"), TickPhase::Process),
            path,
            value: Byte::ZERO,
            bus,
        }
    }

    pub fn value(&self) -> Byte {
        self.value
    }

    pub fn set_value(&mut self, value: Byte) {
        self.value = value;
    }
}

impl Component for StackPointer {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.read);
        f(&mut self.write);
        f(&mut self.reset);
        f(&mut self.increment);
        f(&mut self.decrement);
    }

    fn tick_write(&mut self) {
        if self.write.is_asserted() {
            self.bus.write(self.value, &self.path);
        }
    }

    fn tick_read(&mut self) {
        if self.read.is_asserted() {
            self.value = self.bus.read(&self.path);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if self.reset.is_asserted() {
            self.value = Byte::ZERO;
            return;
        }
        if self.increment.is_asserted() {
            self.value = self.value + Byte(1);
        }
        if self.decrement.is_asserted() {
            self.value = self.value - Byte(1);
        }
    }
}

/// The controller's step counter: not bus-connected, increment and reset
/// only. Reset wins when both fire.
pub struct LocalCounter {
    path: String,
    value: Byte,
    increment: Control,
    reset: Control,
}

impl LocalCounter {
    pub fn new(ctx: &SimCtx, parent: &str, name: &str) -> LocalCounter {
        let path = join_path(parent, name);
        LocalCounter {
            increment: Control::new(ctx, join_path(&path, "increment"), TickPhase::Process),
            reset: Control::new(ctx, join_path(&path, "reset"), TickPhase::Process),
            path,
            value: Byte::ZERO,
        }
    }

    pub fn value(&self) -> Byte {
        self.value
    }

    pub fn set_value(&mut self, value: Byte) {
        self.value = value;
    }
}

impl Component for LocalCounter {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.increment);
        f(&mut self.reset);
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if self.reset.is_asserted() {
            self.value = Byte::ZERO;
            return;
        }
        if self.increment.is_asserted() {
            self.value = self.value + Byte(1);
        }
    }
}

/// Operand-assembly register: loaded bytewise from the data bus, drives
/// the address bus as a word
pub struct TempRegister {
    path: String,
    value: Word,
    address_bus: Bus<Word>,
    data_bus: Bus<Byte>,
    write: Control,
    low_read: Control,
    high_read: Control,
}

impl TempRegister {
    pub fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        address_bus: Bus<Word>,
        data_bus: Bus<Byte>,
    ) -> TempRegister {
        let path = join_path(parent, name);
        TempRegister {
            write: Control::new(ctx, join_path(&path, "write"), TickPhase::Write),
            low_read: Control::new(ctx, join_path(&path, "low.read"), TickPhase::Read),
            high_read: Control::new(ctx, join_path(&path, "high.read"), TickPhase::Read),
            path,
            value: Word::ZERO,
            address_bus,
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

impl Component for TempRegister {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.write);
        f(&mut self.low_read);
        f(&mut self.high_read);
    }

    fn tick_write(&mut self) {
        if self.write.is_asserted() {
            self.address_bus.write(self.value, &self.path);
        }
    }

    fn tick_read(&mut self) {
        if self.low_read.is_asserted() {
            self.value = self.value.with_low(self.data_bus.read(&self.path));
        }
        if self.high_read.is_asserted() {
            self.value = self.value.with_high(self.data_bus.read(&self.path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (SimCtx, Bus<Byte>) {
        let ctx = SimCtx::new();
        let bus = Bus::new(&ctx, "data_bus".to_string());
        (ctx, bus)
    }

    fn assert_in_control(ctx: &SimCtx, f: impl FnOnce()) {
        ctx.set_phase(TickPhase::Control);
        f();
    }

    #[test]
    fn test_register_drives_bus_when_write_asserted() {
        let (ctx, bus) = rig();
        let mut reg = ByteRegister::new(&ctx, "", "a", bus.clone());
        reg.set_value(Byte(0x42));

        let write = reg.write.clone();
        assert_in_control(&ctx, || write.assert());

        ctx.set_phase(TickPhase::Write);
        reg.tick_write();

        ctx.set_phase(TickPhase::Read);
        assert_eq!(bus.read("observer"), Byte(0x42));
    }

    #[test]
    fn test_register_latches_bus_when_read_asserted() {
        let (ctx, bus) = rig();
        let mut reg = ByteRegister::new(&ctx, "", "a", bus.clone());

        let read = reg.read.clone();
        assert_in_control(&ctx, || read.assert());

        ctx.set_phase(TickPhase::Write);
        bus.write(Byte(0x7F), "driver");

        ctx.set_phase(TickPhase::Read);
        reg.tick_read();
        assert_eq!(reg.value(), Byte(0x7F));
    }

    #[test]
    fn test_register_reset() {
        let (ctx, bus) = rig();
        let mut reg = ByteRegister::new(&ctx, "", "a", bus);
        reg.set_value(Byte(0x55));

        let reset = reg.reset.clone();
        assert_in_control(&ctx, || reset.assert());

        ctx.set_phase(TickPhase::Process);
        reg.tick_process();
        assert_eq!(reg.value(), Byte::ZERO);
    }

    #[test]
    fn test_stack_pointer_increment_decrement_wrap() {
        let (ctx, bus) = rig();
        let mut sp = StackPointer::new(&ctx, "", "sp", bus);
        sp.set_value(Byte(0xFF));

        let increment = sp.increment.clone();
        assert_in_control(&ctx, || increment.assert());
        ctx.set_phase(TickPhase::Process);
        sp.tick_process();
        // Controls auto-reset only in Clear phase; simulate it.
        ctx.set_phase(TickPhase::Clear);
        sp.tick_clear();
        assert_eq!(sp.value(), Byte(0x00));

        let decrement = sp.decrement.clone();
        assert_in_control(&ctx, || decrement.assert());
        ctx.set_phase(TickPhase::Process);
        sp.tick_process();
        assert_eq!(sp.value(), Byte(0xFF));
    }

    #[test]
    fn test_stack_pointer_reset_wins() {
        let (ctx, bus) = rig();
        let mut sp = StackPointer::new(&ctx, "", "sp", bus);
        sp.set_value(Byte(0x10));

        let reset = sp.reset.clone();
        let increment = sp.increment.clone();
        assert_in_control(&ctx, || {
            reset.assert();
            increment.assert();
        });
        ctx.set_phase(TickPhase::Process);
        sp.tick_process();
        assert_eq!(sp.value(), Byte::ZERO);
    }

    #[test]
    fn test_local_counter_counts_and_resets() {
        let ctx = SimCtx::new();
        let mut sc = LocalCounter::new(&ctx, "controller", "sc");
        assert_eq!(sc.path(), "controller.sc");

        let increment = sc.increment.clone();
        for _ in 0..3 {
            ctx.set_phase(TickPhase::Control);
            increment.assert();
            ctx.set_phase(TickPhase::Process);
            sc.tick_process();
            ctx.set_phase(TickPhase::Clear);
            sc.tick_clear();
        }
        assert_eq!(sc.value(), Byte(3));

        let reset = sc.reset.clone();
        ctx.set_phase(TickPhase::Control);
        reset.assert();
        ctx.set_phase(TickPhase::Process);
        sc.tick_process();
        assert_eq!(sc.value(), Byte::ZERO);
    }

    #[test]
    fn test_temp_register_assembles_word() {
        let ctx = SimCtx::new();
        let address_bus = Bus::new(&ctx, "address_bus".to_string());
        let data_bus = Bus::new(&ctx, "data_bus".to_string());
        let mut tmp = TempRegister::new(&ctx, "", "tmp", address_bus.clone(), data_bus.clone());

        let low_read = tmp.low_read.clone();
        ctx.set_phase(TickPhase::Control);
        low_read.assert();
        ctx.set_phase(TickPhase::Write);
        data_bus.write(Byte(0x34), "memory");
        ctx.set_phase(TickPhase::Read);
        tmp.tick_read();
        ctx.set_phase(TickPhase::Clear);
        tmp.tick_clear();
        data_bus.clone().tick_clear();

        let high_read = tmp.high_read.clone();
        ctx.set_phase(TickPhase::Control);
        high_read.assert();
        ctx.set_phase(TickPhase::Write);
        data_bus.write(Byte(0x12), "memory");
        ctx.set_phase(TickPhase::Read);
        tmp.tick_read();

        assert_eq!(tmp.value(), Word(0x1234));

        let write = tmp.write.clone();
        ctx.set_phase(TickPhase::Control);
        write.assert();
        ctx.set_phase(TickPhase::Write);
        tmp.tick_write();
        ctx.set_phase(TickPhase::Read);
        assert_eq!(address_bus.read("pc"), Word(0x1234));
    }
}
