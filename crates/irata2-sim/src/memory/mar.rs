//! Memory address register
//!
//! A word register that latches the address bus, plus byte-level ports
//! and process behaviors for address arithmetic: low-byte load with
//! high-byte reset (zero-page addressing), indexed offset add with carry
//! into the high byte, increment, stack-page forcing, and the hardwired
//! IRQ vector. When stack_page and increment fire together, stack_page
//! applies first and increment operates on the forced value.

use irata2_core::{Byte, TickPhase, Word};

use crate::bus::Bus;
use crate::component::{join_path, Component, SimCtx};
use crate::control::Control;

/// Location of the interrupt vector (low byte; high byte follows)
pub const IRQ_VECTOR: Word = Word(0xFFFE);

/// Stack page forced into the high byte by `stack_page`
pub const STACK_PAGE: Byte = Byte(0x01);

pub struct MemoryAddressRegister {
    path: String,
    low_path: String,
    offset_path: String,
    value: Word,
    offset: Byte,
    address_bus: Bus<Word>,
    data_bus: Bus<Byte>,
    read: Control,
    low_read: Control,
    high_reset: Control,
    offset_read: Control,
    increment: Control,
    add_offset: Control,
    stack_page: Control,
    irq_vector: Control,
}

impl MemoryAddressRegister {
    pub fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        address_bus: Bus<Word>,
        data_bus: Bus<Byte>,
    ) -> MemoryAddressRegister {
        let path = join_path(parent, name);
        let low_path = join_path(&path, "low");
        let offset_path = join_path(&path, "offset");
        MemoryAddressRegister {
            read: Control::new(ctx, join_path(&path, "read"), TickPhase::Read),
            low_read: Control::new(ctx, join_path(&low_path, "read"), TickPhase::Read),
            high_reset: Control::new(ctx, join_path(&path, "high.reset"), TickPhase::Process),
            offset_read: Control::new(ctx, join_path(&offset_path, "read"), TickPhase::Read),
            increment: Control::new(ctx, join_path(&path, "increment"), TickPhase::Process),
            add_offset: Control::new(ctx, join_path(&path, "add_offset"), TickPhase::Process),
            stack_page: Control::new(ctx, join_path(&path, "stack_page"), TickPhase::Process),
            irq_vector: Control::new(ctx, join_path(&path, "irq_vector"), TickPhase::Process),
            path,
            low_path,
            offset_path,
            value: Word::ZERO,
            offset: Byte::ZERO,
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

    pub fn offset_value(&self) -> Byte {
        self.offset
    }
}

impl Component for MemoryAddressRegister {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.read);
        f(&mut self.low_read);
        f(&mut self.high_reset);
        f(&mut self.offset_read);
        f(&mut self.increment);
        f(&mut self.add_offset);
        f(&mut self.stack_page);
        f(&mut self.irq_vector);
    }

    fn tick_read(&mut self) {
        if self.read.is_asserted() {
            self.value = self.address_bus.read(&self.path);
        }
        if self.low_read.is_asserted() {
            self.value = self.value.with_low(self.data_bus.read(&self.low_path));
        }
        if self.offset_read.is_asserted() {
            self.offset = self.data_bus.read(&self.offset_path);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());

        if self.irq_vector.is_asserted() {
            self.value = IRQ_VECTOR;
        }
        if self.high_reset.is_asserted() {
            self.value = self.value.with_high(Byte::ZERO);
        }
        if self.stack_page.is_asserted() {
            self.value = self.value.with_high(STACK_PAGE);
        }
        if self.increment.is_asserted() {
            self.value = self.value + Word(1);
        }
        if self.add_offset.is_asserted() {
            // Unsigned low + offset; the carry propagates into the high
            // byte explicitly.
            let sum = u16::from(self.value.low().0) + u16::from(self.offset.0);
            let carry = Byte((sum > 0xFF) as u8);
            let high = self.value.high() + carry;
            self.value = Word::from_bytes(high, Byte((sum & 0xFF) as u8));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rig {
        ctx: SimCtx,
        data_bus: Bus<Byte>,
        address_bus: Bus<Word>,
        mar: MemoryAddressRegister,
        controls: Vec<Control>,
    }

    impl Rig {
        fn new() -> Rig {
            let ctx = SimCtx::new();
            let address_bus = Bus::new(&ctx, "address_bus".to_string());
            let data_bus = Bus::new(&ctx, "data_bus".to_string());
            let mar = MemoryAddressRegister::new(
                &ctx,
                "memory",
                "mar",
                address_bus.clone(),
                data_bus.clone(),
            );
            let controls = ctx.take_controls();
            Rig {
                ctx,
                data_bus,
                address_bus,
                mar,
                controls,
            }
        }

        fn assert(&self, path: &str) {
            self.ctx.set_phase(TickPhase::Control);
            self.controls
                .iter()
                .find(|control| control.info().path == path)
                .expect("control exists")
                .assert();
        }

        fn process(&mut self) {
            self.ctx.set_phase(TickPhase::Process);
            self.mar.tick_process();
            self.ctx.set_phase(TickPhase::Clear);
            self.mar.tick_clear();
        }
    }

    #[test]
    fn test_latches_address_bus() {
        let mut rig = Rig::new();
        rig.assert("memory.mar.read");
        rig.ctx.set_phase(TickPhase::Write);
        rig.address_bus.write(Word(0x8000), "pc");
        rig.ctx.set_phase(TickPhase::Read);
        rig.mar.tick_read();
        assert_eq!(rig.mar.value(), Word(0x8000));
    }

    #[test]
    fn test_low_read_with_high_reset_selects_zero_page() {
        let mut rig = Rig::new();
        rig.mar.set_value(Word(0x8013));

        rig.assert("memory.mar.low.read");
        rig.assert("memory.mar.high.reset");
        rig.ctx.set_phase(TickPhase::Write);
        rig.data_bus.write(Byte(0x42), "memory");
        rig.ctx.set_phase(TickPhase::Read);
        rig.mar.tick_read();
        rig.process();

        assert_eq!(rig.mar.value(), Word(0x0042));
    }

    #[test]
    fn test_add_offset_carries_into_high_byte() {
        let mut rig = Rig::new();
        rig.mar.set_value(Word(0x10F0));

        rig.assert("memory.mar.offset.read");
        rig.assert("memory.mar.add_offset");
        rig.ctx.set_phase(TickPhase::Write);
        rig.data_bus.write(Byte(0x20), "x");
        rig.ctx.set_phase(TickPhase::Read);
        rig.mar.tick_read();
        rig.process();

        assert_eq!(rig.mar.value(), Word(0x1110));
    }

    #[test]
    fn test_stack_page_forces_high_byte() {
        let mut rig = Rig::new();
        rig.mar.set_value(Word(0x80FD));
        rig.assert("memory.mar.stack_page");
        rig.process();
        assert_eq!(rig.mar.value(), Word(0x01FD));
    }

    #[test]
    fn test_stack_page_applies_before_increment() {
        let mut rig = Rig::new();
        rig.mar.set_value(Word(0x80FF));
        rig.assert("memory.mar.stack_page");
        rig.assert("memory.mar.increment");
        rig.process();
        // Forced to 0x01FF first, then incremented.
        assert_eq!(rig.mar.value(), Word(0x0200));
    }

    #[test]
    fn test_irq_vector() {
        let mut rig = Rig::new();
        rig.assert("memory.mar.irq_vector");
        rig.process();
        assert_eq!(rig.mar.value(), IRQ_VECTOR);
    }

    #[test]
    fn test_increment() {
        let mut rig = Rig::new();
        rig.mar.set_value(Word(0xFFFE));
        rig.assert("memory.mar.increment");
        rig.process();
        assert_eq!(rig.mar.value(), Word(0xFFFF));
    }
}
