//! Program counter
//!
//! A 16-bit counter on the address bus with byte ports on the data bus
//! and a signed branch-offset latch. Process priority: reset
//! short-circuits everything; increment applies before the signed-offset
//! add when both fire in one tick.

use std::cell::Cell;
use std::rc::Rc;

use irata2_core::{Byte, TickPhase, Word};

use crate::bus::Bus;
use crate::component::{join_path, Component, SimCtx};
use crate::control::Control;
use crate::register::WordCell;

/// One byte half of the PC, read and written over the data bus
struct BytePort {
    path: String,
    value: Rc<Cell<u16>>,
    data_bus: Bus<Byte>,
    read: Control,
    write: Control,
    is_high: bool,
}

impl BytePort {
    fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        value: Rc<Cell<u16>>,
        data_bus: Bus<Byte>,
        is_high: bool,
    ) -> BytePort {
        let path = join_path(parent, name);
        BytePort {
            read: Control::new(ctx, join_path(&path, "read"), TickPhase::Read),
            write: Control::new(ctx, join_path(&path, "write"), TickPhase::Write),
            path,
            value,
            data_bus,
            is_high,
        }
    }

    fn current(&self) -> Byte {
        let word = Word(self.value.get());
        if self.is_high {
            word.high()
        } else {
            word.low()
        }
    }

    fn store(&self, byte: Byte) {
        let word = Word(self.value.get());
        let updated = if self.is_high {
            word.with_high(byte)
        } else {
            word.with_low(byte)
        };
        self.value.set(updated.0);
    }
}

impl Component for BytePort {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.read);
        f(&mut self.write);
    }

    fn tick_write(&mut self) {
        if self.write.is_asserted() {
            self.data_bus.write(self.current(), &self.path);
        }
    }

    fn tick_read(&mut self) {
        if self.read.is_asserted() {
            self.store(self.data_bus.read(&self.path));
        }
    }
}

/// Read-only latch holding the branch displacement
struct SignedOffsetLatch {
    path: String,
    value: Byte,
    data_bus: Bus<Byte>,
    read: Control,
}

impl Component for SignedOffsetLatch {
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
}

pub struct ProgramCounter {
    path: String,
    value: Rc<Cell<u16>>,
    address_bus: Bus<Word>,
    read: Control,
    write: Control,
    reset: Control,
    increment: Control,
    add_signed_offset: Control,
    low: BytePort,
    high: BytePort,
    signed_offset: SignedOffsetLatch,
}

impl ProgramCounter {
    pub fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        address_bus: Bus<Word>,
        data_bus: Bus<Byte>,
    ) -> ProgramCounter {
        let path = join_path(parent, name);
        let value = Rc::new(Cell::new(0u16));
        let offset_path = join_path(&path, "signed_offset");
        ProgramCounter {
            read: Control::new(ctx, join_path(&path, "read"), TickPhase::Read),
            write: Control::new(ctx, join_path(&path, "write"), TickPhase::Write),
            reset: Control::new(ctx, join_path(&path, "reset"), TickPhase::Process),
            increment: Control::new(ctx, join_path(&path, "increment"), TickPhase::Process),
            add_signed_offset: Control::new(
                ctx,
                join_path(&path, "add_signed_offset"),
                TickPhase::Process,
            ),
            low: BytePort::new(ctx, &path, "low", value.clone(), data_bus.clone(), false),
            high: BytePort::new(ctx, &path, "high", value.clone(), data_bus.clone(), true),
            signed_offset: SignedOffsetLatch {
                read: Control::new(ctx, join_path(&offset_path, "read"), TickPhase::Read),
                path: offset_path,
                value: Byte::ZERO,
                data_bus,
            },
            path,
            value,
            address_bus,
        }
    }

    pub fn value(&self) -> Word {
        Word(self.value.get())
    }

    pub fn set_value(&mut self, value: Word) {
        self.value.set(value.0);
    }

    /// Shared view of the PC value, used by the controller's IPC latch
    pub fn share_value(&self) -> WordCell {
        WordCell::from_raw(self.value.clone())
    }
}

impl Component for ProgramCounter {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.read);
        f(&mut self.write);
        f(&mut self.reset);
        f(&mut self.increment);
        f(&mut self.add_signed_offset);
        f(&mut self.low);
        f(&mut self.high);
        f(&mut self.signed_offset);
    }

    fn tick_write(&mut self) {
        self.for_each_child(&mut |child| child.tick_write());
        if self.write.is_asserted() {
            self.address_bus.write(self.value(), &self.path);
        }
    }

    fn tick_read(&mut self) {
        self.for_each_child(&mut |child| child.tick_read());
        if self.read.is_asserted() {
            let word = self.address_bus.read(&self.path);
            self.value.set(word.0);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());

        if self.reset.is_asserted() {
            self.value.set(0);
            return;
        }
        if self.increment.is_asserted() {
            self.value.set(self.value.get().wrapping_add(1));
        }
        if self.add_signed_offset.is_asserted() {
            let offset = i32::from(self.signed_offset.value.as_signed());
            let updated = i32::from(self.value.get()) + offset;
            self.value.set((updated & 0xFFFF) as u16);
        }
    }
}
