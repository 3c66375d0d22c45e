//! Status register, status bits, and the bus analyzer
//!
//! The status register is an ordinary byte register on the data bus whose
//! storage is shared with eight bit-level children. The carry and
//! interrupt-disable bits carry set/clear process controls (microcode
//! writes them directly); the remaining flags are driven by hardware: the
//! ALU writes carry and overflow from arithmetic, and the analyzer taps
//! the data bus to derive zero and negative from whatever value passed.
//!
//! Ordering note: the ALU ticks before the status register, so a direct
//! set/clear in the same step overrides the ALU's carry-out.

use std::cell::Cell;
use std::rc::Rc;

use irata2_core::{Byte, TickPhase};
use irata2_hdl::STATUS_BITS;

use crate::bus::Bus;
use crate::component::{join_path, Component, SimCtx};
use crate::control::Control;

/// Shared handle to one bit of the status register
#[derive(Clone)]
pub struct StatusBit {
    bits: Rc<Cell<u8>>,
    index: u8,
}

impl StatusBit {
    pub fn bit_index(&self) -> u8 {
        self.index
    }

    pub fn get(&self) -> bool {
        (self.bits.get() >> self.index) & 1 != 0
    }

    pub fn set(&self, value: bool) {
        let mask = 1u8 << self.index;
        let current = self.bits.get();
        if value {
            self.bits.set(current | mask);
        } else {
            self.bits.set(current & !mask);
        }
    }
}

/// One status flag in the component tree
///
/// Software-controlled flags own set/clear process controls; hardware
/// flags exist in the tree for naming and introspection only.
pub struct Status {
    path: String,
    bit: StatusBit,
    controls: Option<(Control, Control)>,
}

impl Status {
    fn new(ctx: &SimCtx, parent: &str, name: &str, bit: StatusBit, software: bool) -> Status {
        let path = join_path(parent, name);
        let controls = software.then(|| {
            (
                Control::new(ctx, join_path(&path, "set"), TickPhase::Process),
                Control::new(ctx, join_path(&path, "clear"), TickPhase::Process),
            )
        });
        Status {
            path,
            bit,
            controls,
        }
    }

    pub fn value(&self) -> bool {
        self.bit.get()
    }

    pub fn bit(&self) -> StatusBit {
        self.bit.clone()
    }
}

impl Component for Status {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        if let Some((set, clear)) = &mut self.controls {
            f(set);
            f(clear);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if let Some((set, clear)) = &self.controls {
            let want_set = set.is_asserted();
            let want_clear = clear.is_asserted();
            if !want_set && !want_clear {
                return;
            }
            // If both fire, set wins.
            self.bit.set(want_set);
        }
    }
}

/// Data-bus tap that derives the zero and negative flags
///
/// When its read control is asserted it latches the bus value during Read
/// and folds it into the flags during Process, so loads, transfers, and
/// ALU results all update Z/N by routing their value past the analyzer.
pub struct StatusAnalyzer {
    path: String,
    read: Control,
    data_bus: Bus<Byte>,
    zero: StatusBit,
    negative: StatusBit,
    pending: Option<Byte>,
}

impl StatusAnalyzer {
    fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        data_bus: Bus<Byte>,
        zero: StatusBit,
        negative: StatusBit,
    ) -> StatusAnalyzer {
        let path = join_path(parent, name);
        StatusAnalyzer {
            read: Control::new(ctx, join_path(&path, "read"), TickPhase::Read),
            path,
            data_bus,
            zero,
            negative,
            pending: None,
        }
    }
}

impl Component for StatusAnalyzer {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.read);
    }

    fn tick_read(&mut self) {
        if self.read.is_asserted() {
            self.pending = Some(self.data_bus.read(&self.path));
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if let Some(value) = self.pending.take() {
            self.zero.set(value.is_zero());
            self.negative.set(value.is_negative());
        }
    }
}

/// The 8-bit status register with its bit children and analyzer
pub struct StatusRegister {
    path: String,
    bits: Rc<Cell<u8>>,
    bus: Bus<Byte>,
    read: Control,
    write: Control,
    reset: Control,
    flags: Vec<Status>,
    analyzer: StatusAnalyzer,
}

impl StatusRegister {
    pub fn new(ctx: &SimCtx, parent: &str, name: &str, bus: Bus<Byte>) -> StatusRegister {
        let path = join_path(parent, name);
        let bits = Rc::new(Cell::new(0u8));

        let handle = |index: u8| StatusBit {
            bits: bits.clone(),
            index,
        };

        // Carry and interrupt-disable are the software-controlled flags;
        // everything else is written by hardware only.
        let flags = STATUS_BITS
            .iter()
            .map(|info| {
                let software = matches!(info.name, "carry" | "interrupt_disable");
                Status::new(ctx, &path, info.name, handle(info.bit), software)
            })
            .collect();

        StatusRegister {
            read: Control::new(ctx, join_path(&path, "read"), TickPhase::Read),
            write: Control::new(ctx, join_path(&path, "write"), TickPhase::Write),
            reset: Control::new(ctx, join_path(&path, "reset"), TickPhase::Process),
            analyzer: StatusAnalyzer::new(
                ctx,
                &path,
                "analyzer",
                bus.clone(),
                handle(1),
                handle(7),
            ),
            path,
            bits,
            bus,
            flags,
        }
    }

    pub fn value(&self) -> Byte {
        Byte(self.bits.get())
    }

    pub fn set_value(&mut self, value: Byte) {
        self.bits.set(value.0);
    }

    /// Handle to a named flag, if it exists
    pub fn bit(&self, name: &str) -> Option<StatusBit> {
        STATUS_BITS
            .iter()
            .find(|info| info.name == name)
            .map(|info| StatusBit {
                bits: self.bits.clone(),
                index: info.bit,
            })
    }

    pub fn negative(&self) -> StatusBit {
        self.bit("negative").unwrap()
    }

    pub fn overflow(&self) -> StatusBit {
        self.bit("overflow").unwrap()
    }

    pub fn interrupt_disable(&self) -> StatusBit {
        self.bit("interrupt_disable").unwrap()
    }

    pub fn zero(&self) -> StatusBit {
        self.bit("zero").unwrap()
    }

    pub fn carry(&self) -> StatusBit {
        self.bit("carry").unwrap()
    }
}

impl Component for StatusRegister {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.read);
        f(&mut self.write);
        f(&mut self.reset);
        for flag in &mut self.flags {
            f(flag);
        }
        // The analyzer ticks after the bit children.
        f(&mut self.analyzer);
    }

    fn tick_write(&mut self) {
        if self.write.is_asserted() {
            self.bus.write(Byte(self.bits.get()), &self.path);
        }
    }

    fn tick_read(&mut self) {
        self.for_each_child(&mut |child| child.tick_read());
        if self.read.is_asserted() {
            let value = self.bus.read(&self.path);
            self.bits.set(value.0);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if self.reset.is_asserted() {
            self.bits.set(0);
        }
    }
}
