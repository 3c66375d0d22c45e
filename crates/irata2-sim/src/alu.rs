//! Arithmetic logic unit
//!
//! Two operand latches and a result latch on the data bus, with a 4-bit
//! binary operation code formed from process controls. Operation 0 is a
//! no-op; unknown operations are silently ignored. ADD and SUB fold the
//! carry flag in and write carry (and, for ADD, overflow) back to the
//! shared status register.

use irata2_core::{Byte, TickPhase};

use crate::bus::Bus;
use crate::component::{join_path, Component, SimCtx};
use crate::control::Control;
use crate::status::StatusBit;

const OP_ADD: u8 = 0x1;
const OP_SUB: u8 = 0x2;
const OP_INC: u8 = 0x3;

pub struct Alu {
    path: String,
    lhs_path: String,
    rhs_path: String,
    result_path: String,
    lhs: Byte,
    rhs: Byte,
    result: Byte,
    data_bus: Bus<Byte>,
    lhs_read: Control,
    rhs_read: Control,
    rhs_reset: Control,
    result_write: Control,
    opcode_bits: [Control; 4],
    carry: StatusBit,
    overflow: StatusBit,
}

impl Alu {
    pub fn new(
        ctx: &SimCtx,
        parent: &str,
        name: &str,
        data_bus: Bus<Byte>,
        carry: StatusBit,
        overflow: StatusBit,
    ) -> Alu {
        let path = join_path(parent, name);
        let lhs_path = join_path(&path, "lhs");
        let rhs_path = join_path(&path, "rhs");
        let result_path = join_path(&path, "result");
        Alu {
            lhs_read: Control::new(ctx, join_path(&lhs_path, "read"), TickPhase::Read),
            rhs_read: Control::new(ctx, join_path(&rhs_path, "read"), TickPhase::Read),
            rhs_reset: Control::new(ctx, join_path(&rhs_path, "reset"), TickPhase::Process),
            result_write: Control::new(ctx, join_path(&result_path, "write"), TickPhase::Write),
            opcode_bits: [
                Control::new(ctx, join_path(&path, "opcode_bit_0"), TickPhase::Process),
                Control::new(ctx, join_path(&path, "opcode_bit_1"), TickPhase::Process),
                Control::new(ctx, join_path(&path, "opcode_bit_2"), TickPhase::Process),
                Control::new(ctx, join_path(&path, "opcode_bit_3"), TickPhase::Process),
            ],
            path,
            lhs_path,
            rhs_path,
            result_path,
            lhs: Byte::ZERO,
            rhs: Byte::ZERO,
            result: Byte::ZERO,
            data_bus,
            carry,
            overflow,
        }
    }

    pub fn lhs(&self) -> Byte {
        self.lhs
    }

    pub fn rhs(&self) -> Byte {
        self.rhs
    }

    pub fn result(&self) -> Byte {
        self.result
    }

    pub fn set_lhs(&mut self, value: Byte) {
        self.lhs = value;
    }

    pub fn set_rhs(&mut self, value: Byte) {
        self.rhs = value;
    }

    fn opcode(&self) -> u8 {
        let mut opcode = 0u8;
        for (i, bit) in self.opcode_bits.iter().enumerate() {
            if bit.is_asserted() {
                opcode |= 1 << i;
            }
        }
        opcode
    }

    fn execute(&mut self, opcode: u8) {
        let lhs = u16::from(self.lhs.0);
        let rhs = u16::from(self.rhs.0);

        match opcode {
            OP_ADD => {
                let carry_in = u16::from(self.carry.get());
                let sum = lhs + rhs + carry_in;
                self.result = Byte((sum & 0xFF) as u8);
                self.carry.set(sum > 0xFF);

                // Signed overflow: both operands share a sign the result
                // does not.
                let lhs_sign = lhs & 0x80 != 0;
                let rhs_sign = rhs & 0x80 != 0;
                let result_sign = sum & 0x80 != 0;
                self.overflow.set(lhs_sign == rhs_sign && lhs_sign != result_sign);
            }
            OP_SUB => {
                let borrow = u16::from(!self.carry.get());
                let subtrahend = rhs + borrow;
                self.result = Byte(lhs.wrapping_sub(subtrahend) as u8);
                self.carry.set(lhs >= subtrahend);
            }
            OP_INC => {
                // Does not touch carry or overflow.
                self.result = self.lhs + Byte(1);
            }
            _ => {}
        }
    }
}

impl Component for Alu {
    fn path(&self) -> &str {
        &self.path
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Component)) {
        f(&mut self.lhs_read);
        f(&mut self.rhs_read);
        f(&mut self.rhs_reset);
        f(&mut self.result_write);
        for bit in &mut self.opcode_bits {
            f(bit);
        }
    }

    fn tick_write(&mut self) {
        if self.result_write.is_asserted() {
            self.data_bus.write(self.result, &self.result_path);
        }
    }

    fn tick_read(&mut self) {
        if self.lhs_read.is_asserted() {
            self.lhs = self.data_bus.read(&self.lhs_path);
        }
        if self.rhs_read.is_asserted() {
            self.rhs = self.data_bus.read(&self.rhs_path);
        }
    }

    fn tick_process(&mut self) {
        self.for_each_child(&mut |child| child.tick_process());
        if self.rhs_reset.is_asserted() {
            self.rhs = Byte::ZERO;
        }
        let opcode = self.opcode();
        if opcode != 0 {
            self.execute(opcode);
        }
    }
}
