//! Declarative description of the IRATA2 CPU datapath
//!
//! One entry per control line the microcode can assert. The simulator
//! builds its live component tree to this exact shape and cross-checks the
//! resulting paths at construction, so the catalog here is the single
//! source of truth for control identity.

use irata2_core::TickPhase;

use crate::catalog::{Catalog, ControlId, ControlInfo};
use crate::HdlError;

/// One named status flag and its bit position in the status register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusBitInfo {
    pub name: &'static str,
    pub bit: u8,
}

/// Status register layout, bit 7 down to bit 0
pub const STATUS_BITS: [StatusBitInfo; 8] = [
    StatusBitInfo { name: "negative", bit: 7 },
    StatusBitInfo { name: "overflow", bit: 6 },
    StatusBitInfo { name: "unused", bit: 5 },
    StatusBitInfo { name: "break", bit: 4 },
    StatusBitInfo { name: "decimal", bit: 3 },
    StatusBitInfo { name: "interrupt_disable", bit: 2 },
    StatusBitInfo { name: "zero", bit: 1 },
    StatusBitInfo { name: "carry", bit: 0 },
];

/// Structural CPU descriptor: the control catalog plus status layout
#[derive(Clone, Debug)]
pub struct Cpu {
    catalog: Catalog,
}

struct Decl {
    controls: Vec<ControlInfo>,
}

impl Decl {
    fn new() -> Decl {
        Decl {
            controls: Vec::new(),
        }
    }

    fn control(&mut self, path: &str, phase: TickPhase, auto_reset: bool) {
        self.controls.push(ControlInfo {
            phase,
            auto_reset,
            path: path.to_string(),
        });
    }

    /// Auto-reset control observed during Process phase
    fn process(&mut self, path: &str) {
        self.control(path, TickPhase::Process, true);
    }

    /// Latched control observed during Process phase
    fn latched_process(&mut self, path: &str) {
        self.control(path, TickPhase::Process, false);
    }

    /// Bus write port (component drives the bus)
    fn write_port(&mut self, path: &str) {
        self.control(&format!("{path}.write"), TickPhase::Write, true);
    }

    /// Bus read port (component latches from the bus)
    fn read_port(&mut self, path: &str) {
        self.control(&format!("{path}.read"), TickPhase::Read, true);
    }

    /// Standard bus-connected register: read, write, reset
    fn bus_register(&mut self, path: &str) {
        self.read_port(path);
        self.write_port(path);
        self.process(&format!("{path}.reset"));
    }
}

impl Cpu {
    /// Build the canonical IRATA2 datapath descriptor.
    pub fn new() -> Result<Cpu, HdlError> {
        let mut d = Decl::new();

        // Root controls
        d.process("halt");
        d.process("crash");
        d.latched_process("irq_line");

        // General-purpose registers on the data bus
        d.bus_register("a");
        d.bus_register("x");
        d.bus_register("y");

        // Stack pointer
        d.bus_register("sp");
        d.process("sp.increment");
        d.process("sp.decrement");

        // Operand-assembly register: drives the address bus, loaded
        // bytewise from the data bus
        d.write_port("tmp");
        d.read_port("tmp.low");
        d.read_port("tmp.high");

        // ALU: operand latches, result latch, binary-encoded opcode
        d.read_port("alu.lhs");
        d.read_port("alu.rhs");
        d.process("alu.rhs.reset");
        d.write_port("alu.result");
        d.process("alu.opcode_bit_0");
        d.process("alu.opcode_bit_1");
        d.process("alu.opcode_bit_2");
        d.process("alu.opcode_bit_3");

        // Controller: IR, step counter, instruction-start pulse, IPC
        d.read_port("controller.ir");
        d.process("controller.sc.increment");
        d.process("controller.sc.reset");
        d.process("controller.instruction_start");
        d.process("controller.ipc.latch");
        d.write_port("controller.ipc.low");
        d.write_port("controller.ipc.high");

        // Program counter: word counter on the address bus with byte
        // ports and a signed branch-offset latch on the data bus
        d.bus_register("pc");
        d.process("pc.increment");
        d.process("pc.add_signed_offset");
        d.read_port("pc.low");
        d.write_port("pc.low");
        d.read_port("pc.high");
        d.write_port("pc.high");
        d.read_port("pc.signed_offset");

        // Status register and the software-controlled flags
        d.bus_register("status");
        d.process("status.carry.set");
        d.process("status.carry.clear");
        d.process("status.interrupt_disable.set");
        d.process("status.interrupt_disable.clear");
        d.read_port("status.analyzer");

        // Memory data ports and the MAR
        d.read_port("memory");
        d.write_port("memory");
        d.read_port("memory.mar");
        d.read_port("memory.mar.low");
        d.process("memory.mar.high.reset");
        d.read_port("memory.mar.offset");
        d.process("memory.mar.increment");
        d.process("memory.mar.add_offset");
        d.process("memory.mar.stack_page");
        d.process("memory.mar.irq_vector");

        let catalog = Catalog::new(d.controls)?;
        Ok(Cpu { catalog })
    }

    /// The sorted control catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Status flag layout
    pub fn status_bits(&self) -> &'static [StatusBitInfo] {
        &STATUS_BITS
    }

    /// Convenience accessor used by the microcode sequence passes
    pub fn sc_increment(&self) -> ControlId {
        self.catalog
            .find("controller.sc.increment")
            .expect("descriptor always declares the step counter")
    }

    /// Convenience accessor used by the microcode sequence passes
    pub fn sc_reset(&self) -> ControlId {
        self.catalog
            .find("controller.sc.reset")
            .expect("descriptor always declares the step counter")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_fits_control_word() {
        let cpu = Cpu::new().unwrap();
        assert!(cpu.catalog().len() <= 64, "catalog: {}", cpu.catalog().len());
    }

    #[test]
    fn test_catalog_is_sorted() {
        let cpu = Cpu::new().unwrap();
        let paths = cpu.catalog().paths();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_fetch_preamble_controls_exist() {
        let cpu = Cpu::new().unwrap();
        for path in [
            "pc.write",
            "memory.mar.read",
            "memory.write",
            "controller.ir.read",
            "pc.increment",
            "controller.instruction_start",
        ] {
            assert!(cpu.catalog().find(path).is_some(), "missing {path}");
        }
    }

    #[test]
    fn test_control_phases() {
        let cpu = Cpu::new().unwrap();
        let catalog = cpu.catalog();

        let write = catalog.find("pc.write").unwrap();
        assert_eq!(catalog.info(write).phase, TickPhase::Write);

        let read = catalog.find("memory.mar.read").unwrap();
        assert_eq!(catalog.info(read).phase, TickPhase::Read);

        let halt = catalog.find("halt").unwrap();
        assert_eq!(catalog.info(halt).phase, TickPhase::Process);
        assert!(catalog.info(halt).auto_reset);

        let irq = catalog.find("irq_line").unwrap();
        assert!(!catalog.info(irq).auto_reset);
    }

    #[test]
    fn test_status_bit_layout() {
        assert_eq!(STATUS_BITS[0].name, "negative");
        assert_eq!(STATUS_BITS[0].bit, 7);
        assert_eq!(STATUS_BITS[7].name, "carry");
        assert_eq!(STATUS_BITS[7].bit, 0);
    }

    #[test]
    fn test_sequence_accessors() {
        let cpu = Cpu::new().unwrap();
        assert_ne!(cpu.sc_increment(), cpu.sc_reset());
    }
}
