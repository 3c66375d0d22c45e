//! Shared test rig: hand-assembled ROMs running on a default CPU

use irata2_core::{Byte, Word};
use irata2_hdl::Cpu as HdlCpu;
use irata2_sim::memory::RegionSpec;
use irata2_sim::Cpu;

pub const ENTRY: Word = Word(0x8000);

/// Build a CPU with the default memory map, the given ROM image at the
/// entry point, and extra MMIO regions
pub fn boot_with(rom: &[u8], extra_regions: Vec<RegionSpec>) -> Cpu {
    let hdl = HdlCpu::new().expect("descriptor builds");
    let program = irata2_microcode::irata::compile(&hdl).expect("microcode compiles");
    let rom: Vec<Byte> = rom.iter().map(|b| Byte(*b)).collect();
    let mut cpu = Cpu::new(&hdl, &program, rom, extra_regions).expect("cpu builds");
    cpu.reset(ENTRY);
    cpu
}

pub fn boot(rom: &[u8]) -> Cpu {
    boot_with(rom, Vec::new())
}

/// A ROM image with code placed at image offsets (absolute address minus
/// 0x8000)
pub struct RomImage {
    bytes: Vec<u8>,
}

impl RomImage {
    pub fn new() -> RomImage {
        RomImage {
            bytes: vec![0xFF; 0x8000],
        }
    }

    pub fn place(mut self, address: u16, code: &[u8]) -> RomImage {
        let offset = usize::from(address - 0x8000);
        self.bytes[offset..offset + code.len()].copy_from_slice(code);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
