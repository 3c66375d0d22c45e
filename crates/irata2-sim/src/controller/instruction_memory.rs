//! Instruction memory: compiled microcode burned into ROM
//!
//! Binding a [`MicrocodeProgram`] to a live CPU resolves its control
//! paths against the CPU's sorted catalog (order and size must match
//! exactly) and its status-bit definitions against the status register.
//! The table is burned into a dense ROM laid out opcode-major:
//! `(opcode * steps + step) << 8 | status`. Entries the program omits are
//! zero words, which assert nothing and are legal; lookups beyond the
//! burned extent read as zero words for the same reason.

use indexmap::IndexMap;
use irata2_core::Byte;
use irata2_microcode::{MicrocodeKey, MicrocodeProgram};
use smallvec::SmallVec;

use crate::component::join_path;
use crate::control::Control;
use crate::error::SimError;
use crate::rom_storage::RomStorage;
use crate::status::{StatusBit, StatusRegister};

struct BoundStatusBit {
    bit: StatusBit,
    position: u8,
}

pub struct InstructionMemory {
    path: String,
    controls: Vec<Control>,
    status_bits: Vec<BoundStatusBit>,
    rom: RomStorage<u32, u64>,
    opcode_count: usize,
    step_count: usize,
}

impl InstructionMemory {
    /// Bind a compiled program to the live CPU's controls and status bits
    pub fn new(
        parent: &str,
        name: &str,
        program: &MicrocodeProgram,
        controls_by_path: &IndexMap<String, Control>,
        status: &StatusRegister,
    ) -> Result<InstructionMemory, SimError> {
        let path = join_path(parent, name);

        if program.control_paths.len() != controls_by_path.len() {
            return Err(SimError::ControlTableSize {
                program: program.control_paths.len(),
                cpu: controls_by_path.len(),
            });
        }
        let mut controls = Vec::with_capacity(program.control_paths.len());
        for (bit, (expected, (cpu_path, control))) in program
            .control_paths
            .iter()
            .zip(controls_by_path.iter())
            .enumerate()
        {
            if expected != cpu_path {
                return Err(SimError::ControlOrderMismatch {
                    bit,
                    program: expected.clone(),
                    cpu: cpu_path.clone(),
                });
            }
            controls.push(control.clone());
        }

        let mut status_bits = Vec::with_capacity(program.status_bits.len());
        for def in &program.status_bits {
            let bit = status
                .bit(&def.name)
                .ok_or_else(|| SimError::UnknownStatusBit {
                    name: def.name.clone(),
                })?;
            if bit.bit_index() != def.bit {
                return Err(SimError::StatusBitMismatch {
                    name: def.name.clone(),
                    program: def.bit,
                    cpu: bit.bit_index(),
                });
            }
            status_bits.push(BoundStatusBit {
                bit,
                position: def.bit,
            });
        }

        // Burn the table into a dense ROM sized to the program's extent.
        let opcode_count = program.opcode_count();
        let step_count = program.step_count();
        let mut data = vec![0u64; opcode_count * step_count * 0x100];
        for (encoded_key, control_word) in &program.table {
            let key = MicrocodeKey::decode(*encoded_key);
            let index = ((key.opcode as usize * step_count) + key.step as usize) * 0x100
                + key.status as usize;
            data[index] = *control_word;
        }

        Ok(InstructionMemory {
            rom: RomStorage::new(join_path(&path, "rom"), data),
            path,
            controls,
            status_bits,
            opcode_count,
            step_count,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pack the live status bits into the byte used for dispatch
    pub fn encode_status(&self) -> u8 {
        self.status_bits.iter().fold(0u8, |byte, bound| {
            byte | (u8::from(bound.bit.get()) << bound.position)
        })
    }

    /// Controls to assert for one (opcode, step, status) triple.
    ///
    /// A zero word yields an empty set and is valid. A word with bits
    /// beyond the control table is corrupt and aborts the simulation.
    pub fn lookup(&self, opcode: u8, step: u8, status: u8) -> SmallVec<[Control; 8]> {
        if usize::from(opcode) >= self.opcode_count || usize::from(step) >= self.step_count {
            return SmallVec::new();
        }

        let address = (((opcode as u32) * self.step_count as u32) + step as u32) * 0x100
            + status as u32;
        let word = match self.rom.read(address) {
            Ok(word) => word,
            Err(error) => panic!("{error}"),
        };

        let count = self.controls.len();
        if count < 64 && (word >> count) != 0 {
            panic!(
                "control word sets bits outside control table: {} (opcode 0x{opcode:02X} step {step})",
                self.path
            );
        }

        let mut asserted = SmallVec::new();
        for (i, control) in self.controls.iter().enumerate() {
            if (word >> i) & 1 == 1 {
                asserted.push(control.clone());
            }
        }
        asserted
    }

    /// Observed status byte for a given register value, for diagnostics
    pub fn decode_status(&self, status: Byte) -> u8 {
        status.0
            & self
                .status_bits
                .iter()
                .fold(0u8, |mask, bound| mask | (1 << bound.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use crate::component::SimCtx;
    use indexmap::IndexMap;
    use irata2_core::TickPhase;
    use irata2_microcode::StatusBitDef;

    struct Rig {
        ctx: SimCtx,
        controls_by_path: IndexMap<String, Control>,
        status: StatusRegister,
    }

    fn rig() -> Rig {
        let ctx = SimCtx::new();
        let bus = Bus::new(&ctx, "data_bus".to_string());
        let status = StatusRegister::new(&ctx, "", "status", bus);

        let mut controls_by_path = IndexMap::new();
        for control in ctx.take_controls() {
            controls_by_path.insert(control.info().path.clone(), control);
        }
        controls_by_path.sort_keys();
        Rig {
            ctx,
            controls_by_path,
            status,
        }
    }

    fn program(rig: &Rig) -> MicrocodeProgram {
        let mut program = MicrocodeProgram {
            control_paths: rig.controls_by_path.keys().cloned().collect(),
            status_bits: vec![
                StatusBitDef {
                    name: "zero".to_string(),
                    bit: 1,
                },
                StatusBitDef {
                    name: "carry".to_string(),
                    bit: 0,
                },
            ],
            table: Default::default(),
        };
        // Opcode 1, step 0, any of the four status values: assert the
        // first control.
        for status in 0..4u8 {
            program
                .table
                .insert(MicrocodeKey::new(0x01, 0, status).encode(), 1);
        }
        program
    }

    #[test]
    fn test_binds_and_looks_up() {
        let rig = rig();
        let program = program(&rig);
        let memory = InstructionMemory::new(
            "controller",
            "instruction_memory",
            &program,
            &rig.controls_by_path,
            &rig.status,
        )
        .unwrap();

        let controls = memory.lookup(0x01, 0, 0);
        assert_eq!(controls.len(), 1);
        assert_eq!(
            controls[0].info().path,
            *rig.controls_by_path.keys().next().unwrap()
        );
    }

    #[test]
    fn test_zero_word_is_empty() {
        let rig = rig();
        let program = program(&rig);
        let memory = InstructionMemory::new(
            "controller",
            "instruction_memory",
            &program,
            &rig.controls_by_path,
            &rig.status,
        )
        .unwrap();

        assert!(memory.lookup(0x00, 0, 0).is_empty());
        // Beyond the burned extent also reads as the zero word.
        assert!(memory.lookup(0x7F, 0, 0).is_empty());
        assert!(memory.lookup(0x01, 9, 0).is_empty());
    }

    #[test]
    fn test_rejects_size_mismatch() {
        let rig = rig();
        let mut program = program(&rig);
        program.control_paths.pop();
        let result = InstructionMemory::new(
            "controller",
            "instruction_memory",
            &program,
            &rig.controls_by_path,
            &rig.status,
        );
        assert!(matches!(result, Err(SimError::ControlTableSize { .. })));
    }

    #[test]
    fn test_rejects_order_mismatch() {
        let rig = rig();
        let mut program = program(&rig);
        program.control_paths.swap(0, 1);
        let result = InstructionMemory::new(
            "controller",
            "instruction_memory",
            &program,
            &rig.controls_by_path,
            &rig.status,
        );
        assert!(matches!(result, Err(SimError::ControlOrderMismatch { .. })));
    }

    #[test]
    fn test_rejects_status_bit_mismatch() {
        let rig = rig();
        let mut program = program(&rig);
        program.status_bits[0].bit = 5;
        let result = InstructionMemory::new(
            "controller",
            "instruction_memory",
            &program,
            &rig.controls_by_path,
            &rig.status,
        );
        assert!(matches!(result, Err(SimError::StatusBitMismatch { .. })));
    }

    #[test]
    fn test_encode_status_uses_declared_positions() {
        let rig = rig();
        let program = program(&rig);
        let memory = InstructionMemory::new(
            "controller",
            "instruction_memory",
            &program,
            &rig.controls_by_path,
            &rig.status,
        )
        .unwrap();

        rig.status.zero().set(true);
        // Negative is not a declared dispatch bit in this program.
        rig.status.negative().set(true);
        assert_eq!(memory.encode_status(), 0b0000_0010);
    }

    #[test]
    #[should_panic(expected = "control word sets bits outside control table")]
    fn test_overflow_bits_panic() {
        let rig = rig();
        let mut program = program(&rig);
        let bad = 1u64 << rig.controls_by_path.len();
        program
            .table
            .insert(MicrocodeKey::new(0x01, 1, 0).encode(), bad);
        let memory = InstructionMemory::new(
            "controller",
            "instruction_memory",
            &program,
            &rig.controls_by_path,
            &rig.status,
        )
        .unwrap();
        memory.lookup(0x01, 1, 0);
    }

    #[test]
    fn test_asserted_controls_are_live() {
        let rig = rig();
        let program = program(&rig);
        let memory = InstructionMemory::new(
            "controller",
            "instruction_memory",
            &program,
            &rig.controls_by_path,
            &rig.status,
        )
        .unwrap();

        rig.ctx.set_phase(TickPhase::Control);
        for control in memory.lookup(0x01, 0, 0) {
            control.assert();
        }
        let bound_phase = rig.controls_by_path.values().next().unwrap().info().phase;
        rig.ctx.set_phase(bound_phase);
        assert!(rig.controls_by_path.values().next().unwrap().is_asserted());
    }
}
