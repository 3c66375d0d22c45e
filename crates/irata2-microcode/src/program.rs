//! Compiled microcode program
//!
//! The output of the compiler is a standalone value: a sorted control-path
//! list (bit index = list index), the status-bit layout, and the packed
//! opcode x step x status lookup table. Nothing here borrows from the CPU;
//! the simulator's instruction memory re-binds the paths to live controls
//! at load time.

use std::collections::HashMap;

/// Unpacked lookup key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MicrocodeKey {
    pub opcode: u8,
    pub step: u8,
    pub status: u8,
}

impl MicrocodeKey {
    pub fn new(opcode: u8, step: u8, status: u8) -> MicrocodeKey {
        MicrocodeKey {
            opcode,
            step,
            status,
        }
    }

    /// Pack into the 32-bit table key: three byte fields, no byte-order
    /// assumption
    pub fn encode(self) -> u32 {
        (u32::from(self.opcode) << 16) | (u32::from(self.step) << 8) | u32::from(self.status)
    }

    /// Unpack a 32-bit table key
    pub fn decode(encoded: u32) -> MicrocodeKey {
        MicrocodeKey {
            opcode: ((encoded >> 16) & 0xFF) as u8,
            step: ((encoded >> 8) & 0xFF) as u8,
            status: (encoded & 0xFF) as u8,
        }
    }
}

/// One named status flag and its bit position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusBitDef {
    pub name: String,
    pub bit: u8,
}

/// Compiled microcode: control order, status layout, and lookup table
#[derive(Clone, Debug, Default)]
pub struct MicrocodeProgram {
    /// Sorted control paths; a control's index is its control-word bit
    pub control_paths: Vec<String>,
    /// Status flags that participate in conditional dispatch
    pub status_bits: Vec<StatusBitDef>,
    /// Packed key -> 64-bit control word
    pub table: HashMap<u32, u64>,
}

impl MicrocodeProgram {
    /// Highest step index present for any opcode, plus one
    pub fn step_count(&self) -> usize {
        self.table
            .keys()
            .map(|key| MicrocodeKey::decode(*key).step as usize + 1)
            .max()
            .unwrap_or(0)
    }

    /// Highest opcode present, plus one
    pub fn opcode_count(&self) -> usize {
        self.table
            .keys()
            .map(|key| MicrocodeKey::decode(*key).opcode as usize + 1)
            .max()
            .unwrap_or(0)
    }
}
