//! Control-path encoder: one bit per control

use irata2_hdl::{Catalog, ControlId};
use smallvec::SmallVec;

use crate::error::MicrocodeError;

/// Encodes control sets into 64-bit control words and back.
///
/// Bit positions follow the sorted catalog, so a [`ControlId`] is its own
/// bit index. The catalog enforces the 64-entry limit at construction.
#[derive(Clone, Debug)]
pub struct ControlEncoder {
    catalog: Catalog,
}

impl ControlEncoder {
    pub fn new(catalog: Catalog) -> ControlEncoder {
        ControlEncoder { catalog }
    }

    /// Number of encodable controls
    pub fn control_count(&self) -> usize {
        self.catalog.len()
    }

    /// Sorted control paths, in bit order
    pub fn control_paths(&self) -> Vec<String> {
        self.catalog.paths()
    }

    /// OR-combine the controls into a control word
    pub fn encode(&self, controls: &[ControlId]) -> u64 {
        let mut word = 0u64;
        for control in controls {
            debug_assert!(control.index() < self.catalog.len());
            word |= control.bit();
        }
        word
    }

    /// Recover the control set from a control word.
    ///
    /// Bits beyond the catalog are rejected; they would reference controls
    /// that do not exist.
    pub fn decode(&self, word: u64) -> Result<SmallVec<[ControlId; 8]>, MicrocodeError> {
        let count = self.catalog.len();
        if count < 64 && (word >> count) != 0 {
            return Err(MicrocodeError::ControlWordOverflow {
                word,
                controls: count,
            });
        }

        let mut controls = SmallVec::new();
        for i in 0..count {
            if (word >> i) & 1 == 1 {
                controls.push(ControlId(i as u8));
            }
        }
        Ok(controls)
    }
}
