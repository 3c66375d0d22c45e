//! Status coverage validation

use std::collections::BTreeSet;

use crate::compiler::Pass;
use crate::encoder::StatusEncoder;
use crate::error::{Location, MicrocodeError};
use crate::ir::InstructionSet;

/// Each variant may condition on at most one status flag, and across all
/// variants of an instruction the expanded status bytes must exactly
/// partition the status space: no overlaps, no gaps. Instructions with
/// zero variants or a single unconditional variant pass trivially.
pub struct StatusValidator {
    status_encoder: StatusEncoder,
}

impl StatusValidator {
    pub fn new(status_encoder: StatusEncoder) -> StatusValidator {
        StatusValidator { status_encoder }
    }
}

impl Pass for StatusValidator {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        let total = 1usize << self.status_encoder.bits().len();

        for instruction in &instruction_set.instructions {
            let location = Location::Opcode(instruction.opcode.value());

            if instruction.variants.is_empty() {
                continue;
            }
            if instruction.variants.len() == 1
                && instruction.variants[0].status_conditions.is_empty()
            {
                continue;
            }

            let mut covered = BTreeSet::new();
            for variant in &instruction.variants {
                if variant.status_conditions.len() > 1 {
                    let names = variant
                        .status_conditions
                        .iter()
                        .map(|(name, value)| format!("{name}={value}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    return Err(MicrocodeError::MultipleStatusConditions { location, names });
                }

                for status in self
                    .status_encoder
                    .expand_partial(&variant.status_conditions)?
                {
                    if !covered.insert(status) {
                        return Err(MicrocodeError::OverlappingStatusCoverage {
                            location,
                            status,
                        });
                    }
                }
            }

            if covered.len() != total {
                return Err(MicrocodeError::IncompleteStatusCoverage {
                    location,
                    covered: covered.len(),
                    total,
                });
            }
        }
        Ok(())
    }
}
