//! Verifies that every variant begins with the fetch preamble

use crate::compiler::Pass;
use crate::error::{Location, MicrocodeError};
use crate::ir::InstructionSet;

/// After the fetch transform, the stage-0 steps of every non-empty variant
/// must be exactly the preamble.
pub struct FetchValidator;

impl Pass for FetchValidator {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        if instruction_set.fetch_preamble.is_empty() {
            return Ok(());
        }

        for instruction in &instruction_set.instructions {
            let location = Location::Opcode(instruction.opcode.value());
            for variant in &instruction.variants {
                if variant.steps.is_empty() {
                    continue;
                }

                let stage_zero: Vec<_> = variant
                    .steps
                    .iter()
                    .filter(|step| step.stage == 0)
                    .collect();

                if stage_zero.len() != instruction_set.fetch_preamble.len() {
                    return Err(MicrocodeError::FetchPreambleMismatch { location, step: 0 });
                }

                for (i, (found, expected)) in stage_zero
                    .iter()
                    .zip(&instruction_set.fetch_preamble)
                    .enumerate()
                {
                    if found.controls != expected.controls {
                        return Err(MicrocodeError::FetchPreambleMismatch { location, step: i });
                    }
                }
            }
        }
        Ok(())
    }
}
