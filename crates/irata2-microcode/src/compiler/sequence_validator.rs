//! Re-checks the step-counter invariants established by the transformer

use irata2_hdl::ControlId;

use crate::compiler::Pass;
use crate::error::{Location, MicrocodeError};
use crate::ir::InstructionSet;

/// Every non-last step must carry the increment control and every last
/// step the reset control. Runs as part of the full validator suite so the
/// optimizers cannot silently drop sequencing.
pub struct SequenceValidator {
    increment: ControlId,
    reset: ControlId,
}

impl SequenceValidator {
    pub fn new(increment: ControlId, reset: ControlId) -> SequenceValidator {
        SequenceValidator { increment, reset }
    }
}

impl Pass for SequenceValidator {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        for instruction in &instruction_set.instructions {
            let location = Location::Opcode(instruction.opcode.value());
            for variant in &instruction.variants {
                let step_count = variant.steps.len();
                for (i, step) in variant.steps.iter().enumerate() {
                    let is_last = i + 1 == step_count;
                    let expected = if is_last { self.reset } else { self.increment };
                    if !step.contains(expected) {
                        return Err(MicrocodeError::MissingSequenceControl { location, step: i });
                    }
                }
            }
        }
        Ok(())
    }
}
