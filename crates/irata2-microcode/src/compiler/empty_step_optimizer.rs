//! Deletes steps with no controls

use crate::compiler::Pass;
use crate::error::MicrocodeError;
use crate::ir::{InstructionSet, Step};

/// A step with no controls burns a tick doing nothing; drop it. Applies to
/// the preamble and every variant.
pub struct EmptyStepOptimizer;

fn remove_empty(steps: &mut Vec<Step>) {
    steps.retain(|step| !step.controls.is_empty());
}

impl Pass for EmptyStepOptimizer {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        remove_empty(&mut instruction_set.fetch_preamble);

        for instruction in &mut instruction_set.instructions {
            for variant in &mut instruction.variants {
                remove_empty(&mut variant.steps);
            }
        }
        Ok(())
    }
}
