//! Inserts step-counter controls into every variant

use irata2_hdl::ControlId;

use crate::compiler::Pass;
use crate::error::MicrocodeError;
use crate::ir::InstructionSet;

/// Ensures every non-last step increments the step counter and every last
/// step resets it, so the controller advances through an instruction and
/// returns to step 0 at its end. Controls already present are not
/// duplicated.
pub struct SequenceTransformer {
    increment: ControlId,
    reset: ControlId,
}

impl SequenceTransformer {
    pub fn new(increment: ControlId, reset: ControlId) -> SequenceTransformer {
        SequenceTransformer { increment, reset }
    }
}

impl Pass for SequenceTransformer {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        for instruction in &mut instruction_set.instructions {
            for variant in &mut instruction.variants {
                let step_count = variant.steps.len();
                for (i, step) in variant.steps.iter_mut().enumerate() {
                    let is_last = i + 1 == step_count;
                    let control = if is_last { self.reset } else { self.increment };
                    if !step.contains(control) {
                        step.controls.push(control);
                    }
                }
            }
        }
        Ok(())
    }
}
