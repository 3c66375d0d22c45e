//! Collapses runs of identical adjacent steps

use crate::compiler::Pass;
use crate::error::MicrocodeError;
use crate::ir::{InstructionSet, Step};

/// Adjacent steps with the same stage and the same control list execute
/// identically, so a run of them collapses to one step. Non-adjacent
/// duplicates are intentional (the instruction really repeats the work)
/// and are preserved.
pub struct DuplicateStepOptimizer;

fn dedup_adjacent(steps: &mut Vec<Step>) {
    steps.dedup_by(|b, a| a.stage == b.stage && a.controls == b.controls);
}

impl Pass for DuplicateStepOptimizer {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        dedup_adjacent(&mut instruction_set.fetch_preamble);

        for instruction in &mut instruction_set.instructions {
            for variant in &mut instruction.variants {
                dedup_adjacent(&mut variant.steps);
            }
        }
        Ok(())
    }
}
