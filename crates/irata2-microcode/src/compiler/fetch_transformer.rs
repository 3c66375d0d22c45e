//! Prepends the shared fetch preamble to every instruction variant

use crate::compiler::Pass;
use crate::error::MicrocodeError;
use crate::ir::InstructionSet;

/// Bumps every variant step's stage by one and prepends the fetch
/// preamble at stage 0. Variants without steps are left untouched, as is
/// everything when the preamble itself is empty.
pub struct FetchTransformer;

impl Pass for FetchTransformer {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        if instruction_set.fetch_preamble.is_empty() {
            return Ok(());
        }

        for instruction in &mut instruction_set.instructions {
            for variant in &mut instruction.variants {
                if variant.steps.is_empty() {
                    continue;
                }
                for step in &mut variant.steps {
                    step.stage += 1;
                }

                let mut prefixed = instruction_set.fetch_preamble.clone();
                prefixed.append(&mut variant.steps);
                variant.steps = prefixed;
            }
        }
        Ok(())
    }
}
