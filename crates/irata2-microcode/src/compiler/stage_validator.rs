//! Stage numbering validation

use std::collections::BTreeSet;

use crate::compiler::Pass;
use crate::error::{Location, MicrocodeError};
use crate::ir::{InstructionSet, Step};

/// Stages must start at 0, be monotonically non-decreasing across steps,
/// and dense (no gaps). Applies to the fetch preamble and every variant.
pub struct StageValidator;

fn validate_steps(steps: &[Step], location: Location) -> Result<(), MicrocodeError> {
    if steps.is_empty() {
        return Ok(());
    }

    if steps[0].stage != 0 {
        return Err(MicrocodeError::StageNotZeroBased {
            location,
            stage: steps[0].stage,
        });
    }

    let mut previous = 0;
    for (i, step) in steps.iter().enumerate() {
        if step.stage < previous {
            return Err(MicrocodeError::StageNotMonotonic {
                location,
                step: i,
                stage: step.stage,
                previous,
            });
        }
        previous = step.stage;
    }

    let stages: BTreeSet<u32> = steps.iter().map(|step| step.stage).collect();
    for (expected, found) in stages.iter().enumerate() {
        if *found != expected as u32 {
            return Err(MicrocodeError::StageGap {
                location,
                expected: expected as u32,
                found: *found,
            });
        }
    }

    Ok(())
}

impl Pass for StageValidator {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        validate_steps(&instruction_set.fetch_preamble, Location::FetchPreamble)?;

        for instruction in &instruction_set.instructions {
            let location = Location::Opcode(instruction.opcode.value());
            for variant in &instruction.variants {
                validate_steps(&variant.steps, location)?;
            }
        }
        Ok(())
    }
}
