//! Phase consistency validation
//!
//! A control's path names its operation; the operation implies the tick
//! phase the control must be bound to. A `.read` suffix that is not a
//! Read-phase control (or the equivalent for writes and process
//! operations) means the descriptor and the datapath disagree.

use irata2_core::TickPhase;
use irata2_hdl::Catalog;

use crate::compiler::Pass;
use crate::error::{Location, MicrocodeError};
use crate::ir::{InstructionSet, Step};

pub struct PhaseOrderingValidator {
    catalog: Catalog,
}

const PROCESS_OPERATIONS: [&str; 6] = [
    "increment",
    "decrement",
    "set",
    "clear",
    "latch",
    "reset",
];

fn expected_phase(path: &str) -> Option<(&'static str, TickPhase)> {
    let operation = path.rsplit('.').next().unwrap_or(path);
    if operation == "read" {
        return Some(("read", TickPhase::Read));
    }
    if operation == "write" {
        return Some(("write", TickPhase::Write));
    }
    if PROCESS_OPERATIONS.contains(&operation) {
        return Some(("process", TickPhase::Process));
    }
    None
}

impl PhaseOrderingValidator {
    pub fn new(catalog: Catalog) -> PhaseOrderingValidator {
        PhaseOrderingValidator { catalog }
    }

    fn validate_step(
        &self,
        step: &Step,
        location: Location,
        step_index: usize,
    ) -> Result<(), MicrocodeError> {
        for control in &step.controls {
            let info = self.catalog.info(*control);
            if let Some((kind, expected)) = expected_phase(&info.path) {
                if info.phase != expected {
                    return Err(MicrocodeError::PhaseMismatch {
                        kind,
                        path: info.path.clone(),
                        location,
                        step: step_index,
                        actual: info.phase.to_string(),
                        expected: expected.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Pass for PhaseOrderingValidator {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        for (i, step) in instruction_set.fetch_preamble.iter().enumerate() {
            self.validate_step(step, Location::FetchPreamble, i)?;
        }

        for instruction in &instruction_set.instructions {
            let location = Location::Opcode(instruction.opcode.value());
            for variant in &instruction.variants {
                for (i, step) in variant.steps.iter().enumerate() {
                    self.validate_step(step, location, i)?;
                }
            }
        }
        Ok(())
    }
}
