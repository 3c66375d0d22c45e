//! Rejects contradictory controls on one component within a step

use std::collections::{HashMap, HashSet};

use irata2_hdl::Catalog;

use crate::compiler::Pass;
use crate::error::{Location, MicrocodeError};
use crate::ir::{InstructionSet, Step};

/// No component may simultaneously read and write the bus, set and clear a
/// flag, or increment and decrement within one step. The ALU opcode bits
/// never collide here: they end in `opcode_bit_N`, not in an operation
/// name, because together they form one binary-encoded opcode.
pub struct ControlConflictValidator {
    catalog: Catalog,
}

const CONFLICTS: [(&str, &str); 3] = [
    ("read", "write"),
    ("set", "clear"),
    ("increment", "decrement"),
];

fn split_component(path: &str) -> (&str, &str) {
    match path.rfind('.') {
        Some(dot) => (&path[..dot], &path[dot + 1..]),
        None => (path, ""),
    }
}

impl ControlConflictValidator {
    pub fn new(catalog: Catalog) -> ControlConflictValidator {
        ControlConflictValidator { catalog }
    }

    fn validate_step(
        &self,
        step: &Step,
        location: Location,
        step_index: usize,
    ) -> Result<(), MicrocodeError> {
        let mut operations: HashMap<&str, HashSet<&str>> = HashMap::new();
        for control in &step.controls {
            let (component, operation) = split_component(self.catalog.path(*control));
            operations.entry(component).or_default().insert(operation);
        }

        for (component, ops) in &operations {
            for (first, second) in CONFLICTS {
                if ops.contains(first) && ops.contains(second) {
                    return Err(MicrocodeError::ConflictingControls {
                        component: component.to_string(),
                        first,
                        second,
                        location,
                        step: step_index,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Pass for ControlConflictValidator {
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
