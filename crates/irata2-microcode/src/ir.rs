//! Declarative microcode intermediate representation
//!
//! The IR refers to controls by [`ControlId`] into the HDL catalog, so an
//! instruction set is a plain value with no ties to any live CPU.

use std::collections::BTreeMap;

use irata2_hdl::ControlId;
use irata2_isa::Opcode;
use smallvec::SmallVec;

/// Controls asserted together during one tick, tagged with a stage number
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub stage: u32,
    pub controls: SmallVec<[ControlId; 8]>,
}

impl Step {
    pub fn new(stage: u32, controls: impl IntoIterator<Item = ControlId>) -> Step {
        Step {
            stage,
            controls: controls.into_iter().collect(),
        }
    }

    pub fn contains(&self, control: ControlId) -> bool {
        self.controls.contains(&control)
    }
}

/// One status-conditioned branch of an instruction
///
/// `status_conditions` holds at most one flag-name -> value entry; an empty
/// map means the variant applies unconditionally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstructionVariant {
    pub status_conditions: BTreeMap<String, bool>,
    pub steps: Vec<Step>,
}

impl InstructionVariant {
    pub fn unconditional(steps: Vec<Step>) -> InstructionVariant {
        InstructionVariant {
            status_conditions: BTreeMap::new(),
            steps,
        }
    }

    pub fn conditional(flag: &str, value: bool, steps: Vec<Step>) -> InstructionVariant {
        let mut status_conditions = BTreeMap::new();
        status_conditions.insert(flag.to_string(), value);
        InstructionVariant {
            status_conditions,
            steps,
        }
    }
}

/// Microcode for one ISA opcode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub variants: Vec<InstructionVariant>,
}

impl Instruction {
    pub fn new(opcode: Opcode, variants: Vec<InstructionVariant>) -> Instruction {
        Instruction { opcode, variants }
    }
}

/// Complete instruction set: the shared fetch preamble plus per-opcode
/// microcode
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstructionSet {
    pub fetch_preamble: Vec<Step>,
    pub instructions: Vec<Instruction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_contains() {
        let step = Step::new(0, [ControlId(3), ControlId(7)]);
        assert!(step.contains(ControlId(3)));
        assert!(!step.contains(ControlId(4)));
    }

    #[test]
    fn test_conditional_variant() {
        let variant = InstructionVariant::conditional("zero", true, Vec::new());
        assert_eq!(variant.status_conditions.len(), 1);
        assert_eq!(variant.status_conditions.get("zero"), Some(&true));
    }
}
