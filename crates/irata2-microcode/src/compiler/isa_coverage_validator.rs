//! ISA coverage validation

use std::collections::BTreeSet;

use irata2_isa::IsaInfo;

use crate::compiler::Pass;
use crate::error::MicrocodeError;
use crate::ir::InstructionSet;

/// The set of opcodes with microcode must equal the ISA's opcode set:
/// no unknowns, no duplicates, no missing instructions.
pub struct IsaCoverageValidator;

impl Pass for IsaCoverageValidator {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        let expected: BTreeSet<u8> = IsaInfo::opcodes().map(|opcode| opcode.value()).collect();

        let mut seen = BTreeSet::new();
        for instruction in &instruction_set.instructions {
            let opcode = instruction.opcode.value();
            if !expected.contains(&opcode) {
                return Err(MicrocodeError::UnknownOpcode { opcode });
            }
            if !seen.insert(opcode) {
                return Err(MicrocodeError::DuplicateOpcode { opcode });
            }
        }

        if seen.len() != expected.len() {
            return Err(MicrocodeError::MissingOpcodes {
                expected: expected.len(),
                got: seen.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, InstructionVariant};
    use irata2_isa::Opcode;

    fn full_set() -> InstructionSet {
        InstructionSet {
            fetch_preamble: Vec::new(),
            instructions: IsaInfo::opcodes()
                .map(|opcode| {
                    Instruction::new(opcode, vec![InstructionVariant::unconditional(Vec::new())])
                })
                .collect(),
        }
    }

    #[test]
    fn test_accepts_complete_coverage() {
        let mut set = full_set();
        assert!(IsaCoverageValidator.run(&mut set).is_ok());
    }

    #[test]
    fn test_rejects_missing_instruction() {
        let mut set = full_set();
        set.instructions.pop();
        assert!(matches!(
            IsaCoverageValidator.run(&mut set),
            Err(MicrocodeError::MissingOpcodes { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_instruction() {
        let mut set = full_set();
        let duplicate = Instruction::new(
            Opcode::Nop,
            vec![InstructionVariant::unconditional(Vec::new())],
        );
        set.instructions.push(duplicate);
        assert!(matches!(
            IsaCoverageValidator.run(&mut set),
            Err(MicrocodeError::DuplicateOpcode { opcode: 0x01 })
        ));
    }
}
