//! Merges adjacent steps whose phases cannot interact

use irata2_core::TickPhase;
use irata2_hdl::Catalog;

use crate::compiler::Pass;
use crate::error::MicrocodeError;
use crate::ir::{InstructionSet, Step};

/// Two adjacent same-stage steps merge when every control of the first
/// completes strictly before any control of the second within one tick:
/// `max_phase(a) < min_phase(b)`. The comparison is strict because two
/// same-phase controls in one tick are not equivalent to the same controls
/// in consecutive ticks. Merging concatenates control lists without
/// duplicates.
pub struct StepMergingOptimizer {
    catalog: Catalog,
}

impl StepMergingOptimizer {
    pub fn new(catalog: Catalog) -> StepMergingOptimizer {
        StepMergingOptimizer { catalog }
    }

    fn max_phase(&self, step: &Step) -> TickPhase {
        step.controls
            .iter()
            .map(|control| self.catalog.info(*control).phase)
            .max()
            .unwrap_or(TickPhase::None)
    }

    fn min_phase(&self, step: &Step) -> TickPhase {
        step.controls
            .iter()
            .map(|control| self.catalog.info(*control).phase)
            .min()
            .unwrap_or(TickPhase::Clear)
    }

    fn can_merge(&self, a: &Step, b: &Step) -> bool {
        if a.stage != b.stage {
            return false;
        }
        if a.controls.is_empty() {
            return true;
        }
        if b.controls.is_empty() {
            return false;
        }
        self.max_phase(a) < self.min_phase(b)
    }

    fn optimize(&self, steps: &mut Vec<Step>) {
        if steps.len() < 2 {
            return;
        }

        let mut optimized: Vec<Step> = Vec::with_capacity(steps.len());
        for step in steps.drain(..) {
            match optimized.last_mut() {
                Some(last) if self.can_merge(last, &step) => {
                    for control in step.controls {
                        if !last.contains(control) {
                            last.controls.push(control);
                        }
                    }
                }
                _ => optimized.push(step),
            }
        }
        *steps = optimized;
    }
}

impl Pass for StepMergingOptimizer {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        self.optimize(&mut instruction_set.fetch_preamble);

        for instruction in &mut instruction_set.instructions {
            for variant in &mut instruction.variants {
                self.optimize(&mut variant.steps);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, InstructionVariant};
    use irata2_hdl::{ControlId, ControlInfo};
    use irata2_isa::Opcode;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            ControlInfo {
                phase: TickPhase::Write,
                auto_reset: true,
                path: "a.write".to_string(),
            },
            ControlInfo {
                phase: TickPhase::Read,
                auto_reset: true,
                path: "b.read".to_string(),
            },
            ControlInfo {
                phase: TickPhase::Process,
                auto_reset: true,
                path: "c.increment".to_string(),
            },
            ControlInfo {
                phase: TickPhase::Process,
                auto_reset: true,
                path: "d.increment".to_string(),
            },
        ])
        .unwrap()
    }

    fn optimize(steps: Vec<Step>) -> Vec<Step> {
        let mut set = InstructionSet {
            fetch_preamble: Vec::new(),
            instructions: vec![Instruction::new(
                Opcode::Nop,
                vec![InstructionVariant::unconditional(steps)],
            )],
        };
        StepMergingOptimizer::new(catalog()).run(&mut set).unwrap();
        set.instructions.remove(0).variants.remove(0).steps
    }

    fn id(catalog: &Catalog, path: &str) -> ControlId {
        catalog.require(path, "test").unwrap()
    }

    #[test]
    fn test_merges_strictly_ordered_phases() {
        let c = catalog();
        // Write, then Read in the next step of the same stage: the write
        // completes before any read of the same tick, so one tick suffices.
        let steps = optimize(vec![
            Step::new(0, [id(&c, "a.write")]),
            Step::new(0, [id(&c, "b.read")]),
        ]);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].controls.len(), 2);
    }

    #[test]
    fn test_same_phase_is_never_merged() {
        let c = catalog();
        // Two Process controls across a tick boundary are not the same as
        // two Process controls in one tick.
        let steps = optimize(vec![
            Step::new(0, [id(&c, "c.increment")]),
            Step::new(0, [id(&c, "d.increment")]),
        ]);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_stage_boundary_blocks_merge() {
        let c = catalog();
        let steps = optimize(vec![
            Step::new(0, [id(&c, "a.write")]),
            Step::new(1, [id(&c, "b.read")]),
        ]);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_merge_deduplicates_controls() {
        let c = catalog();
        let steps = optimize(vec![
            Step::new(0, [id(&c, "a.write")]),
            Step::new(0, [id(&c, "b.read"), id(&c, "b.read")]),
        ]);
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0]
                .controls
                .iter()
                .filter(|x| **x == id(&c, "b.read"))
                .count(),
            1
        );
    }
}
