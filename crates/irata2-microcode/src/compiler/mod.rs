//! Microcode compiler pipeline
//!
//! The pipeline runs in a fixed order: fetch and sequence transforms, the
//! full validator suite, then each optimizer followed by the full suite
//! again so the IR is never allowed to drift out of its invariants, and
//! finally encoding into the output table.

pub mod bus_validator;
pub mod control_conflict_validator;
pub mod duplicate_step_optimizer;
pub mod empty_step_optimizer;
pub mod fetch_transformer;
pub mod fetch_validator;
pub mod isa_coverage_validator;
pub mod phase_ordering_validator;
pub mod sequence_transformer;
pub mod sequence_validator;
pub mod stage_validator;
pub mod status_validator;
pub mod step_merging_optimizer;

pub use bus_validator::BusValidator;
pub use control_conflict_validator::ControlConflictValidator;
pub use duplicate_step_optimizer::DuplicateStepOptimizer;
pub use empty_step_optimizer::EmptyStepOptimizer;
pub use fetch_transformer::FetchTransformer;
pub use fetch_validator::FetchValidator;
pub use isa_coverage_validator::IsaCoverageValidator;
pub use phase_ordering_validator::PhaseOrderingValidator;
pub use sequence_transformer::SequenceTransformer;
pub use sequence_validator::SequenceValidator;
pub use stage_validator::StageValidator;
pub use status_validator::StatusValidator;
pub use step_merging_optimizer::StepMergingOptimizer;

use irata2_hdl::Cpu as HdlCpu;

use crate::encoder::{ControlEncoder, StatusEncoder};
use crate::error::MicrocodeError;
use crate::ir::InstructionSet;
use crate::program::{MicrocodeKey, MicrocodeProgram, StatusBitDef};

/// A single compiler pass over the instruction set
pub trait Pass {
    fn run(&self, instruction_set: &mut InstructionSet) -> Result<(), MicrocodeError>;
}

/// The full transform / validate / optimize / encode pipeline
pub struct Compiler {
    control_encoder: ControlEncoder,
    status_encoder: StatusEncoder,
    fetch_transformer: FetchTransformer,
    fetch_validator: FetchValidator,
    sequence_transformer: SequenceTransformer,
    sequence_validator: SequenceValidator,
    bus_validator: BusValidator,
    control_conflict_validator: ControlConflictValidator,
    stage_validator: StageValidator,
    status_validator: StatusValidator,
    isa_coverage_validator: IsaCoverageValidator,
    phase_ordering_validator: PhaseOrderingValidator,
    empty_step_optimizer: EmptyStepOptimizer,
    duplicate_step_optimizer: DuplicateStepOptimizer,
    step_merging_optimizer: StepMergingOptimizer,
}

impl Compiler {
    /// Build a compiler for the given CPU descriptor
    pub fn new(hdl: &HdlCpu) -> Result<Compiler, MicrocodeError> {
        let catalog = hdl.catalog().clone();
        let status_bits: Vec<StatusBitDef> = hdl
            .status_bits()
            .iter()
            .map(|info| StatusBitDef {
                name: info.name.to_string(),
                bit: info.bit,
            })
            .collect();
        let status_encoder = StatusEncoder::new(status_bits)?;

        Ok(Compiler {
            control_encoder: ControlEncoder::new(catalog.clone()),
            status_validator: StatusValidator::new(status_encoder.clone()),
            status_encoder,
            fetch_transformer: FetchTransformer,
            fetch_validator: FetchValidator,
            sequence_transformer: SequenceTransformer::new(hdl.sc_increment(), hdl.sc_reset()),
            sequence_validator: SequenceValidator::new(hdl.sc_increment(), hdl.sc_reset()),
            bus_validator: BusValidator::new(catalog.clone()),
            control_conflict_validator: ControlConflictValidator::new(catalog.clone()),
            stage_validator: StageValidator,
            isa_coverage_validator: IsaCoverageValidator,
            phase_ordering_validator: PhaseOrderingValidator::new(catalog),
            empty_step_optimizer: EmptyStepOptimizer,
            duplicate_step_optimizer: DuplicateStepOptimizer,
            step_merging_optimizer: StepMergingOptimizer::new(hdl.catalog().clone()),
        })
    }

    fn run_all_validators(&self, set: &mut InstructionSet) -> Result<(), MicrocodeError> {
        self.bus_validator.run(set)?;
        self.control_conflict_validator.run(set)?;
        self.stage_validator.run(set)?;
        self.status_validator.run(set)?;
        self.isa_coverage_validator.run(set)?;
        self.phase_ordering_validator.run(set)?;
        self.sequence_validator.run(set)?;
        Ok(())
    }

    /// Compile an instruction set to a microcode program
    pub fn compile(&self, mut set: InstructionSet) -> Result<MicrocodeProgram, MicrocodeError> {
        // Preamble passes bring the IR to its canonical executable form.
        self.fetch_transformer.run(&mut set)?;
        self.fetch_validator.run(&mut set)?;
        self.sequence_transformer.run(&mut set)?;

        self.run_all_validators(&mut set)?;

        // Optimizers must leave every invariant intact, so the full suite
        // runs after each one.
        self.empty_step_optimizer.run(&mut set)?;
        self.run_all_validators(&mut set)?;

        self.duplicate_step_optimizer.run(&mut set)?;
        self.run_all_validators(&mut set)?;

        self.step_merging_optimizer.run(&mut set)?;
        self.run_all_validators(&mut set)?;

        self.encode(&set)
    }

    fn encode(&self, set: &InstructionSet) -> Result<MicrocodeProgram, MicrocodeError> {
        let mut program = MicrocodeProgram {
            control_paths: self.control_encoder.control_paths(),
            status_bits: self.status_encoder.bits().to_vec(),
            table: Default::default(),
        };

        for instruction in &set.instructions {
            let opcode = instruction.opcode.value();
            for variant in &instruction.variants {
                if variant.steps.len() > 0x100 {
                    return Err(MicrocodeError::StepIndexOverflow {
                        location: crate::error::Location::Opcode(opcode),
                        steps: variant.steps.len(),
                    });
                }
                let statuses = self.status_encoder.expand_partial(&variant.status_conditions)?;
                for (step_index, step) in variant.steps.iter().enumerate() {
                    let control_word = self.control_encoder.encode(&step.controls);
                    for status in &statuses {
                        let key = MicrocodeKey::new(opcode, step_index as u8, *status);
                        let entry = program.table.entry(key.encode()).or_insert(control_word);
                        if *entry != control_word {
                            return Err(MicrocodeError::DuplicateTableEntry {
                                opcode,
                                step: key.step,
                                status: key.status,
                            });
                        }
                    }
                }
            }
        }

        tracing::debug!(
            controls = program.control_paths.len(),
            entries = program.table.len(),
            "microcode compiled"
        );
        Ok(program)
    }
}
