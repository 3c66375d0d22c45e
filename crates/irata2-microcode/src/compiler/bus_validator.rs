//! Bus usage validation
//!
//! Classifies every control by the bus it touches and the direction of the
//! transfer, then checks single-writer arbitration per step. Bus membership
//! follows the component path: `pc` and `tmp` are address-bus word
//! registers whose byte ports (three or more path segments, e.g.
//! `pc.low.read`, `pc.signed_offset.read`) sit on the data bus; `memory`
//! is on the data bus except for the bare `mar` word port; everything on a
//! byte register is data-bus.

use irata2_hdl::Catalog;

use crate::compiler::Pass;
use crate::error::{Location, MicrocodeError};
use crate::ir::{InstructionSet, Step};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum BusKind {
    Data,
    Address,
}

impl BusKind {
    fn name(self) -> &'static str {
        match self {
            BusKind::Data => "data",
            BusKind::Address => "address",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BusOp {
    Read,
    Write,
}

fn classify(path: &str) -> Option<(BusKind, BusOp)> {
    let segments: Vec<&str> = path.split('.').collect();

    let op = match *segments.last()? {
        "read" => BusOp::Read,
        "write" => BusOp::Write,
        _ => return None,
    };

    let kind = match segments[0] {
        "a" | "x" | "y" | "sp" | "alu" | "status" | "controller" => BusKind::Data,
        "pc" | "tmp" => {
            // Byte ports and operand latches transfer over the data bus;
            // the bare word register drives the address bus.
            if segments.len() >= 3 {
                BusKind::Data
            } else {
                BusKind::Address
            }
        }
        "memory" => {
            if segments.get(1) == Some(&"mar") {
                if segments.len() >= 4 {
                    BusKind::Data
                } else {
                    BusKind::Address
                }
            } else {
                BusKind::Data
            }
        }
        _ => return None,
    };

    Some((kind, op))
}

/// Per-step single-writer arbitration check
pub struct BusValidator {
    catalog: Catalog,
}

impl BusValidator {
    pub fn new(catalog: Catalog) -> BusValidator {
        BusValidator { catalog }
    }

    fn validate_step(
        &self,
        step: &Step,
        location: Location,
        step_index: usize,
    ) -> Result<(), MicrocodeError> {
        let mut writers: [(Vec<&str>, BusKind); 2] =
            [(Vec::new(), BusKind::Data), (Vec::new(), BusKind::Address)];
        let mut readers: [(Vec<&str>, BusKind); 2] =
            [(Vec::new(), BusKind::Data), (Vec::new(), BusKind::Address)];

        let slot = |kind: BusKind| match kind {
            BusKind::Data => 0,
            BusKind::Address => 1,
        };

        for control in &step.controls {
            let path = self.catalog.path(*control);
            if let Some((kind, op)) = classify(path) {
                match op {
                    BusOp::Write => writers[slot(kind)].0.push(path),
                    BusOp::Read => readers[slot(kind)].0.push(path),
                }
            }
        }

        for (paths, kind) in &writers {
            if paths.len() > 1 {
                return Err(MicrocodeError::MultipleBusWriters {
                    bus: kind.name(),
                    location,
                    step: step_index,
                    paths: paths.join(", "),
                });
            }
        }

        for (paths, kind) in &readers {
            if !paths.is_empty() && writers[slot(*kind)].0.is_empty() {
                return Err(MicrocodeError::ReaderWithoutWriter {
                    bus: kind.name(),
                    location,
                    step: step_index,
                    paths: paths.join(", "),
                });
            }
        }

        Ok(())
    }
}

impl Pass for BusValidator {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, InstructionVariant};
    use irata2_hdl::Cpu as HdlCpu;
    use irata2_isa::Opcode;

    fn validator() -> (BusValidator, Catalog) {
        let hdl = HdlCpu::new().unwrap();
        (
            BusValidator::new(hdl.catalog().clone()),
            hdl.catalog().clone(),
        )
    }

    fn step_of(catalog: &Catalog, paths: &[&str]) -> Step {
        Step::new(
            0,
            paths
                .iter()
                .map(|path| catalog.require(path, "test").unwrap()),
        )
    }

    fn set_of(step: Step) -> InstructionSet {
        InstructionSet {
            fetch_preamble: Vec::new(),
            instructions: vec![Instruction::new(
                Opcode::Nop,
                vec![InstructionVariant::unconditional(vec![step])],
            )],
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify("pc.write"), Some((BusKind::Address, BusOp::Write)));
        assert_eq!(classify("pc.low.read"), Some((BusKind::Data, BusOp::Read)));
        assert_eq!(
            classify("pc.signed_offset.read"),
            Some((BusKind::Data, BusOp::Read))
        );
        assert_eq!(
            classify("memory.mar.read"),
            Some((BusKind::Address, BusOp::Read))
        );
        assert_eq!(
            classify("memory.mar.low.read"),
            Some((BusKind::Data, BusOp::Read))
        );
        assert_eq!(classify("memory.write"), Some((BusKind::Data, BusOp::Write)));
        assert_eq!(classify("a.read"), Some((BusKind::Data, BusOp::Read)));
        assert_eq!(classify("halt"), None);
        assert_eq!(classify("pc.increment"), None);
    }

    #[test]
    fn test_accepts_fetch_shape() {
        let (validator, catalog) = validator();
        let mut set = set_of(step_of(&catalog, &["pc.write", "memory.mar.read"]));
        assert!(validator.run(&mut set).is_ok());
    }

    #[test]
    fn test_rejects_two_writers() {
        let (validator, catalog) = validator();
        let mut set = set_of(step_of(&catalog, &["a.write", "x.write"]));
        assert!(matches!(
            validator.run(&mut set),
            Err(MicrocodeError::MultipleBusWriters { bus: "data", .. })
        ));
    }

    #[test]
    fn test_rejects_reader_without_writer() {
        let (validator, catalog) = validator();
        let mut set = set_of(step_of(&catalog, &["a.read"]));
        assert!(matches!(
            validator.run(&mut set),
            Err(MicrocodeError::ReaderWithoutWriter { bus: "data", .. })
        ));
    }

    #[test]
    fn test_buses_are_independent() {
        let (validator, catalog) = validator();
        // Data-bus transfer and address-bus transfer in one step.
        let mut set = set_of(step_of(
            &catalog,
            &["pc.write", "memory.mar.read", "memory.write", "a.read"],
        ));
        assert!(validator.run(&mut set).is_ok());
    }
}
