//! Structured microcode construction and compilation errors

use std::fmt;

use irata2_hdl::HdlError;
use thiserror::Error;

/// Where in the instruction set an error was found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    FetchPreamble,
    Opcode(u8),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::FetchPreamble => f.write_str("fetch preamble"),
            Location::Opcode(opcode) => write!(f, "opcode 0x{opcode:02X}"),
        }
    }
}

/// Errors raised by the microcode compiler and encoders
#[derive(Debug, Error)]
pub enum MicrocodeError {
    #[error(transparent)]
    Hdl(#[from] HdlError),

    #[error("{location} must start at stage 0, got stage {stage}")]
    StageNotZeroBased { location: Location, stage: u32 },

    #[error("{location} stages not monotonic at step {step}: stage {stage} after stage {previous}")]
    StageNotMonotonic {
        location: Location,
        step: usize,
        stage: u32,
        previous: u32,
    },

    #[error("{location} has gap in stages: expected stage {expected}, found stage {found}")]
    StageGap {
        location: Location,
        expected: u32,
        found: u32,
    },

    #[error("variant specifies multiple status conditions in {location}: {names}")]
    MultipleStatusConditions { location: Location, names: String },

    #[error("overlapping status coverage in {location}: status {status} covered by multiple variants")]
    OverlappingStatusCoverage { location: Location, status: u8 },

    #[error("incomplete status coverage in {location}: covered {covered} of {total} possible statuses")]
    IncompleteStatusCoverage {
        location: Location,
        covered: usize,
        total: usize,
    },

    #[error("unknown status flag: {name}")]
    UnknownStatusFlag { name: String },

    #[error("status bit out of range for {name}: {bit}")]
    StatusBitOutOfRange { name: String, bit: u8 },

    #[error("status bits not configured")]
    StatusBitsNotConfigured,

    #[error("microcode defines unknown opcode 0x{opcode:02X}")]
    UnknownOpcode { opcode: u8 },

    #[error("duplicate microcode for opcode 0x{opcode:02X}")]
    DuplicateOpcode { opcode: u8 },

    #[error("microcode does not implement all ISA instructions (expected {expected}, got {got})")]
    MissingOpcodes { expected: usize, got: usize },

    #[error("multiple writers to {bus} bus in {location} step {step}: {paths}")]
    MultipleBusWriters {
        bus: &'static str,
        location: Location,
        step: usize,
        paths: String,
    },

    #[error("readers on {bus} bus without writer in {location} step {step}: {paths}")]
    ReaderWithoutWriter {
        bus: &'static str,
        location: Location,
        step: usize,
        paths: String,
    },

    #[error("conflicting {first} and {second} on component '{component}' in {location} step {step}")]
    ConflictingControls {
        component: String,
        first: &'static str,
        second: &'static str,
        location: Location,
        step: usize,
    },

    #[error("{kind} control '{path}' in {location} step {step} has phase {actual}, expected {expected}")]
    PhaseMismatch {
        kind: &'static str,
        path: String,
        location: Location,
        step: usize,
        actual: String,
        expected: String,
    },

    #[error("sequence control missing for {location} at step {step}")]
    MissingSequenceControl { location: Location, step: usize },

    #[error("fetch preamble mismatch for {location} at step {step}")]
    FetchPreambleMismatch { location: Location, step: usize },

    #[error("step index out of range for instruction memory: {location} has {steps} steps")]
    StepIndexOverflow { location: Location, steps: usize },

    #[error("microcode conflict at opcode 0x{opcode:02X} step {step} status {status}")]
    DuplicateTableEntry { opcode: u8, step: u8, status: u8 },

    #[error("control word sets bits outside control table: {word:#018x} with {controls} controls")]
    ControlWordOverflow { word: u64, controls: usize },
}
