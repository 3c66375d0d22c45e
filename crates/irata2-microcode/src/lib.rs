//! IRATA2 Microcode Toolchain
//!
//! A pure compiler from the declarative instruction-set IR to the
//! opcode x step x status -> control-word table the controller consults at
//! runtime. The pipeline transforms the IR (fetch preamble injection, step
//! sequencing), validates it continuously (bus usage, control conflicts,
//! stage numbering, status coverage, ISA coverage, phase ordering), applies
//! step optimizations, and encodes the result into a [`MicrocodeProgram`]
//! value that borrows nothing from the CPU.

pub mod compiler;
pub mod encoder;
pub mod error;
pub mod ir;
pub mod irata;
pub mod program;

pub use compiler::Compiler;
pub use error::{Location, MicrocodeError};
pub use ir::{Instruction, InstructionSet, InstructionVariant, Step};
pub use program::{MicrocodeKey, MicrocodeProgram, StatusBitDef};
