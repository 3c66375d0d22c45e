//! IRATA2 Structural CPU Descriptor
//!
//! The HDL layer is immutable structural metadata: it names every control
//! line in the datapath, records its tick phase and reset behavior, and
//! assigns each one a stable [`ControlId`] by sorting the full path list.
//! The microcode compiler works entirely against this catalog; the
//! simulator validates its live component tree against the same catalog at
//! load time, which is what lets a compiled [`ControlId`]-based program be
//! rebound to any structurally identical CPU instance.

pub mod catalog;
pub mod cpu;

pub use catalog::{Catalog, ControlId, ControlInfo};
pub use cpu::{Cpu, StatusBitInfo, STATUS_BITS};

use thiserror::Error;

/// Errors raised while building or querying the control catalog
#[derive(Debug, Error)]
pub enum HdlError {
    #[error("too many controls for 64-bit control word: {0}")]
    TooManyControls(usize),
    #[error("duplicate control path: {0}")]
    DuplicateControlPath(String),
    #[error("control path not found: {path} ({context})")]
    UnknownControlPath { path: String, context: String },
}
