//! Microcode encoders
//!
//! Control words are one bit per catalog control; status conditions expand
//! from partial flag maps to every concrete status byte they cover. The
//! instruction-key packing lives with [`crate::program::MicrocodeKey`].

pub mod control_encoder;
pub mod status_encoder;

pub use control_encoder::ControlEncoder;
pub use status_encoder::StatusEncoder;
