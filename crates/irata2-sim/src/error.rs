//! Simulator construction and I/O errors
//!
//! Phase and bus violations inside `tick()` panic instead: they indicate
//! a microcode or wiring bug and cannot be recovered locally. Everything
//! here is surfaced to the caller as a value.

use irata2_core::Word;
use irata2_hdl::HdlError;
use irata2_microcode::MicrocodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Hdl(#[from] HdlError),

    #[error(transparent)]
    Microcode(#[from] MicrocodeError),

    // Memory map construction
    #[error("memory regions overlap: {first} vs {second}")]
    RegionOverlap { first: String, second: String },

    #[error("memory region size is not a power of two: {path} ({size})")]
    RegionSizeNotPowerOfTwo { path: String, size: usize },

    #[error("memory region offset not aligned to its size: {path} ({offset})")]
    RegionMisaligned { path: String, offset: Word },

    #[error("memory module is empty: {path}")]
    EmptyModule { path: String },

    // Memory runtime
    #[error("ROM write forbidden: {path} at {address}")]
    RomWrite { path: String, address: Word },

    #[error("memory write to unmapped address {address}")]
    UnmappedWrite { address: Word },

    #[error("ROM read out of bounds at {path}: index {index} (size {size})")]
    RomReadOutOfBounds {
        path: String,
        index: u64,
        size: usize,
    },

    // Program binding
    #[error("control table size mismatch: program has {program}, CPU has {cpu}")]
    ControlTableSize { program: usize, cpu: usize },

    #[error("control path order mismatch at bit {bit}: program '{program}', CPU '{cpu}'")]
    ControlOrderMismatch {
        bit: usize,
        program: String,
        cpu: String,
    },

    #[error("unknown status bit in program: {name}")]
    UnknownStatusBit { name: String },

    #[error("status bit index mismatch for {name}: program {program}, CPU {cpu}")]
    StatusBitMismatch { name: String, program: u8, cpu: u8 },

    // Cartridge
    #[error("failed to read cartridge {path}: {source}")]
    CartridgeIo {
        path: String,
        source: std::io::Error,
    },

    #[error("cartridge file is empty")]
    CartridgeEmpty,

    #[error("cartridge header too small")]
    CartridgeHeaderTooSmall,

    #[error("cartridge magic mismatch")]
    CartridgeBadMagic,

    #[error("cartridge file truncated")]
    CartridgeTruncated,

    #[error("cartridge ROM too large for the memory map: {size} bytes")]
    CartridgeRomTooLarge { size: usize },

    // Debug symbols
    #[error("failed to read debug symbols {path}: {source}")]
    DebugSymbolsIo {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed debug symbols: {0}")]
    DebugSymbolsJson(#[from] serde_json::Error),

    #[error("bad hex address in debug symbols: {value}")]
    DebugSymbolsBadHex { value: String },

    #[error("debug symbol record out of range: rom_offset {rom_offset} >= rom_size {rom_size}")]
    DebugSymbolsBadOffset { rom_offset: u32, rom_size: u32 },

    #[error("debug symbol location must be 1-based: {file}:{line}:{column}")]
    DebugSymbolsBadLocation {
        file: String,
        line: u32,
        column: u32,
    },
}
