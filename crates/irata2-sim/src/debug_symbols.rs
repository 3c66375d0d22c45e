//! Debug-symbol file support
//!
//! The assembler emits a JSON sidecar mapping program-counter values back
//! to source locations. The loader validates the shape strictly: hex
//! addresses must parse, source locations are 1-based, and record offsets
//! must fall inside the ROM.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use irata2_core::Word;
use serde::Deserialize;

use crate::error::SimError;

/// One resolved source location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub text: String,
}

/// One address-to-source record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugRecord {
    pub address: Word,
    pub rom_offset: u32,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub text: String,
}

/// Parsed and validated debug symbols
#[derive(Clone, Debug)]
pub struct DebugSymbols {
    pub version: u32,
    pub entry: Word,
    pub rom_size: u32,
    pub source_root: String,
    pub source_files: Vec<String>,
    pub symbols: BTreeMap<String, Word>,
    pc_to_source: HashMap<u16, SourceLocation>,
    pub records: Vec<DebugRecord>,
}

impl DebugSymbols {
    /// Source location for a program counter, if known
    pub fn lookup(&self, pc: Word) -> Option<&SourceLocation> {
        self.pc_to_source.get(&pc.0)
    }

    /// Address of a named symbol, if known
    pub fn symbol(&self, name: &str) -> Option<Word> {
        self.symbols.get(name).copied()
    }
}

#[derive(Deserialize)]
struct RawLocation {
    file: String,
    line: u32,
    column: u32,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct RawRecord {
    address: u32,
    rom_offset: u32,
    file: String,
    line: u32,
    column: u32,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct RawSymbols {
    version: u32,
    entry: String,
    rom_size: u32,
    #[serde(default)]
    source_root: String,
    #[serde(default)]
    source_files: Vec<String>,
    #[serde(default)]
    symbols: BTreeMap<String, String>,
    #[serde(default)]
    pc_to_source: BTreeMap<String, RawLocation>,
    #[serde(default)]
    records: Vec<RawRecord>,
}

fn parse_hex_word(value: &str) -> Result<Word, SimError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| SimError::DebugSymbolsBadHex {
            value: value.to_string(),
        })?;
    u16::from_str_radix(digits, 16)
        .map(Word)
        .map_err(|_| SimError::DebugSymbolsBadHex {
            value: value.to_string(),
        })
}

fn validate_location(file: &str, line: u32, column: u32) -> Result<(), SimError> {
    if line == 0 || column == 0 {
        return Err(SimError::DebugSymbolsBadLocation {
            file: file.to_string(),
            line,
            column,
        });
    }
    Ok(())
}

/// Parse debug symbols from JSON text
pub fn parse_debug_symbols(json: &str) -> Result<DebugSymbols, SimError> {
    let raw: RawSymbols = serde_json::from_str(json)?;

    let entry = parse_hex_word(&raw.entry)?;

    let mut symbols = BTreeMap::new();
    for (name, address) in raw.symbols {
        let address = parse_hex_word(&address)?;
        symbols.insert(name, address);
    }

    let mut pc_to_source = HashMap::new();
    for (pc, location) in raw.pc_to_source {
        let pc = parse_hex_word(&pc)?;
        validate_location(&location.file, location.line, location.column)?;
        pc_to_source.insert(
            pc.0,
            SourceLocation {
                file: location.file,
                line: location.line,
                column: location.column,
                text: location.text,
            },
        );
    }

    let mut records = Vec::with_capacity(raw.records.len());
    for record in raw.records {
        if record.rom_offset >= raw.rom_size {
            return Err(SimError::DebugSymbolsBadOffset {
                rom_offset: record.rom_offset,
                rom_size: raw.rom_size,
            });
        }
        validate_location(&record.file, record.line, record.column)?;
        if record.address > u32::from(u16::MAX) {
            return Err(SimError::DebugSymbolsBadHex {
                value: format!("0x{:X}", record.address),
            });
        }
        records.push(DebugRecord {
            address: Word(record.address as u16),
            rom_offset: record.rom_offset,
            file: record.file,
            line: record.line,
            column: record.column,
            text: record.text,
        });
    }

    Ok(DebugSymbols {
        version: raw.version,
        entry,
        rom_size: raw.rom_size,
        source_root: raw.source_root,
        source_files: raw.source_files,
        symbols,
        pc_to_source,
        records,
    })
}

/// Load debug symbols from disk
pub fn load_debug_symbols(path: impl AsRef<Path>) -> Result<DebugSymbols, SimError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| SimError::DebugSymbolsIo {
        path: path.display().to_string(),
        source,
    })?;
    parse_debug_symbols(&json)
}
