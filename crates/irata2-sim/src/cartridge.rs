//! Cartridge container
//!
//! Little-endian binary: a fixed 32-byte header followed by the ROM
//! image. The header records the entry address the PC is reset to and the
//! ROM size; the reserved tail is zero.

use std::path::Path;

use irata2_core::{Byte, Word};

use crate::error::SimError;

pub const CARTRIDGE_MAGIC: [u8; 4] = *b"IRTA";
pub const CARTRIDGE_VERSION: u16 = 1;
pub const CARTRIDGE_HEADER_SIZE: u16 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartridgeHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub header_size: u16,
    pub entry: Word,
    pub rom_size: u32,
}

impl CartridgeHeader {
    pub fn new(entry: Word, rom_size: u32) -> CartridgeHeader {
        CartridgeHeader {
            magic: CARTRIDGE_MAGIC,
            version: CARTRIDGE_VERSION,
            header_size: CARTRIDGE_HEADER_SIZE,
            entry,
            rom_size,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadedCartridge {
    pub header: CartridgeHeader,
    pub rom: Vec<Byte>,
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, SimError> {
    let bytes: [u8; 2] = data
        .get(offset..offset + 2)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(SimError::CartridgeTruncated)?;
    Ok(u16::from_le_bytes(bytes))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, SimError> {
    let bytes: [u8; 4] = data
        .get(offset..offset + 4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(SimError::CartridgeTruncated)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Parse a cartridge image from memory
pub fn parse_cartridge(data: &[u8]) -> Result<LoadedCartridge, SimError> {
    if data.is_empty() {
        return Err(SimError::CartridgeEmpty);
    }
    if data.len() < usize::from(CARTRIDGE_HEADER_SIZE) {
        return Err(SimError::CartridgeHeaderTooSmall);
    }
    if data[0..4] != CARTRIDGE_MAGIC {
        return Err(SimError::CartridgeBadMagic);
    }

    let header = CartridgeHeader {
        magic: CARTRIDGE_MAGIC,
        version: read_u16(data, 4)?,
        header_size: read_u16(data, 6)?,
        entry: Word(read_u16(data, 8)?),
        rom_size: read_u32(data, 10)?,
    };

    if header.header_size < CARTRIDGE_HEADER_SIZE {
        return Err(SimError::CartridgeHeaderTooSmall);
    }
    let rom_start = usize::from(header.header_size);
    let rom_end = rom_start + header.rom_size as usize;
    if data.len() < rom_end {
        return Err(SimError::CartridgeTruncated);
    }

    let rom = data[rom_start..rom_end].iter().map(|b| Byte(*b)).collect();
    Ok(LoadedCartridge { header, rom })
}

/// Load a cartridge from disk
pub fn load_cartridge(path: impl AsRef<Path>) -> Result<LoadedCartridge, SimError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| SimError::CartridgeIo {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "cartridge read");
    parse_cartridge(&data)
}

/// Serialize a cartridge image
pub fn build_cartridge(entry: Word, rom: &[u8]) -> Vec<u8> {
    let header = CartridgeHeader::new(entry, rom.len() as u32);
    let mut data = Vec::with_capacity(usize::from(CARTRIDGE_HEADER_SIZE) + rom.len());
    data.extend_from_slice(&header.magic);
    data.extend_from_slice(&header.version.to_le_bytes());
    data.extend_from_slice(&header.header_size.to_le_bytes());
    data.extend_from_slice(&header.entry.0.to_le_bytes());
    data.extend_from_slice(&header.rom_size.to_le_bytes());
    data.resize(usize::from(CARTRIDGE_HEADER_SIZE), 0);
    data.extend_from_slice(rom);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let rom: Vec<u8> = (0..=255).cycle().take(0x8000).collect();
        let image = build_cartridge(Word(0x8000), &rom);
        let loaded = parse_cartridge(&image).unwrap();

        assert_eq!(loaded.header.magic, CARTRIDGE_MAGIC);
        assert_eq!(loaded.header.version, CARTRIDGE_VERSION);
        assert_eq!(loaded.header.entry, Word(0x8000));
        assert_eq!(loaded.header.rom_size, 0x8000);
        assert_eq!(loaded.rom.len(), rom.len());
        assert_eq!(loaded.rom[0x123], Byte(rom[0x123]));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut image = build_cartridge(Word(0x8000), &[0u8; 16]);
        image[0] = b'X';
        assert!(matches!(
            parse_cartridge(&image),
            Err(SimError::CartridgeBadMagic)
        ));
    }

    #[test]
    fn test_rejects_truncated_rom() {
        let mut image = build_cartridge(Word(0x8000), &[0u8; 16]);
        image.truncate(image.len() - 4);
        assert!(matches!(
            parse_cartridge(&image),
            Err(SimError::CartridgeTruncated)
        ));
    }

    #[test]
    fn test_rejects_short_header() {
        let image = vec![b'I', b'R', b'T', b'A', 1, 0];
        assert!(matches!(
            parse_cartridge(&image),
            Err(SimError::CartridgeHeaderTooSmall)
        ));
    }

    #[test]
    fn test_rejects_header_size_below_minimum() {
        let mut image = build_cartridge(Word(0x8000), &[0u8; 16]);
        image[6] = 16;
        image[7] = 0;
        assert!(matches!(
            parse_cartridge(&image),
            Err(SimError::CartridgeHeaderTooSmall)
        ));
    }

    #[test]
    fn test_rejects_empty_file() {
        assert!(matches!(
            parse_cartridge(&[]),
            Err(SimError::CartridgeEmpty)
        ));
    }

    proptest::proptest! {
        #[test]
        fn prop_roundtrip(entry in 0u16..=0xFFFF, rom in proptest::collection::vec(0u8.., 0..512)) {
            let image = build_cartridge(Word(entry), &rom);
            let loaded = parse_cartridge(&image).unwrap();
            proptest::prop_assert_eq!(loaded.header.entry, Word(entry));
            proptest::prop_assert_eq!(loaded.rom.len(), rom.len());
        }
    }

    #[test]
    fn test_oversized_header_is_respected() {
        // A future version may grow the header; ROM bytes follow it.
        let mut image = build_cartridge(Word(0x8000), &[]);
        image[6] = 40;
        image.resize(40, 0);
        image.extend_from_slice(&[0xAB, 0xCD]);
        image[10] = 2; // rom_size = 2
        let loaded = parse_cartridge(&image).unwrap();
        assert_eq!(loaded.rom, vec![Byte(0xAB), Byte(0xCD)]);
    }
}
