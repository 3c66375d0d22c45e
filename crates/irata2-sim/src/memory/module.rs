//! Memory modules: RAM, ROM, and the device contract
//!
//! A module is a sized, byte-addressed component mounted into a region.
//! Devices implement the same trait; they receive tick hooks (a device
//! typically drives the shared IRQ line during Control) and are addressed
//! relative to their region base.

use irata2_core::{Byte, Word};

use crate::component::Component;
use crate::error::SimError;

/// A byte-addressed memory module
pub trait Module: Component {
    /// Size in bytes; must be a power of two for region mounting
    fn size(&self) -> usize;

    /// Read at a module-relative address
    fn read(&self, address: Word) -> Byte;

    /// Write at a module-relative address
    fn write(&mut self, address: Word, value: Byte) -> Result<(), SimError>;
}

/// Read-write memory backed by an array
pub struct Ram {
    path: String,
    data: Vec<Byte>,
}

impl Ram {
    pub fn new(path: String, size: usize, fill: Byte) -> Ram {
        Ram {
            path,
            data: vec![fill; size],
        }
    }
}

impl Component for Ram {
    fn path(&self) -> &str {
        &self.path
    }
}

impl Module for Ram {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn read(&self, address: Word) -> Byte {
        self.data[address.index()]
    }

    fn write(&mut self, address: Word, value: Byte) -> Result<(), SimError> {
        self.data[address.index()] = value;
        Ok(())
    }
}

/// Read-only memory; writes are errors
pub struct Rom {
    path: String,
    data: Vec<Byte>,
}

impl Rom {
    pub fn new(path: String, data: Vec<Byte>) -> Rom {
        Rom { path, data }
    }

    /// A ROM of `size` bytes holding `data` at the start and `fill`
    /// beyond it
    pub fn with_size(path: String, data: &[Byte], size: usize, fill: Byte) -> Rom {
        let mut padded = vec![fill; size];
        padded[..data.len()].copy_from_slice(data);
        Rom { path, data: padded }
    }
}

impl Component for Rom {
    fn path(&self) -> &str {
        &self.path
    }
}

impl Module for Rom {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn read(&self, address: Word) -> Byte {
        self.data[address.index()]
    }

    fn write(&mut self, address: Word, _value: Byte) -> Result<(), SimError> {
        Err(SimError::RomWrite {
            path: self.path.clone(),
            address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_read_write() {
        let mut ram = Ram::new("ram".to_string(), 16, Byte::ZERO);
        ram.write(Word(3), Byte(0x42)).unwrap();
        assert_eq!(ram.read(Word(3)), Byte(0x42));
        assert_eq!(ram.read(Word(0)), Byte::ZERO);
    }

    #[test]
    fn test_rom_rejects_writes() {
        let mut rom = Rom::new("rom".to_string(), vec![Byte(0xAA); 8]);
        assert_eq!(rom.read(Word(5)), Byte(0xAA));
        assert!(matches!(
            rom.write(Word(0), Byte(0x00)),
            Err(SimError::RomWrite { .. })
        ));
    }

    #[test]
    fn test_rom_padding() {
        let rom = Rom::with_size(
            "rom".to_string(),
            &[Byte(0x01), Byte(0x02)],
            8,
            Byte(0xFF),
        );
        assert_eq!(rom.size(), 8);
        assert_eq!(rom.read(Word(0)), Byte(0x01));
        assert_eq!(rom.read(Word(7)), Byte(0xFF));
    }
}
