//! Status encoder: partial condition maps to concrete status bytes

use std::collections::{BTreeMap, HashMap};

use crate::error::MicrocodeError;
use crate::program::StatusBitDef;

/// Expands partial status specifications into every concrete status byte
/// they cover.
///
/// Each flag keeps its declared bit position, so a status byte here is the
/// status register byte masked to the declared flags.
#[derive(Clone, Debug)]
pub struct StatusEncoder {
    bits: Vec<StatusBitDef>,
    bit_by_name: HashMap<String, u8>,
}

impl StatusEncoder {
    pub fn new(bits: Vec<StatusBitDef>) -> Result<StatusEncoder, MicrocodeError> {
        let mut bit_by_name = HashMap::with_capacity(bits.len());
        for def in &bits {
            if def.bit >= 8 {
                return Err(MicrocodeError::StatusBitOutOfRange {
                    name: def.name.clone(),
                    bit: def.bit,
                });
            }
            bit_by_name.insert(def.name.clone(), def.bit);
        }
        Ok(StatusEncoder { bits, bit_by_name })
    }

    /// Declared status flags
    pub fn bits(&self) -> &[StatusBitDef] {
        &self.bits
    }

    /// Mask of all declared flag positions
    pub fn mask(&self) -> u8 {
        self.bits.iter().fold(0u8, |mask, def| mask | (1 << def.bit))
    }

    /// Expand a partial flag map into every status byte it covers.
    ///
    /// Unspecified flags take both values; the expansion therefore has
    /// 2^k entries for k unspecified flags. Unknown flag names fail.
    pub fn expand_partial(
        &self,
        partial: &BTreeMap<String, bool>,
    ) -> Result<Vec<u8>, MicrocodeError> {
        if self.bits.is_empty() {
            if !partial.is_empty() {
                return Err(MicrocodeError::StatusBitsNotConfigured);
            }
            return Ok(vec![0]);
        }

        for name in partial.keys() {
            if !self.bit_by_name.contains_key(name) {
                return Err(MicrocodeError::UnknownStatusFlag { name: name.clone() });
            }
        }

        let mut base = 0u8;
        let mut unspecified = Vec::new();
        for def in &self.bits {
            match partial.get(&def.name) {
                Some(true) => base |= 1 << def.bit,
                Some(false) => {}
                None => unspecified.push(def.bit),
            }
        }

        let permutations = 1usize << unspecified.len();
        let mut expanded = Vec::with_capacity(permutations);
        for mask in 0..permutations {
            let mut value = base;
            for (i, bit) in unspecified.iter().enumerate() {
                if (mask >> i) & 1 == 1 {
                    value |= 1 << bit;
                }
            }
            expanded.push(value);
        }
        Ok(expanded)
    }

    /// Decode a status byte into named flag values
    pub fn decode(&self, status: u8) -> BTreeMap<String, bool> {
        self.bits
            .iter()
            .map(|def| (def.name.clone(), (status >> def.bit) & 1 == 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bit(name: &str, bit: u8) -> StatusBitDef {
        StatusBitDef {
            name: name.to_string(),
            bit,
        }
    }

    fn full_encoder() -> StatusEncoder {
        StatusEncoder::new(vec![
            bit("negative", 7),
            bit("overflow", 6),
            bit("unused", 5),
            bit("break", 4),
            bit("decimal", 3),
            bit("interrupt_disable", 2),
            bit("zero", 1),
            bit("carry", 0),
        ])
        .unwrap()
    }

    fn partial(entries: &[(&str, bool)]) -> BTreeMap<String, bool> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn test_expand_unconditional_covers_everything() {
        let encoder = full_encoder();
        let expanded = encoder.expand_partial(&BTreeMap::new()).unwrap();
        assert_eq!(expanded.len(), 256);
    }

    #[test]
    fn test_expand_single_condition_covers_half() {
        let encoder = full_encoder();
        let expanded = encoder.expand_partial(&partial(&[("zero", true)])).unwrap();
        assert_eq!(expanded.len(), 128);
        assert!(expanded.iter().all(|status| status & 0b10 != 0));
    }

    #[test]
    fn test_expanded_halves_partition_the_space() {
        let encoder = full_encoder();
        let mut all: Vec<u8> = encoder
            .expand_partial(&partial(&[("carry", true)]))
            .unwrap();
        all.extend(encoder.expand_partial(&partial(&[("carry", false)])).unwrap());
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 256);
    }

    #[test]
    fn test_unknown_flag_fails() {
        let encoder = full_encoder();
        let result = encoder.expand_partial(&partial(&[("bogus", true)]));
        assert!(matches!(
            result,
            Err(MicrocodeError::UnknownStatusFlag { .. })
        ));
    }

    #[test]
    fn test_bit_out_of_range_fails() {
        assert!(matches!(
            StatusEncoder::new(vec![bit("weird", 8)]),
            Err(MicrocodeError::StatusBitOutOfRange { .. })
        ));
    }

    #[test]
    fn test_empty_encoder() {
        let encoder = StatusEncoder::new(Vec::new()).unwrap();
        assert_eq!(encoder.expand_partial(&BTreeMap::new()).unwrap(), vec![0]);
        assert!(encoder
            .expand_partial(&partial(&[("zero", true)]))
            .is_err());
    }

    #[test]
    fn test_decode() {
        let encoder = full_encoder();
        let decoded = encoder.decode(0b1000_0010);
        assert_eq!(decoded.get("negative"), Some(&true));
        assert_eq!(decoded.get("zero"), Some(&true));
        assert_eq!(decoded.get("carry"), Some(&false));
    }
}
