use crate::store::{CodecError, Field};
use core::fmt;
use heapless::Vec;

pub const MAX_MASK_BITS: usize = 64;

/// Presence mask where the bit position, not its value, names the entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitmask {
    bits: Vec<bool, MAX_MASK_BITS>,
}

impl Bitmask {
    pub fn from_bits(bits: &str) -> Result<Self, CodecError> {
        let mut mask = Bitmask::default();
        for c in bits.chars() {
            let bit = match c {
                '0' => false,
                '1' => true,
                _ => return Err(CodecError::InvalidBinary(bits.to_string())),
            };
            mask.bits
                .push(bit)
                .map_err(|_| CodecError::InvalidBinary(bits.to_string()))?;
        }
        Ok(mask)
    }

    pub fn from_field(field: &Field) -> Self {
        // field widths never exceed MAX_MASK_BITS
        Bitmask {
            bits: field.bits().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    pub fn is_set(&self, position: usize) -> bool {
        self.bits.get(position).copied().unwrap_or(false)
    }

    /// 0-based positions of set bits, ascending.
    pub fn set_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(position, bit)| bit.then_some(position))
    }
}

impl fmt::Display for Bitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
