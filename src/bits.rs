//! MSB-first bit cursor over byte buffers.

#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Bits consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.position)
    }

    /// Reads `width` bits (1..=64) as an unsigned value, or `None` when the
    /// buffer runs out. The cursor does not move on failure.
    pub fn read(&mut self, width: u8) -> Option<u64> {
        let width = width as usize;
        if width == 0 || width > 64 || width > self.remaining() {
            return None;
        }

        let mut value = 0u64;
        for offset in self.position..self.position + width {
            let byte = self.bytes[offset / 8];
            let bit = (byte >> (7 - (offset % 8))) & 1;
            value = (value << 1) | u64::from(bit);
        }
        self.position += width;

        Some(value)
    }
}

#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    position: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.position
    }

    /// Appends the low `width` bits of `value`, most significant first.
    pub fn write(&mut self, value: u64, width: u8) {
        for shift in (0..width).rev() {
            let bit = ((value >> shift) & 1) as u8;
            if self.position % 8 == 0 {
                self.bytes.push(0);
            }
            if bit == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 1 << (7 - (self.position % 8));
            }
            self.position += 1;
        }
    }

    /// Final byte is zero-padded.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
