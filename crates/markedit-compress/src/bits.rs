//! Bit-level I/O. Bits are packed most significant first; the last byte is
//! zero-padded.

use crate::CompressError;

#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    current: u8,
    filled: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.current = (self.current << 1) | u8::from(bit);
        self.filled += 1;
        if self.filled == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        if self.filled == 0 {
            self.bytes.push(byte);
            return;
        }
        for shift in (0..8).rev() {
            self.write_bit((byte >> shift) & 1 == 1);
        }
    }

    pub fn write_bits(&mut self, bits: &[bool]) {
        for &bit in bits {
            self.write_bit(bit);
        }
    }

    /// Flush the partial byte, padding with zeros.
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.current << (8 - self.filled));
        }
        self.bytes
    }
}

#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    /// Index of the next bit to read.
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn read_bit(&mut self) -> Result<bool, CompressError> {
        let byte = self
            .bytes
            .get(self.pos / 8)
            .ok_or(CompressError::Truncated)?;
        let bit = (byte >> (7 - self.pos % 8)) & 1 == 1;
        self.pos += 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, CompressError> {
        let mut byte = 0;
        for _ in 0..8 {
            byte = (byte << 1) | u8::from(self.read_bit()?);
        }
        Ok(byte)
    }

    /// Bits left, padding included.
    pub fn remaining(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bits_msb_first_with_padding() {
        let mut w = BitWriter::new();
        w.write_bits(&[true, false, true]);
        assert_eq!(w.finish(), vec![0b1010_0000]);
    }

    #[test]
    fn test_unaligned_byte() {
        let mut w = BitWriter::new();
        w.write_bit(true);
        w.write_byte(0xFF);
        assert_eq!(w.finish(), vec![0xFF, 0x80]);
    }

    #[test]
    fn test_reader_follows_writer() {
        let mut w = BitWriter::new();
        w.write_bit(false);
        w.write_byte(0x5A);
        w.write_bits(&[true, true]);
        let bytes = w.finish();

        let mut r = BitReader::new(&bytes);
        assert!(!r.read_bit().unwrap());
        assert_eq!(r.read_byte().unwrap(), 0x5A);
        assert!(r.read_bit().unwrap());
        assert!(r.read_bit().unwrap());
        assert_eq!(r.remaining(), 5);
    }

    #[test]
    fn test_reader_past_end() {
        let mut r = BitReader::new(&[0x01]);
        assert_eq!(r.read_byte().unwrap(), 0x01);
        assert_eq!(r.read_bit(), Err(CompressError::Truncated));
    }
}
