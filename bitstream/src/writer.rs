//! Bit-level writer producing the same layout the reader consumes.
//!
//! Decoding never needs it; it builds fixtures for tests, fuzz seeds and
//! benchmarks.

use crate::error::{BitError, BitResult};

/// A bit-level writer for encoding packed binary data.
///
/// Bits fill each byte from the least-significant end. Call
/// [`finish`](Self::finish) to get the final byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, value: bool) {
        self.current_byte |= u8::from(value) << self.bit_count;
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes the low `bits` bits of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u32) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange {
                value,
                bits: bits as usize,
            });
        }
        for i in 0..bits {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Writes a two's-complement signed value in `bits` bits.
    pub fn write_signed(&mut self, value: i64, bits: u32) -> BitResult<()> {
        if bits == 0 || bits > 64 {
            return self.write_bits(0, bits);
        }
        let min = if bits == 64 { i64::MIN } else { -(1i64 << (bits - 1)) };
        let max = if bits == 64 { i64::MAX } else { (1i64 << (bits - 1)) - 1 };
        if value < min || value > max {
            return Err(BitError::ValueOutOfRange {
                value: value as u64,
                bits: bits as usize,
            });
        }
        let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        self.write_bits(value as u64 & mask, bits)
    }

    /// Writes a `u8`.
    pub fn write_u8(&mut self, value: u8) {
        self.write_unchecked(u64::from(value), 8);
    }

    /// Writes a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.write_unchecked(u64::from(value), 16);
    }

    /// Writes a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.write_unchecked(u64::from(value), 32);
    }

    /// Writes a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    /// Writes a raw IEEE-754 single-precision float.
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes a byte run.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_u8(byte);
        }
    }

    /// Writes a string followed by a NUL terminator.
    pub fn write_cstring(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
        self.write_u8(0);
    }

    /// Writes a string into a fixed-width field, NUL padded or truncated.
    pub fn write_fixed_string(&mut self, value: &str, len: usize) {
        let bytes = value.as_bytes();
        for i in 0..len {
            self.write_u8(bytes.get(i).copied().unwrap_or(0));
        }
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, its unused high bits are zero.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.bytes.push(self.current_byte);
        }
        self.bytes
    }

    fn write_unchecked(&mut self, value: u64, bits: u32) {
        for i in 0..bits {
            self.write_bit((value >> i) & 1 == 1);
        }
    }
}
