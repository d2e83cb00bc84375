//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// A bit-level reader over a borrowed byte buffer.
///
/// Bits are consumed least-significant first within each byte and multi-byte
/// values are little-endian, matching the recording format. A reader covers a
/// window `[start, end)` of the buffer; sub-readers share the buffer with a
/// tighter window and their own position, so advancing one never moves the
/// other.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    start: usize,
    end: usize,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` covering the whole byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            start: 0,
            end: data.len().saturating_mul(8),
            pos: 0,
        }
    }

    /// Creates a `BitReader` limited to the first `bits` bits of `data`.
    ///
    /// The bound is clamped to the buffer length.
    #[must_use]
    pub fn with_bit_len(data: &'a [u8], bits: usize) -> Self {
        let end = bits.min(data.len().saturating_mul(8));
        Self {
            data,
            start: 0,
            end,
            pos: 0,
        }
    }

    /// Total number of bits covered by this reader.
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.end - self.start
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position relative to the start of this reader.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.pos - self.start
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        self.ensure_bits(1)?;
        let bit = (self.data[self.pos / 8] >> (self.pos % 8)) & 1;
        self.pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as an unsigned integer.
    pub fn read_bits(&mut self, bits: u32) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        if bits == 0 {
            return Ok(0);
        }
        self.ensure_bits(bits as usize)?;

        let mut value = 0u64;
        let mut filled = 0u32;
        while filled < bits {
            let byte = self.data[self.pos / 8];
            let offset = (self.pos % 8) as u32;
            let take = (8 - offset).min(bits - filled);
            let chunk = (byte >> offset) & (u8::MAX >> (8 - take));
            value |= u64::from(chunk) << filled;
            filled += take;
            self.pos += take as usize;
        }
        Ok(value)
    }

    /// Reads up to 64 bits as a two's-complement signed integer.
    ///
    /// The top bit read is the sign bit and is extended to the full width.
    pub fn read_signed(&mut self, bits: u32) -> BitResult<i64> {
        let raw = self.read_bits(bits)?;
        if bits == 0 || bits == 64 {
            return Ok(raw as i64);
        }
        let shift = 64 - bits;
        Ok(((raw << shift) as i64) >> shift)
    }

    /// Reads `bits` bits as a `u32`.
    pub fn read_u32_bits(&mut self, bits: u32) -> BitResult<u32> {
        if bits > 32 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 32,
            });
        }
        Ok(self.read_bits(bits)? as u32)
    }

    /// Reads `bits` bits as a sign-extended `i32`.
    pub fn read_i32_bits(&mut self, bits: u32) -> BitResult<i32> {
        if bits > 32 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 32,
            });
        }
        Ok(self.read_signed(bits)? as i32)
    }

    /// Reads a `u8` at the current bit position.
    pub fn read_u8(&mut self) -> BitResult<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads a little-endian `u16` at the current bit position.
    pub fn read_u16(&mut self) -> BitResult<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Reads a little-endian `u32` at the current bit position.
    pub fn read_u32(&mut self) -> BitResult<u32> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Reads a little-endian `i32` at the current bit position.
    pub fn read_i32(&mut self) -> BitResult<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads a little-endian `u64` at the current bit position.
    pub fn read_u64(&mut self) -> BitResult<u64> {
        self.read_bits(64)
    }

    /// Reads a raw IEEE-754 single-precision float.
    pub fn read_f32(&mut self) -> BitResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads a presence bit, then `bits` bits if it was set.
    pub fn read_bits_if_exists(&mut self, bits: u32) -> BitResult<Option<u64>> {
        if self.read_bit()? {
            self.read_bits(bits).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a presence bit, then a raw float if it was set.
    pub fn read_f32_if_exists(&mut self) -> BitResult<Option<f32>> {
        if self.read_bit()? {
            self.read_f32().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a variable-width integer: a 2-bit selector picks 4, 8, 12 or 32 bits.
    pub fn read_ubit_var(&mut self) -> BitResult<u32> {
        let width = match self.read_bits(2)? {
            0 => 4,
            1 => 8,
            2 => 12,
            _ => 32,
        };
        self.read_u32_bits(width)
    }

    /// Reads a 4-bit low nibble followed by a selector-sized high part.
    pub fn read_ubit_int(&mut self) -> BitResult<u32> {
        let low = self.read_u32_bits(4)?;
        let high_bits = match self.read_bits(2)? {
            0 => return Ok(low),
            1 => 4,
            2 => 8,
            _ => 28,
        };
        Ok(low | (self.read_u32_bits(high_bits)? << 4))
    }

    /// Reads `len` bytes at the current bit position.
    pub fn read_bytes(&mut self, len: usize) -> BitResult<Vec<u8>> {
        let bits = len.checked_mul(8).ok_or(BitError::BufferExhausted {
            requested: usize::MAX,
            available: self.bits_remaining(),
        })?;
        self.ensure_bits(bits)?;
        if self.pos % 8 == 0 {
            let idx = self.pos / 8;
            let out = self.data[idx..idx + len].to_vec();
            self.pos += bits;
            return Ok(out);
        }
        (0..len).map(|_| self.read_u8()).collect()
    }

    /// Reads `bits` bits into packed bytes; a trailing partial byte keeps its
    /// bits at the low end.
    pub fn read_bit_run(&mut self, bits: usize) -> BitResult<Vec<u8>> {
        self.ensure_bits(bits)?;
        let mut out = self.read_bytes(bits / 8)?;
        let rest = (bits % 8) as u32;
        if rest > 0 {
            out.push(self.read_bits(rest)? as u8);
        }
        Ok(out)
    }

    /// Reads a null-terminated string, consuming the terminator.
    ///
    /// Invalid UTF-8 is replaced lossily. Running out of bits before the
    /// terminator is an error.
    pub fn read_cstring(&mut self) -> BitResult<String> {
        let mut bytes = Vec::new();
        loop {
            if self.bits_remaining() < 8 {
                return Err(BitError::UnterminatedString {
                    bytes_read: bytes.len(),
                });
            }
            match self.read_u8()? {
                0 => break,
                byte => bytes.push(byte),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads exactly `len` bytes as a string, without a terminator.
    pub fn read_string_of_length(&mut self, len: usize) -> BitResult<String> {
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads a fixed-width byte field, keeping the text before the first NUL.
    pub fn read_fixed_string(&mut self, len: usize) -> BitResult<String> {
        let bytes = self.read_bytes(len)?;
        let text = bytes.split(|&b| b == 0).next().unwrap_or_default();
        Ok(String::from_utf8_lossy(text).into_owned())
    }

    /// Advances past `bits` bits without decoding them.
    pub fn skip_bits(&mut self, bits: usize) -> BitResult<()> {
        self.ensure_bits(bits)?;
        self.pos += bits;
        Ok(())
    }

    /// Returns a reader over the next `bits` bits without advancing.
    pub fn sub_reader(&self, bits: usize) -> BitResult<BitReader<'a>> {
        self.ensure_bits(bits)?;
        Ok(BitReader {
            data: self.data,
            start: self.pos,
            end: self.pos + bits,
            pos: self.pos,
        })
    }

    /// Returns a reader over the next `bits` bits and advances past them.
    ///
    /// The two readers are independent afterwards: failures inside the child
    /// leave the parent positioned at the end of the carved range.
    pub fn split_and_skip(&mut self, bits: usize) -> BitResult<BitReader<'a>> {
        let child = self.sub_reader(bits)?;
        self.pos += bits;
        Ok(child)
    }

    /// Returns a reader over everything left, without advancing.
    #[must_use]
    pub const fn remainder(&self) -> BitReader<'a> {
        BitReader {
            data: self.data,
            start: self.pos,
            end: self.end,
            pos: self.pos,
        }
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::BufferExhausted {
                requested: bits,
                available,
            });
        }
        Ok(())
    }
}
