//! Bit-level cursor primitives for the sdem demo decoder.
//!
//! This crate provides [`BitReader`] for bit-addressable decoding and a
//! mirror-image [`BitWriter`] used to build fixtures.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked against the reader's own window.
//! - **No domain knowledge** - This crate knows nothing about frames, messages, or tables.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitWriter, BitReader};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true);
//! writer.write_bits(42, 7).unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bit().unwrap(), true);
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! ```

mod error;
mod reader;
mod width;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::BitReader;
pub use width::{bits_for_count, highest_bit_index};
pub use writer::BitWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roundtrip() {
        let writer = BitWriter::new();
        let bytes = writer.finish();
        assert!(bytes.is_empty());

        let reader = BitReader::new(&bytes);
        assert!(reader.is_empty());
    }

    #[test]
    fn mixed_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b1010, 4).unwrap();
        writer.write_signed(-5, 7).unwrap();
        writer.write_cstring("hello");
        writer.write_f32(1.5);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
        assert_eq!(reader.read_signed(7).unwrap(), -5);
        assert_eq!(reader.read_cstring().unwrap(), "hello");
        assert!((reader.read_f32().unwrap() - 1.5).abs() < f32::EPSILON);
    }
}
