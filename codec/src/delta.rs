//! Field-or-inherit decoding for delta-compressed records.
//!
//! Each field of a delta record is preceded by a selector read from the
//! stream. An absent field is copied from the baseline, the record decoded
//! just before it in the same chain. The first record of a chain decodes
//! against a type-defined default.

use bitstream::{BitReader, BitResult};
use wire::ProtocolSettings;

use crate::error::CodecResult;

/// A record decoded relative to a baseline of the same type.
pub trait DeltaRecord: Sized + Clone {
    /// The baseline the first record of a chain decodes against.
    fn default_baseline(settings: &ProtocolSettings) -> Self;

    /// Decodes one record, inheriting absent fields from `baseline`.
    fn decode_delta(
        reader: &mut BitReader<'_>,
        baseline: &Self,
        settings: &ProtocolSettings,
    ) -> CodecResult<Self>;
}

/// Decodes `count` chained records starting from `baseline`.
///
/// Every decoded record becomes the baseline of the next. On failure the
/// records decoded so far are dropped with the error.
pub fn decode_chain<R: DeltaRecord>(
    reader: &mut BitReader<'_>,
    count: usize,
    baseline: R,
    settings: &ProtocolSettings,
) -> CodecResult<Vec<R>> {
    let mut records = Vec::with_capacity(count.min(256));
    let mut previous = baseline;
    for _ in 0..count {
        let record = R::decode_delta(reader, &previous, settings)?;
        records.push(record.clone());
        previous = record;
    }
    Ok(records)
}

/// Reads a presence bit, then a fresh value if set; otherwise inherits.
pub fn read_or<T>(
    reader: &mut BitReader<'_>,
    inherited: T,
    read: impl FnOnce(&mut BitReader<'_>) -> BitResult<T>,
) -> BitResult<T> {
    if reader.read_bit()? {
        read(reader)
    } else {
        Ok(inherited)
    }
}

/// Reads a counter through a three-way selector: copy, copy plus one, or a
/// fresh `bits`-wide value.
pub fn read_counter(reader: &mut BitReader<'_>, inherited: u32, bits: u32) -> BitResult<u32> {
    if reader.read_bit()? {
        Ok(inherited)
    } else if reader.read_bit()? {
        Ok(inherited.wrapping_add(1))
    } else {
        reader.read_u32_bits(bits)
    }
}
