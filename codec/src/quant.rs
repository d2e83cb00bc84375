//! Quantized and special-case numeric codecs.
//!
//! Every routine is a pure function of a field spec and a reader. Widths and
//! resolutions are fixed by the recording format.

use std::fmt;

use bitstream::{bits_for_count, BitReader};
use schema::{FieldKind, FieldSpec, PropFlags};

use crate::error::{CodecError, CodecResult};
use crate::types::Vector3;

/// Integer part width of a plain coordinate.
pub const COORD_INTEGER_BITS: u32 = 14;
/// Fractional part width of a coordinate.
pub const COORD_FRACTIONAL_BITS: u32 = 5;
/// Fractional part width of a low-precision coordinate.
pub const COORD_FRACTIONAL_BITS_LOW_PRECISION: u32 = 3;
/// Integer part width of a bounded coordinate inside the normal world bounds.
pub const COORD_INTEGER_BITS_MP: u32 = 11;
/// Fractional magnitude width of a normal component.
pub const NORMAL_FRACTIONAL_BITS: u32 = 11;
/// Length prefix width of a string field.
pub const STRING_LENGTH_BITS: u32 = 9;

const COORD_RESOLUTION: f32 = 1.0 / (1 << COORD_FRACTIONAL_BITS) as f32;
const COORD_RESOLUTION_LOW_PRECISION: f32 = 1.0 / (1 << COORD_FRACTIONAL_BITS_LOW_PRECISION) as f32;
const NORMAL_RESOLUTION: f32 = 1.0 / ((1 << NORMAL_FRACTIONAL_BITS) - 1) as f32;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldValue {
    Int(i64),
    Float(f32),
    Vector2([f32; 2]),
    Vector3(Vector3),
    String(String),
    Array(Vec<FieldValue>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Vector2([x, y]) => write!(f, "({x:.3}, {y:.3})"),
            Self::Vector3(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Decodes `low + (high - low) * u / (2^bits - 1)` from a `bits`-wide code.
pub fn read_linear_float(reader: &mut BitReader<'_>, bits: u32, low: f32, high: f32) -> CodecResult<f32> {
    let code = reader.read_u32_bits(bits)?;
    Ok(dequantize(code, bits, low, high))
}

/// Maps a linear code back into `[low, high]`.
#[must_use]
pub fn dequantize(code: u32, bits: u32, low: f32, high: f32) -> f32 {
    if bits == 0 {
        return low;
    }
    let steps = ((1u64 << bits) - 1) as f64;
    let fraction = f64::from(code) / steps;
    (f64::from(low) + (f64::from(high) - f64::from(low)) * fraction) as f32
}

/// Decodes a plain world coordinate.
pub fn read_bit_coord(reader: &mut BitReader<'_>) -> CodecResult<f32> {
    let has_int = reader.read_bit()?;
    let has_fract = reader.read_bit()?;
    if !has_int && !has_fract {
        return Ok(0.0);
    }
    let negative = reader.read_bit()?;
    let mut value = 0.0;
    if has_int {
        value += (reader.read_u32_bits(COORD_INTEGER_BITS)? + 1) as f32;
    }
    if has_fract {
        value += reader.read_u32_bits(COORD_FRACTIONAL_BITS)? as f32 * COORD_RESOLUTION;
    }
    Ok(if negative { -value } else { value })
}

/// Decodes a bounded coordinate.
///
/// A leading bit narrows the integer part when the value lies inside the
/// normal world bounds. Integral coordinates carry no fractional part.
pub fn read_bit_coord_mp(
    reader: &mut BitReader<'_>,
    integral: bool,
    low_precision: bool,
) -> CodecResult<f32> {
    let in_bounds = reader.read_bit()?;
    let int_bits = if in_bounds {
        COORD_INTEGER_BITS_MP
    } else {
        COORD_INTEGER_BITS
    };

    if integral {
        if !reader.read_bit()? {
            return Ok(0.0);
        }
        let negative = reader.read_bit()?;
        let value = (reader.read_u32_bits(int_bits)? + 1) as f32;
        return Ok(if negative { -value } else { value });
    }

    let has_int = reader.read_bit()?;
    let negative = reader.read_bit()?;
    let mut value = 0.0;
    if has_int {
        value += (reader.read_u32_bits(int_bits)? + 1) as f32;
    }
    value += read_fraction(reader, low_precision)?;
    Ok(if negative { -value } else { value })
}

/// Decodes one component of a unit vector.
pub fn read_bit_normal(reader: &mut BitReader<'_>) -> CodecResult<f32> {
    let negative = reader.read_bit()?;
    let value = reader.read_u32_bits(NORMAL_FRACTIONAL_BITS)? as f32 * NORMAL_RESOLUTION;
    Ok(if negative { -value } else { value })
}

/// Decodes a coordinate relative to its spatial cell.
pub fn read_bit_cell_coord(
    reader: &mut BitReader<'_>,
    bits: u32,
    integral: bool,
    low_precision: bool,
) -> CodecResult<f32> {
    let int_part = reader.read_u32_bits(bits)? as f32;
    if integral {
        return Ok(int_part);
    }
    Ok(int_part + read_fraction(reader, low_precision)?)
}

/// Decodes an angle in degrees from a `bits`-wide code.
pub fn read_bit_angle(reader: &mut BitReader<'_>, bits: u32) -> CodecResult<f32> {
    let code = reader.read_u32_bits(bits)?;
    Ok((f64::from(code) * 360.0 / (1u64 << bits) as f64) as f32)
}

/// Decodes three coordinates, each behind its own presence bit.
pub fn read_vector_coord(reader: &mut BitReader<'_>) -> CodecResult<Vector3> {
    let has_x = reader.read_bit()?;
    let has_y = reader.read_bit()?;
    let has_z = reader.read_bit()?;
    let mut axis = |present: bool| -> CodecResult<f32> {
        if present {
            read_bit_coord(reader)
        } else {
            Ok(0.0)
        }
    };
    Ok(Vector3::new(axis(has_x)?, axis(has_y)?, axis(has_z)?))
}

/// Rebuilds the third component of a unit vector from the first two.
///
/// Returns zero when `x² + y²` already exceeds one.
#[must_use]
pub fn reconstruct_normal_z(x: f32, y: f32, negative: bool) -> f32 {
    let planar = x * x + y * y;
    let z = if planar < 1.0 { (1.0 - planar).sqrt() } else { 0.0 };
    if negative {
        -z
    } else {
        z
    }
}

/// Decodes a float with the encoding `spec.flags` selects.
///
/// Cell coordinates only exist on the new protocol; older recordings fall
/// through to linear quantization for those flags.
pub fn decode_float(reader: &mut BitReader<'_>, spec: &FieldSpec, new_protocol: bool) -> CodecResult<f32> {
    let flags = spec.flags;
    if flags.contains(PropFlags::COORD) {
        read_bit_coord(reader)
    } else if flags.contains(PropFlags::COORD_MP) {
        read_bit_coord_mp(reader, false, false)
    } else if flags.contains(PropFlags::COORD_MP_LOW_PRECISION) {
        read_bit_coord_mp(reader, false, true)
    } else if flags.contains(PropFlags::COORD_MP_INTEGRAL) {
        read_bit_coord_mp(reader, true, false)
    } else if flags.contains(PropFlags::NO_SCALE) {
        Ok(reader.read_f32()?)
    } else if flags.contains(PropFlags::NORMAL) {
        read_bit_normal(reader)
    } else if new_protocol && flags.contains(PropFlags::CELL_COORD) {
        read_bit_cell_coord(reader, spec.bits, false, false)
    } else if new_protocol && flags.contains(PropFlags::CELL_COORD_LOW_PRECISION) {
        read_bit_cell_coord(reader, spec.bits, false, true)
    } else if new_protocol && flags.contains(PropFlags::CELL_COORD_INTEGRAL) {
        read_bit_cell_coord(reader, spec.bits, true, false)
    } else {
        read_linear_float(reader, spec.bits, spec.low, spec.high)
    }
}

/// Decodes one field of any kind.
pub fn decode_field(reader: &mut BitReader<'_>, spec: &FieldSpec, new_protocol: bool) -> CodecResult<FieldValue> {
    match spec.kind {
        FieldKind::Int => {
            let value = if spec.flags.contains(PropFlags::UNSIGNED) {
                reader.read_bits(spec.bits)? as i64
            } else {
                reader.read_signed(spec.bits)?
            };
            Ok(FieldValue::Int(value))
        }
        FieldKind::Float => decode_float(reader, spec, new_protocol).map(FieldValue::Float),
        FieldKind::Vector2 => {
            let x = decode_float(reader, spec, new_protocol)?;
            let y = decode_float(reader, spec, new_protocol)?;
            Ok(FieldValue::Vector2([x, y]))
        }
        FieldKind::Vector3 => {
            let x = decode_float(reader, spec, new_protocol)?;
            let y = decode_float(reader, spec, new_protocol)?;
            let z = if spec.flags.contains(PropFlags::NORMAL) {
                let negative = reader.read_bit()?;
                reconstruct_normal_z(x, y, negative)
            } else {
                decode_float(reader, spec, new_protocol)?
            };
            Ok(FieldValue::Vector3(Vector3::new(x, y, z)))
        }
        FieldKind::String => {
            let len = reader.read_bits(STRING_LENGTH_BITS)? as usize;
            Ok(FieldValue::String(reader.read_string_of_length(len)?))
        }
        FieldKind::Array => {
            let element = spec
                .element
                .as_deref()
                .ok_or(CodecError::Schema(schema::SchemaError::MissingArrayElement))?;
            let count = reader.read_bits(bits_for_count(spec.max_elements))? as usize;
            let mut items = Vec::with_capacity(count.min(spec.max_elements as usize));
            for _ in 0..count {
                items.push(decode_field(reader, element, new_protocol)?);
            }
            Ok(FieldValue::Array(items))
        }
    }
}

fn read_fraction(reader: &mut BitReader<'_>, low_precision: bool) -> CodecResult<f32> {
    let (bits, resolution) = if low_precision {
        (COORD_FRACTIONAL_BITS_LOW_PRECISION, COORD_RESOLUTION_LOW_PRECISION)
    } else {
        (COORD_FRACTIONAL_BITS, COORD_RESOLUTION)
    };
    Ok(reader.read_u32_bits(bits)? as f32 * resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::BitWriter;

    fn reader_for(build: impl FnOnce(&mut BitWriter)) -> Vec<u8> {
        let mut writer = BitWriter::new();
        build(&mut writer);
        writer.finish()
    }

    #[test]
    fn coord_absent_parts_is_zero() {
        let bytes = reader_for(|w| {
            w.write_bit(false);
            w.write_bit(false);
        });
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_bit_coord(&mut reader).unwrap(), 0.0);
        assert_eq!(reader.bit_position(), 2);
    }

    #[test]
    fn coord_negative_with_fraction() {
        // -(12 + 8/32)
        let bytes = reader_for(|w| {
            w.write_bit(true);
            w.write_bit(true);
            w.write_bit(true);
            w.write_bits(11, COORD_INTEGER_BITS).unwrap();
            w.write_bits(8, COORD_FRACTIONAL_BITS).unwrap();
        });
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_bit_coord(&mut reader).unwrap(), -12.25);
    }

    #[test]
    fn coord_mp_in_bounds_uses_narrow_integer() {
        let bytes = reader_for(|w| {
            w.write_bit(true); // in bounds
            w.write_bit(true); // has int
            w.write_bit(false); // positive
            w.write_bits(99, COORD_INTEGER_BITS_MP).unwrap();
            w.write_bits(4, COORD_FRACTIONAL_BITS).unwrap();
        });
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_bit_coord_mp(&mut reader, false, false).unwrap(), 100.125);
        assert!(reader.bits_remaining() < 8);
    }

    #[test]
    fn coord_mp_low_precision_fraction() {
        let bytes = reader_for(|w| {
            w.write_bit(false); // out of bounds
            w.write_bit(false); // no int
            w.write_bit(true); // negative
            w.write_bits(3, COORD_FRACTIONAL_BITS_LOW_PRECISION).unwrap();
        });
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_bit_coord_mp(&mut reader, false, true).unwrap(), -0.375);
    }

    #[test]
    fn coord_mp_integral() {
        let bytes = reader_for(|w| {
            w.write_bit(false); // out of bounds
            w.write_bit(true); // has value
            w.write_bit(true); // negative
            w.write_bits(4999, COORD_INTEGER_BITS).unwrap();
        });
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_bit_coord_mp(&mut reader, true, false).unwrap(), -5000.0);

        let bytes = reader_for(|w| {
            w.write_bit(true);
            w.write_bit(false);
        });
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_bit_coord_mp(&mut reader, true, false).unwrap(), 0.0);
        assert_eq!(reader.bit_position(), 2);
    }

    #[test]
    fn normal_component_full_scale() {
        let bytes = reader_for(|w| {
            w.write_bit(true);
            w.write_bits(2047, NORMAL_FRACTIONAL_BITS).unwrap();
        });
        let mut reader = BitReader::new(&bytes);
        assert!((read_bit_normal(&mut reader).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cell_coord_variants() {
        let bytes = reader_for(|w| {
            w.write_bits(7, 6).unwrap();
            w.write_bits(16, COORD_FRACTIONAL_BITS).unwrap();
            w.write_bits(7, 6).unwrap();
            w.write_bits(4, COORD_FRACTIONAL_BITS_LOW_PRECISION).unwrap();
            w.write_bits(7, 6).unwrap();
        });
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_bit_cell_coord(&mut reader, 6, false, false).unwrap(), 7.5);
        assert_eq!(read_bit_cell_coord(&mut reader, 6, false, true).unwrap(), 7.5);
        assert_eq!(read_bit_cell_coord(&mut reader, 6, true, false).unwrap(), 7.0);
    }

    #[test]
    fn angle_scales_to_degrees() {
        let bytes = reader_for(|w| w.write_bits(1 << 15, 16).unwrap());
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_bit_angle(&mut reader, 16).unwrap(), 180.0);
    }

    #[test]
    fn linear_endpoints() {
        assert_eq!(dequantize(0, 8, -10.0, 10.0), -10.0);
        assert_eq!(dequantize(255, 8, -10.0, 10.0), 10.0);
        assert_eq!(dequantize(u32::MAX, 32, 0.0, 1.0), 1.0);
    }

    #[test]
    fn cell_coord_ignored_on_old_protocol() {
        let spec = FieldSpec::special_float(PropFlags::CELL_COORD_INTEGRAL, 4);
        let bytes = [0x0F];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(decode_float(&mut reader, &spec, true).unwrap(), 15.0);

        // Old protocol: linear over [0, 0]
        let mut reader = BitReader::new(&bytes);
        assert_eq!(decode_float(&mut reader, &spec, false).unwrap(), 0.0);
    }

    #[test]
    fn coord_takes_precedence_over_normal() {
        let spec = FieldSpec::special_float(PropFlags::COORD | PropFlags::NORMAL, 0);
        let bytes = [0u8];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(decode_float(&mut reader, &spec, false).unwrap(), 0.0);
        assert_eq!(reader.bit_position(), 2);
    }

    #[test]
    fn normal_vector_reads_sign_not_z() {
        let spec = FieldSpec::vector3(0, 0.0, 0.0, PropFlags::NORMAL);
        let bytes = reader_for(|w| {
            w.write_bit(false);
            w.write_bits(0, NORMAL_FRACTIONAL_BITS).unwrap();
            w.write_bit(false);
            w.write_bits(0, NORMAL_FRACTIONAL_BITS).unwrap();
            w.write_bit(true);
        });
        let mut reader = BitReader::new(&bytes);
        let value = decode_field(&mut reader, &spec, false).unwrap();
        assert_eq!(value, FieldValue::Vector3(Vector3::new(0.0, 0.0, -1.0)));
        assert_eq!(reader.bit_position(), 25);
    }

    #[test]
    fn int_signedness_follows_flag() {
        let bytes = [0xFF];
        let mut reader = BitReader::new(&bytes);
        let signed = decode_field(&mut reader, &FieldSpec::int(8, PropFlags::empty()), false);
        assert_eq!(signed.unwrap(), FieldValue::Int(-1));
        let mut reader = BitReader::new(&bytes);
        let unsigned = decode_field(&mut reader, &FieldSpec::int(8, PropFlags::UNSIGNED), false);
        assert_eq!(unsigned.unwrap(), FieldValue::Int(255));
    }

    #[test]
    fn string_field_is_length_prefixed() {
        let bytes = reader_for(|w| {
            w.write_bits(3, STRING_LENGTH_BITS).unwrap();
            w.write_bytes(b"abc");
        });
        let mut reader = BitReader::new(&bytes);
        let value = decode_field(&mut reader, &FieldSpec::string(), false).unwrap();
        assert_eq!(value, FieldValue::String("abc".to_string()));
    }

    #[test]
    fn array_count_width_from_max() {
        // max 5 -> 3 count bits
        let spec = FieldSpec::array(FieldSpec::int(4, PropFlags::UNSIGNED), 5);
        let bytes = reader_for(|w| {
            w.write_bits(2, 3).unwrap();
            w.write_bits(9, 4).unwrap();
            w.write_bits(3, 4).unwrap();
        });
        let mut reader = BitReader::new(&bytes);
        let value = decode_field(&mut reader, &spec, false).unwrap();
        assert_eq!(
            value,
            FieldValue::Array(vec![FieldValue::Int(9), FieldValue::Int(3)])
        );
        assert_eq!(value.to_string(), "[9, 3]");
    }

    #[test]
    fn truncated_field_is_buffer_exhausted() {
        let bytes = [0b11];
        let mut reader = BitReader::with_bit_len(&bytes, 3);
        let err = read_bit_coord(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Bitstream(bitstream::BitError::BufferExhausted { .. })
        ));
    }
}
