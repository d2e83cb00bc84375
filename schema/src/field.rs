//! Field specifications for quantized property decoding.

use crate::error::{SchemaError, SchemaResult};

/// Maximum bit width of a linearly quantized or integer field.
pub const MAX_FIELD_BITS: u32 = 32;

/// Property flags selecting signedness and special float encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropFlags(u32);

impl PropFlags {
    pub const UNSIGNED: Self = Self(1 << 0);
    pub const COORD: Self = Self(1 << 1);
    pub const NO_SCALE: Self = Self(1 << 2);
    pub const ROUND_DOWN: Self = Self(1 << 3);
    pub const ROUND_UP: Self = Self(1 << 4);
    pub const NORMAL: Self = Self(1 << 5);
    pub const EXCLUDE: Self = Self(1 << 6);
    pub const INSIDE_ARRAY: Self = Self(1 << 8);
    pub const COORD_MP: Self = Self(1 << 12);
    pub const COORD_MP_LOW_PRECISION: Self = Self(1 << 13);
    pub const COORD_MP_INTEGRAL: Self = Self(1 << 14);
    pub const CELL_COORD: Self = Self(1 << 15);
    pub const CELL_COORD_LOW_PRECISION: Self = Self(1 << 16);
    pub const CELL_COORD_INTEGRAL: Self = Self(1 << 17);

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates flags from raw bits.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw flag bits.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true if every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of both flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true if any special float encoding flag is set.
    pub const fn is_special_float(self) -> bool {
        const SPECIAL: u32 = PropFlags::COORD.0
            | PropFlags::NO_SCALE.0
            | PropFlags::NORMAL.0
            | PropFlags::COORD_MP.0
            | PropFlags::COORD_MP_LOW_PRECISION.0
            | PropFlags::COORD_MP_INTEGRAL.0
            | PropFlags::CELL_COORD.0
            | PropFlags::CELL_COORD_LOW_PRECISION.0
            | PropFlags::CELL_COORD_INTEGRAL.0;
        self.0 & SPECIAL != 0
    }
}

impl std::ops::BitOr for PropFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// The value shape a field decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    /// Integer, signed unless [`PropFlags::UNSIGNED`].
    Int,
    /// Single float.
    Float,
    /// Two floats (x, y).
    Vector2,
    /// Three floats; z is reconstructed for [`PropFlags::NORMAL`].
    Vector3,
    /// Length-prefixed string.
    String,
    /// Counted run of elements sharing one element spec.
    Array,
}

/// Describes how to decode one numeric field.
///
/// Immutable once built; produced by whatever parses the recording's send
/// tables and consumed by the quantized codecs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub flags: PropFlags,
    /// Bit width of the integer code (linear floats, ints, cell coords).
    pub bits: u32,
    /// Lower bound for linear quantization.
    pub low: f32,
    /// Upper bound for linear quantization.
    pub high: f32,
    /// Maximum element count, arrays only.
    pub max_elements: u32,
    /// Element spec, arrays only.
    pub element: Option<Box<FieldSpec>>,
}

impl FieldSpec {
    /// Creates an integer field.
    #[must_use]
    pub const fn int(bits: u32, flags: PropFlags) -> Self {
        Self::scalar(FieldKind::Int, bits, 0.0, 0.0, flags)
    }

    /// Creates a linearly quantized float over `[low, high]`.
    #[must_use]
    pub const fn float(bits: u32, low: f32, high: f32) -> Self {
        Self::scalar(FieldKind::Float, bits, low, high, PropFlags::empty())
    }

    /// Creates a float decoded with a special encoding selected by `flags`.
    #[must_use]
    pub const fn special_float(flags: PropFlags, bits: u32) -> Self {
        Self::scalar(FieldKind::Float, bits, 0.0, 0.0, flags)
    }

    /// Creates a vector field whose components share one float encoding.
    #[must_use]
    pub const fn vector3(bits: u32, low: f32, high: f32, flags: PropFlags) -> Self {
        Self::scalar(FieldKind::Vector3, bits, low, high, flags)
    }

    /// Creates a two-component vector field.
    #[must_use]
    pub const fn vector2(bits: u32, low: f32, high: f32, flags: PropFlags) -> Self {
        Self::scalar(FieldKind::Vector2, bits, low, high, flags)
    }

    /// Creates a string field.
    #[must_use]
    pub const fn string() -> Self {
        Self::scalar(FieldKind::String, 0, 0.0, 0.0, PropFlags::empty())
    }

    /// Creates an array of up to `max_elements` elements.
    #[must_use]
    pub fn array(element: Self, max_elements: u32) -> Self {
        Self {
            kind: FieldKind::Array,
            flags: PropFlags::empty(),
            bits: 0,
            low: 0.0,
            high: 0.0,
            max_elements,
            element: Some(Box::new(element)),
        }
    }

    /// Replaces the flag set.
    #[must_use]
    pub fn with_flags(mut self, flags: PropFlags) -> Self {
        self.flags = flags;
        self
    }

    const fn scalar(kind: FieldKind, bits: u32, low: f32, high: f32, flags: PropFlags) -> Self {
        Self {
            kind,
            flags,
            bits,
            low,
            high,
            max_elements: 0,
            element: None,
        }
    }

    /// Returns true if the float decode uses linear quantization.
    pub const fn is_linear(&self) -> bool {
        !self.flags.is_special_float()
    }

    /// Checks the spec can be decoded without running off a bit width or range.
    pub fn validate(&self) -> SchemaResult<()> {
        match self.kind {
            FieldKind::Int => Self::check_bits(self.bits),
            FieldKind::Float | FieldKind::Vector2 | FieldKind::Vector3 => {
                if self.is_linear() {
                    Self::check_bits(self.bits)?;
                    if !(self.low < self.high) {
                        return Err(SchemaError::InvalidRange {
                            low: self.low,
                            high: self.high,
                        });
                    }
                } else if self.flags.contains(PropFlags::CELL_COORD)
                    || self.flags.contains(PropFlags::CELL_COORD_LOW_PRECISION)
                    || self.flags.contains(PropFlags::CELL_COORD_INTEGRAL)
                {
                    Self::check_bits(self.bits)?;
                }
                Ok(())
            }
            FieldKind::String => Ok(()),
            FieldKind::Array => {
                let element = self
                    .element
                    .as_deref()
                    .ok_or(SchemaError::MissingArrayElement)?;
                if self.max_elements == 0 {
                    return Err(SchemaError::EmptyArray);
                }
                if element.kind == FieldKind::Array {
                    return Err(SchemaError::NestedArray);
                }
                element.validate()
            }
        }
    }

    fn check_bits(bits: u32) -> SchemaResult<()> {
        if bits == 0 || bits > MAX_FIELD_BITS {
            return Err(SchemaError::InvalidBitWidth { bits });
        }
        Ok(())
    }
}
