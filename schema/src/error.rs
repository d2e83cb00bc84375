//! Field specification validation errors.

use std::fmt;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when validating a field spec.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Bit width outside `1..=32`.
    InvalidBitWidth { bits: u32 },

    /// Linear quantization range is empty or inverted.
    InvalidRange { low: f32, high: f32 },

    /// Array spec without an element spec.
    MissingArrayElement,

    /// Array spec with a zero element limit.
    EmptyArray,

    /// Array of arrays.
    NestedArray,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBitWidth { bits } => {
                write!(f, "invalid bit width {bits} (must be 1..=32)")
            }
            Self::InvalidRange { low, high } => {
                write!(f, "invalid quantization range [{low}, {high}]")
            }
            Self::MissingArrayElement => write!(f, "array field has no element spec"),
            Self::EmptyArray => write!(f, "array field allows zero elements"),
            Self::NestedArray => write!(f, "array elements cannot themselves be arrays"),
        }
    }
}

impl std::error::Error for SchemaError {}
