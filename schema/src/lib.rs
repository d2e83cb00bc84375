//! Field specifications for the sdem demo decoder.
//!
//! This crate describes how individual numeric fields are laid out on the
//! wire: bit widths, linear quantization ranges, and the special float
//! encodings (coordinates, normals, cell coordinates) selected by flags.
//!
//! # Design Principles
//!
//! - **Description only** - Decoding lives in the codec crate.
//! - **Immutable specs** - A spec is built once and shared read-only.
//! - **Checked up front** - [`FieldSpec::validate`] rejects specs that cannot decode.

mod error;
mod field;

pub use error::{SchemaError, SchemaResult};
pub use field::{FieldKind, FieldSpec, PropFlags, MAX_FIELD_BITS};
