//! Error types for codec operations.

use std::fmt;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding messages, records and tables.
///
/// None of these are fatal on their own: callers decide whether a failure
/// ends one message stream, one table update batch, or the whole recording.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Wire framing error.
    Wire(wire::DecodeError),

    /// Bitstream error (most often a `BufferExhausted`).
    Bitstream(bitstream::BitError),

    /// Field spec cannot be decoded.
    Schema(schema::SchemaError),

    /// Message type code with no known decoder.
    UnknownType { code: u32 },

    /// Table was marked unreadable earlier in the session.
    TableUnreadable { table: String },

    /// No table with this name has been created.
    TableNotFound { table: String },

    /// No table was created with this id.
    TableIdNotFound { id: usize },

    /// Wire encoding this decoder does not handle.
    UnsupportedVariant { what: &'static str },

    /// Name-history reference past the recorded names.
    HistoryIndexOutOfRange { index: usize, len: usize },

    /// Shared-prefix length longer than the referenced name.
    SubstringTooLong { length: usize, name: String },

    /// Update index at or past a table's maximum entry count.
    EntryIndexOutOfRange {
        table: String,
        index: usize,
        len: usize,
    },

    /// Appending would exceed the table's declared maximum.
    TableFull { table: String, max_entries: usize },

    /// Reliable sound carried a sequence number other than zero.
    SoundSequenceMismatch { found: u32 },

    /// Bits left over after a bounded region was fully decoded.
    TrailingBits {
        context: &'static str,
        remaining_bits: usize,
    },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    MessagesPerStream,
    SoundsPerMessage,
    Tables,
    TableEntries,
    TableClasses,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::Bitstream(e) => write!(f, "bitstream error: {e}"),
            Self::Schema(e) => write!(f, "schema error: {e}"),
            Self::UnknownType { code } => write!(f, "unknown message type {code}"),
            Self::TableUnreadable { table } => {
                write!(f, "table {table} is marked unreadable")
            }
            Self::TableNotFound { table } => write!(f, "table {table} was never created"),
            Self::TableIdNotFound { id } => write!(f, "no table with id {id}"),
            Self::UnsupportedVariant { what } => write!(f, "unsupported encoding: {what}"),
            Self::HistoryIndexOutOfRange { index, len } => {
                write!(f, "name history index {index} out of range ({len} names)")
            }
            Self::SubstringTooLong { length, name } => {
                write!(f, "shared prefix of {length} bytes exceeds history name {name:?}")
            }
            Self::EntryIndexOutOfRange { table, index, len } => {
                write!(
                    f,
                    "entry index {index} exceeds the capacity of table {table} ({len} entries)"
                )
            }
            Self::TableFull { table, max_entries } => {
                write!(f, "table {table} is full ({max_entries} entries)")
            }
            Self::SoundSequenceMismatch { found } => {
                write!(f, "expected reliable sound sequence 0, found {found}")
            }
            Self::TrailingBits {
                context,
                remaining_bits,
            } => {
                write!(f, "{remaining_bits} bits left over after {context}")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MessagesPerStream => "messages per stream",
            Self::SoundsPerMessage => "sounds per message",
            Self::Tables => "string tables",
            Self::TableEntries => "table entries",
            Self::TableClasses => "table classes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::Bitstream(e) => Some(e),
            Self::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wire::DecodeError> for CodecError {
    fn from(err: wire::DecodeError) -> Self {
        Self::Wire(err)
    }
}

impl From<bitstream::BitError> for CodecError {
    fn from(err: bitstream::BitError) -> Self {
        Self::Bitstream(err)
    }
}

impl From<schema::SchemaError> for CodecError {
    fn from(err: schema::SchemaError) -> Self {
        Self::Schema(err)
    }
}
