//! Error types for demo framing.

use std::fmt;

use crate::frame::FrameKind;

/// Result type for framing operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Framing errors. Every one of these ends the walk over the recording:
/// once a frame boundary is untrustworthy nothing after it can be located.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Buffer is too small to contain the demo header.
    DemoTooSmall { actual: usize, required: usize },

    /// Header does not start with `HL2DEMO\0`.
    InvalidMagic { found: [u8; 8] },

    /// Frame type byte has no meaning for this protocol.
    UnknownFrameType { code: u8, offset: usize },

    /// A frame's header or computed payload runs past the end of the buffer.
    FrameLengthOverrun {
        kind: Option<FrameKind>,
        tick: Option<i32>,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific framing limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    DemoBytes,
    FrameCount,
    FrameBytes,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DemoTooSmall { actual, required } => {
                write!(f, "demo too small: {actual} bytes, need at least {required}")
            }
            Self::InvalidMagic { found } => {
                write!(f, "invalid demo magic: {:?}", String::from_utf8_lossy(found))
            }
            Self::UnknownFrameType { code, offset } => {
                write!(f, "unknown frame type {code} at byte {offset}")
            }
            Self::FrameLengthOverrun {
                kind,
                tick,
                offset,
                needed,
                available,
            } => {
                match kind {
                    Some(kind) => write!(f, "{kind} frame")?,
                    None => write!(f, "frame header")?,
                }
                if let Some(tick) = tick {
                    write!(f, " on tick {tick}")?;
                }
                write!(
                    f,
                    " at byte {offset} needs {needed} bytes but only {available} remain"
                )
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
            Self::DemoBytes => "demo bytes",
            Self::FrameCount => "frame count",
            Self::FrameBytes => "frame bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for DecodeError {}
