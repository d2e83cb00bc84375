//! Demo file framing for the sdem demo decoder.
//!
//! This crate handles the outer layout of a recording: the fixed header, the
//! protocol parameters it implies, and segmentation of the byte stream into
//! typed frames with bounded payloads. It does not look inside message
//! streams or string tables.
//!
//! # Design Principles
//!
//! - **Trustworthy boundaries** - A frame is only yielded once its whole payload is in bounds.
//! - **Bounded decoding** - All length fields are validated against limits before slicing.
//! - **Zero copy** - Payloads borrow from the recording buffer.
//! - **Fail closed** - The first framing error ends segmentation.

mod error;
mod frame;
mod header;
mod limits;
mod protocol;
mod writer;

pub use error::{DecodeError, LimitKind, WireResult};
pub use frame::{CmdInfo, Frame, FrameKind, FramePayload, FrameSegmenter};
pub use header::{
    decode_demo_header, encode_demo_header, DemoHeader, HEADER_SIZE, HEADER_STRING_LEN, MAGIC,
};
pub use limits::Limits;
pub use protocol::{
    ProtocolSettings, SourceGame, CMD_INFO_SIZE, MAX_EDICT_BITS, MAX_USER_DATA_BITS,
    SUB_STRING_BITS,
};
pub use writer::DemoWriter;
