//! Whole-recording decode: frame routing and the session-fatal boundary.

use std::fmt;

use bitstream::BitReader;
use tracing::{debug, error};
use wire::{decode_demo_header, CmdInfo, DemoHeader, FrameKind, FramePayload, FrameSegmenter, Limits, ProtocolSettings};

use crate::delta::DeltaRecord;
use crate::error::{CodecError, CodecResult};
use crate::limits::DecodeLimits;
use crate::message::{decode_message_stream, MessageStream};
use crate::payload::BitBlob;
use crate::session::{DecodeSession, Diagnostics};
use crate::snapshot::{decode_string_tables, StringTablesSnapshot};
use crate::stringtable::StringTableReplica;
use crate::usercmd::UserCmd;

/// `CustomData` type carrying a menu callback.
const CUSTOM_DATA_MENU_CALLBACK: i32 = 0;

/// Decoded contents of a `CustomData` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CustomData {
    MenuCallback { unknown: i32, callback: String },
    Raw(Vec<u8>),
}

/// A frame's decoded payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FrameBody {
    Packet {
        cmd_info: Vec<CmdInfo>,
        in_sequence: u32,
        out_sequence: u32,
        messages: MessageStream,
    },
    SyncTick,
    ConsoleCmd(String),
    UserCmd {
        command_number: u32,
        /// `None` when the command failed to decode.
        command: Option<UserCmd>,
    },
    DataTables(BitBlob),
    CustomData {
        data_type: i32,
        data: CustomData,
    },
    /// `None` when the dump failed to decode.
    StringTables(Option<StringTablesSnapshot>),
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedFrame {
    pub kind: FrameKind,
    pub tick: i32,
    pub player_slot: Option<u8>,
    pub body: FrameBody,
}

impl fmt::Display for DecodedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.tick, self.kind)?;
        match &self.body {
            FrameBody::Packet { messages, .. } => {
                write!(f, ", {} messages", messages.records.len())?;
                if messages.ended_in_error {
                    f.write_str(" (ended in error)")?;
                }
                Ok(())
            }
            FrameBody::ConsoleCmd(command) => write!(f, ": {command}"),
            FrameBody::UserCmd { command_number, .. } => write!(f, " #{command_number}"),
            FrameBody::DataTables(data) => write!(f, ", {data}"),
            FrameBody::CustomData { data_type, .. } => write!(f, " type {data_type}"),
            FrameBody::StringTables(Some(snapshot)) => write!(f, ", {} tables", snapshot.tables.len()),
            FrameBody::StringTables(None) => f.write_str(", unreadable"),
            FrameBody::SyncTick | FrameBody::Stop => Ok(()),
        }
    }
}

/// Everything decoded from one recording.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedDemo {
    pub header: DemoHeader,
    pub settings: ProtocolSettings,
    pub frames: Vec<DecodedFrame>,
    pub tables: StringTableReplica,
    pub diagnostics: Diagnostics,
    /// The frame-level error that ended decoding early, if any.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_display"))]
    pub fatal: Option<CodecError>,
}

#[cfg(feature = "serde")]
fn serialize_display<S: serde::Serializer>(value: &Option<CodecError>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(error) => serializer.collect_str(error),
        None => serializer.serialize_none(),
    }
}

/// Incremental decoder over one recording.
///
/// Yields frames in recording order. Errors returned from
/// [`next_frame`](Self::next_frame) are session-fatal: the segmenter yields
/// nothing after them.
#[derive(Debug)]
pub struct DemoDecoder<'a> {
    header: DemoHeader,
    segmenter: FrameSegmenter<'a>,
    session: DecodeSession,
}

impl<'a> DemoDecoder<'a> {
    /// Decodes the header and prepares to walk the frames after it.
    pub fn new(buf: &'a [u8], wire_limits: &Limits, limits: &DecodeLimits) -> CodecResult<Self> {
        let header = decode_demo_header(buf)?;
        let segmenter = FrameSegmenter::new(buf, &header, wire_limits)?;
        let settings = *segmenter.settings();
        debug!(
            demo_protocol = header.demo_protocol,
            network_protocol = header.network_protocol,
            game = ?settings.game,
            "demo header"
        );
        Ok(Self {
            header,
            segmenter,
            session: DecodeSession::new(settings, limits.clone()),
        })
    }

    #[must_use]
    pub fn header(&self) -> &DemoHeader {
        &self.header
    }

    #[must_use]
    pub fn session(&self) -> &DecodeSession {
        &self.session
    }

    #[must_use]
    pub fn into_session(self) -> DecodeSession {
        self.session
    }

    /// Decodes the next frame, or returns `None` after the last one.
    pub fn next_frame(&mut self) -> CodecResult<Option<DecodedFrame>> {
        let Some(frame) = self.segmenter.next_frame()? else {
            return Ok(None);
        };
        let body = decode_frame_body(frame.tick, frame.payload, &mut self.session);
        debug!(kind = %frame.kind, tick = frame.tick, "frame");
        Ok(Some(DecodedFrame {
            kind: frame.kind,
            tick: frame.tick,
            player_slot: frame.player_slot,
            body,
        }))
    }
}

/// Decodes a whole recording.
///
/// Only a bad header fails the call. A frame-level error stops decoding and
/// is returned in [`DecodedDemo::fatal`] along with every frame before it.
pub fn decode_demo(buf: &[u8], wire_limits: &Limits, limits: &DecodeLimits) -> CodecResult<DecodedDemo> {
    let mut decoder = DemoDecoder::new(buf, wire_limits, limits)?;
    let mut frames = Vec::new();
    let fatal = loop {
        match decoder.next_frame() {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => break None,
            Err(e) => {
                error!(frames = frames.len(), "demo decoding stopped: {e}");
                break Some(e);
            }
        }
    };
    let header = decoder.header.clone();
    let session = decoder.into_session();
    Ok(DecodedDemo {
        header,
        settings: session.settings,
        frames,
        tables: session.tables,
        diagnostics: session.diagnostics,
        fatal,
    })
}

fn decode_frame_body(tick: i32, payload: FramePayload<'_>, session: &mut DecodeSession) -> FrameBody {
    match payload {
        FramePayload::Packet {
            cmd_info,
            in_sequence,
            out_sequence,
            messages,
        } => {
            let mut reader = BitReader::new(messages);
            FrameBody::Packet {
                cmd_info,
                in_sequence,
                out_sequence,
                messages: decode_message_stream(&mut reader, session),
            }
        }
        FramePayload::SyncTick => FrameBody::SyncTick,
        FramePayload::ConsoleCmd(bytes) => FrameBody::ConsoleCmd(until_nul(bytes)),
        FramePayload::UserCmd { command_number, data } => {
            let mut reader = BitReader::new(data);
            let command = match UserCmd::decode_delta(&mut reader, &session.user_cmd_baseline, &session.settings) {
                Ok(command) => {
                    session.user_cmd_baseline = command.clone();
                    Some(command)
                }
                Err(e) => {
                    session.diagnostics.push(format!(
                        "error while decoding user command {command_number} at tick {tick}: {e} ({} bits left)",
                        reader.bits_remaining()
                    ));
                    None
                }
            };
            FrameBody::UserCmd { command_number, command }
        }
        FramePayload::DataTables(bytes) => FrameBody::DataTables(BitBlob {
            bit_len: bytes.len() * 8,
            bytes: bytes.to_vec(),
        }),
        FramePayload::CustomData { data_type, data } => FrameBody::CustomData {
            data_type,
            data: decode_custom_data(data_type, data),
        },
        FramePayload::StringTables(bytes) => FrameBody::StringTables(decode_string_tables_frame(tick, bytes, session)),
        FramePayload::Stop => FrameBody::Stop,
    }
}

fn decode_string_tables_frame(tick: i32, bytes: &[u8], session: &mut DecodeSession) -> Option<StringTablesSnapshot> {
    let mut reader = BitReader::new(bytes);
    match decode_string_tables(&mut reader, &session.limits) {
        Ok(snapshot) => {
            let (tables, mut ctx) = session.table_context();
            tables.apply_full_snapshot(&snapshot, &mut ctx);
            Some(snapshot)
        }
        Err(e) => {
            session.diagnostics.push(format!(
                "error while decoding string tables frame at tick {tick}: {e} ({} bits left)",
                reader.bits_remaining()
            ));
            session.tables.mark_all_unreadable();
            None
        }
    }
}

fn decode_custom_data(data_type: i32, data: &[u8]) -> CustomData {
    if data_type == CUSTOM_DATA_MENU_CALLBACK {
        let mut reader = BitReader::new(data);
        if let (Ok(unknown), Ok(callback)) = (reader.read_i32(), reader.read_cstring()) {
            return CustomData::MenuCallback { unknown, callback };
        }
    }
    CustomData::Raw(data.to_vec())
}

fn until_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
