//! Message dispatch: type codes, the message-stream loop, and its recovery.

use std::fmt;

use bitstream::BitReader;
use tracing::{debug, trace};
use wire::ProtocolSettings;

use crate::error::{CodecError, LimitKind};
use crate::payload::{decode_payload, MessagePayload};
use crate::session::DecodeSession;

/// Closed set of message kinds, plus a fallback for unassigned codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MessageKind {
    NetNop,
    NetDisconnect,
    NetFile,
    /// New engine only.
    NetSplitScreenUser,
    NetTick,
    NetStringCmd,
    NetSetConVar,
    NetSignOnState,
    SvcPrint,
    SvcServerInfo,
    SvcSendTable,
    SvcClassInfo,
    SvcSetPause,
    SvcCreateStringTable,
    SvcUpdateStringTable,
    SvcVoiceInit,
    SvcVoiceData,
    SvcSounds,
    SvcSetView,
    SvcFixAngle,
    SvcCrosshairAngle,
    SvcBspDecal,
    /// New engine only.
    SvcSplitScreen,
    SvcUserMessage,
    SvcEntityMessage,
    SvcGameEvent,
    SvcPacketEntities,
    SvcTempEntities,
    SvcPrefetch,
    SvcMenu,
    SvcGameEventList,
    SvcGetCvarValue,
    SvcCmdKeyValues,
    /// New engine only.
    SvcPaintmapData,
    Unknown(u32),
}

/// Codes shared by both engine generations.
const SHARED: [(u32, MessageKind); 24] = [
    (0, MessageKind::NetNop),
    (1, MessageKind::NetDisconnect),
    (2, MessageKind::NetFile),
    (8, MessageKind::SvcServerInfo),
    (9, MessageKind::SvcSendTable),
    (10, MessageKind::SvcClassInfo),
    (11, MessageKind::SvcSetPause),
    (12, MessageKind::SvcCreateStringTable),
    (13, MessageKind::SvcUpdateStringTable),
    (14, MessageKind::SvcVoiceInit),
    (15, MessageKind::SvcVoiceData),
    (17, MessageKind::SvcSounds),
    (18, MessageKind::SvcSetView),
    (19, MessageKind::SvcFixAngle),
    (20, MessageKind::SvcCrosshairAngle),
    (21, MessageKind::SvcBspDecal),
    (23, MessageKind::SvcUserMessage),
    (24, MessageKind::SvcEntityMessage),
    (25, MessageKind::SvcGameEvent),
    (26, MessageKind::SvcPacketEntities),
    (27, MessageKind::SvcTempEntities),
    (28, MessageKind::SvcPrefetch),
    (29, MessageKind::SvcMenu),
    (30, MessageKind::SvcGameEventList),
];

const OLD_ENGINE: [(u32, MessageKind); 7] = [
    (3, MessageKind::NetTick),
    (4, MessageKind::NetStringCmd),
    (5, MessageKind::NetSetConVar),
    (6, MessageKind::NetSignOnState),
    (7, MessageKind::SvcPrint),
    (31, MessageKind::SvcGetCvarValue),
    (32, MessageKind::SvcCmdKeyValues),
];

const NEW_ENGINE: [(u32, MessageKind); 10] = [
    (3, MessageKind::NetSplitScreenUser),
    (4, MessageKind::NetTick),
    (5, MessageKind::NetStringCmd),
    (6, MessageKind::NetSetConVar),
    (7, MessageKind::NetSignOnState),
    (16, MessageKind::SvcPrint),
    (22, MessageKind::SvcSplitScreen),
    (31, MessageKind::SvcGetCvarValue),
    (32, MessageKind::SvcCmdKeyValues),
    (33, MessageKind::SvcPaintmapData),
];

impl MessageKind {
    fn table(settings: &ProtocolSettings) -> impl Iterator<Item = &'static (u32, MessageKind)> {
        let specific: &'static [(u32, MessageKind)] = if settings.new_engine() {
            &NEW_ENGINE
        } else {
            &OLD_ENGINE
        };
        SHARED.iter().chain(specific)
    }

    /// Resolves a type code for the given protocol.
    #[must_use]
    pub fn from_code(code: u32, settings: &ProtocolSettings) -> Self {
        Self::table(settings)
            .find(|(c, _)| *c == code)
            .map_or(Self::Unknown(code), |&(_, kind)| kind)
    }

    /// Returns the type code, if this kind exists on the protocol.
    #[must_use]
    pub fn code(self, settings: &ProtocolSettings) -> Option<u32> {
        if let Self::Unknown(code) = self {
            return Some(code);
        }
        Self::table(settings)
            .find(|(_, kind)| *kind == self)
            .map(|&(code, _)| code)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown({code})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

/// One message: its type code and the payload, if it decoded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MessageRecord {
    pub code: u32,
    pub kind: MessageKind,
    /// `None` when decoding failed or the type is unknown.
    pub payload: Option<MessagePayload>,
}

/// The messages of one packet frame, in recording order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MessageStream {
    pub records: Vec<MessageRecord>,
    /// True when the last record is a truncated or unreadable tail.
    pub ended_in_error: bool,
}

impl MessageStream {
    /// Records that decoded.
    pub fn decoded(&self) -> impl Iterator<Item = (MessageKind, &MessagePayload)> {
        self.records
            .iter()
            .filter_map(|record| record.payload.as_ref().map(|payload| (record.kind, payload)))
    }
}

/// Decodes every message in `reader`.
///
/// The loop stops once fewer bits than a type code remain, or at the first
/// message that fails to decode. A failure appends a `(code, None)` record
/// for the failed message after the records already decoded, adds exactly
/// one diagnostic, and never fails the enclosing frame.
pub fn decode_message_stream(reader: &mut BitReader<'_>, session: &mut DecodeSession) -> MessageStream {
    let type_bits = session.settings.message_type_bits();
    let mut stream = MessageStream::default();

    while reader.bits_remaining() >= type_bits as usize {
        let result = read_message(reader, type_bits, stream.records.len(), session);
        match result {
            Ok(record) => {
                trace!(kind = %record.kind, remaining = reader.bits_remaining(), "message");
                stream.records.push(record);
            }
            Err((code, error)) => {
                let kind = MessageKind::from_code(code, &session.settings);
                session
                    .diagnostics
                    .push(describe_failure(&stream, kind, reader.bits_remaining(), &error));
                stream.records.push(MessageRecord {
                    code,
                    kind,
                    payload: None,
                });
                stream.ended_in_error = true;
                break;
            }
        }
    }

    debug!(
        messages = stream.records.len(),
        ended_in_error = stream.ended_in_error,
        "message stream"
    );
    stream
}

fn read_message(
    reader: &mut BitReader<'_>,
    type_bits: u32,
    decoded: usize,
    session: &mut DecodeSession,
) -> Result<MessageRecord, (u32, CodecError)> {
    let code = reader.read_u32_bits(type_bits).map_err(|e| (0, e.into()))?;
    if decoded >= session.limits.max_messages_per_stream {
        return Err((
            code,
            CodecError::LimitsExceeded {
                kind: LimitKind::MessagesPerStream,
                limit: session.limits.max_messages_per_stream,
                actual: decoded + 1,
            },
        ));
    }
    let kind = MessageKind::from_code(code, &session.settings);
    if let MessageKind::Unknown(code) = kind {
        return Err((code, CodecError::UnknownType { code }));
    }
    let payload = decode_payload(kind, reader, session).map_err(|e| (code, e))?;
    Ok(MessageRecord {
        code,
        kind,
        payload: Some(payload),
    })
}

fn describe_failure(stream: &MessageStream, kind: MessageKind, remaining: usize, error: &CodecError) -> String {
    let last = stream
        .records
        .iter()
        .rev()
        .find(|record| record.kind != MessageKind::NetNop && record.payload.is_some())
        .map(|record| record.kind);
    let position = match last {
        Some(last) => format!("last non-nop message: {last}"),
        None if stream.records.is_empty() => "first message".to_string(),
        None => "no non-nop messages".to_string(),
    };
    let plural = if remaining == 1 { "" } else { "s" };
    match error {
        CodecError::UnknownType { code } => format!(
            "error while decoding message stream, {position}, {remaining} bit{plural} left to read, unknown message type {code}"
        ),
        other => format!(
            "error while decoding message stream, {position}, {remaining} bit{plural} left to read, failed to decode {kind}: {other}"
        ),
    }
}
