//! Frame segmentation: carving the recording into typed, bounded payloads.

use std::fmt;

use crate::error::{DecodeError, LimitKind, WireResult};
use crate::header::{DemoHeader, HEADER_SIZE};
use crate::limits::Limits;
use crate::protocol::{ProtocolSettings, CMD_INFO_SIZE};

/// Outer frame types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FrameKind {
    SignOn,
    Packet,
    SyncTick,
    ConsoleCmd,
    UserCmd,
    DataTables,
    Stop,
    /// New engine only.
    CustomData,
    StringTables,
}

impl FrameKind {
    /// Resolves a frame type byte for the given protocol.
    #[must_use]
    pub const fn from_code(code: u8, settings: &ProtocolSettings) -> Option<Self> {
        match code {
            1 => Some(Self::SignOn),
            2 => Some(Self::Packet),
            3 => Some(Self::SyncTick),
            4 => Some(Self::ConsoleCmd),
            5 => Some(Self::UserCmd),
            6 => Some(Self::DataTables),
            7 => Some(Self::Stop),
            8 if settings.new_engine() => Some(Self::CustomData),
            8 => Some(Self::StringTables),
            9 if settings.new_engine() => Some(Self::StringTables),
            _ => None,
        }
    }

    /// Returns the frame type byte, if this kind exists on the protocol.
    #[must_use]
    pub const fn code(self, settings: &ProtocolSettings) -> Option<u8> {
        match self {
            Self::SignOn => Some(1),
            Self::Packet => Some(2),
            Self::SyncTick => Some(3),
            Self::ConsoleCmd => Some(4),
            Self::UserCmd => Some(5),
            Self::DataTables => Some(6),
            Self::Stop => Some(7),
            Self::CustomData if settings.new_engine() => Some(8),
            Self::CustomData => None,
            Self::StringTables if settings.new_engine() => Some(9),
            Self::StringTables => Some(8),
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-player view information recorded with every packet frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CmdInfo {
    pub flags: u32,
    pub view_origin: [f32; 3],
    pub view_angles: [f32; 3],
    pub local_view_angles: [f32; 3],
    pub view_origin_2: [f32; 3],
    pub view_angles_2: [f32; 3],
    pub local_view_angles_2: [f32; 3],
}

impl CmdInfo {
    /// Parses one block; `bytes` must be exactly [`CMD_INFO_SIZE`] long.
    fn parse(bytes: &[u8]) -> Self {
        let vec3 = |at: usize| [le_f32(bytes, at), le_f32(bytes, at + 4), le_f32(bytes, at + 8)];
        Self {
            flags: le_u32(bytes, 0),
            view_origin: vec3(4),
            view_angles: vec3(16),
            local_view_angles: vec3(28),
            view_origin_2: vec3(40),
            view_angles_2: vec3(52),
            local_view_angles_2: vec3(64),
        }
    }
}

/// A frame's payload, borrowed from the recording buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload<'a> {
    /// `SignOn` and `Packet` frames: view info, sequence numbers, message stream bytes.
    Packet {
        cmd_info: Vec<CmdInfo>,
        in_sequence: u32,
        out_sequence: u32,
        messages: &'a [u8],
    },
    SyncTick,
    ConsoleCmd(&'a [u8]),
    UserCmd { command_number: u32, data: &'a [u8] },
    DataTables(&'a [u8]),
    CustomData { data_type: i32, data: &'a [u8] },
    StringTables(&'a [u8]),
    Stop,
}

/// One frame of the recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<'a> {
    pub kind: FrameKind,
    pub tick: i32,
    /// New engine only.
    pub player_slot: Option<u8>,
    /// Byte offset of the frame's type byte.
    pub offset: usize,
    pub payload: FramePayload<'a>,
}

/// Walks the frames following the demo header.
///
/// Frames are yielded in recording order. The walk ends after a `Stop`
/// frame, at the end of the buffer, or at the first framing error; after an
/// error the segmenter yields nothing further.
#[derive(Debug, Clone)]
pub struct FrameSegmenter<'a> {
    buf: &'a [u8],
    settings: ProtocolSettings,
    limits: Limits,
    header_tick_count: i32,
    offset: usize,
    frames: usize,
    done: bool,
}

impl<'a> FrameSegmenter<'a> {
    /// Creates a segmenter over a whole recording whose header was already decoded.
    pub fn new(buf: &'a [u8], header: &DemoHeader, limits: &Limits) -> WireResult<Self> {
        if buf.len() > limits.max_demo_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::DemoBytes,
                limit: limits.max_demo_bytes,
                actual: buf.len(),
            });
        }
        Ok(Self {
            buf,
            settings: ProtocolSettings::from_header(header),
            limits: limits.clone(),
            header_tick_count: header.tick_count,
            offset: HEADER_SIZE.min(buf.len()),
            frames: 0,
            done: false,
        })
    }

    /// Protocol settings the segmenter was built with.
    #[must_use]
    pub const fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    /// Byte offset of the next frame.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Carves out the next frame, or `None` once the walk has ended.
    pub fn next_frame(&mut self) -> WireResult<Option<Frame<'a>>> {
        if self.done || self.offset >= self.buf.len() {
            self.done = true;
            return Ok(None);
        }
        if self.frames >= self.limits.max_frames {
            self.done = true;
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::FrameCount,
                limit: self.limits.max_frames,
                actual: self.frames + 1,
            });
        }
        match self.carve() {
            Ok(frame) => {
                self.frames += 1;
                if frame.kind == FrameKind::Stop {
                    self.done = true;
                }
                Ok(Some(frame))
            }
            Err(err) => {
                self.done = true;
                Err(err)
            }
        }
    }

    fn carve(&mut self) -> WireResult<Frame<'a>> {
        let start = self.offset;
        let code = self.buf[start];
        let kind = FrameKind::from_code(code, &self.settings).ok_or(
            DecodeError::UnknownFrameType {
                code,
                offset: start,
            },
        )?;

        if kind == FrameKind::Stop && !self.settings.new_engine() {
            // Old-engine recordings cut the stop frame short; its tick is the header's.
            self.offset = self.buf.len();
            return Ok(Frame {
                kind,
                tick: self.header_tick_count,
                player_slot: None,
                offset: start,
                payload: FramePayload::Stop,
            });
        }

        let header_len = if self.settings.has_player_slot() { 6 } else { 5 };
        self.need(start, header_len, None, None)?;
        let tick = le_i32(self.buf, start + 1);
        let player_slot = self.settings.has_player_slot().then(|| self.buf[start + 5]);
        let body = start + header_len;

        let (payload, body_len) = match kind {
            FrameKind::SignOn | FrameKind::Packet => self.packet(kind, tick, body)?,
            FrameKind::ConsoleCmd => {
                let (data, len) = self.length_prefixed(kind, tick, body, 0)?;
                (FramePayload::ConsoleCmd(data), len)
            }
            FrameKind::UserCmd => {
                let (data, len) = self.length_prefixed(kind, tick, body, 4)?;
                let command_number = le_u32(self.buf, body);
                (FramePayload::UserCmd { command_number, data }, len)
            }
            FrameKind::DataTables => {
                let (data, len) = self.length_prefixed(kind, tick, body, 0)?;
                (FramePayload::DataTables(data), len)
            }
            FrameKind::CustomData => {
                let (data, len) = self.length_prefixed(kind, tick, body, 4)?;
                let data_type = le_i32(self.buf, body);
                (FramePayload::CustomData { data_type, data }, len)
            }
            FrameKind::StringTables => {
                let (data, len) = self.length_prefixed(kind, tick, body, 0)?;
                (FramePayload::StringTables(data), len)
            }
            FrameKind::SyncTick => (FramePayload::SyncTick, 0),
            FrameKind::Stop => (FramePayload::Stop, 0),
        };

        self.offset = body + body_len;
        Ok(Frame {
            kind,
            tick,
            player_slot,
            offset: start,
            payload,
        })
    }

    fn packet(
        &self,
        kind: FrameKind,
        tick: i32,
        body: usize,
    ) -> WireResult<(FramePayload<'a>, usize)> {
        let players = self.settings.max_splitscreen_players();
        let fixed = players * CMD_INFO_SIZE + 8;
        let (messages, len) = self.length_prefixed(kind, tick, body, fixed)?;
        let cmd_info = (0..players)
            .map(|i| {
                let at = body + i * CMD_INFO_SIZE;
                CmdInfo::parse(&self.buf[at..at + CMD_INFO_SIZE])
            })
            .collect();
        let seq_at = body + players * CMD_INFO_SIZE;
        Ok((
            FramePayload::Packet {
                cmd_info,
                in_sequence: le_u32(self.buf, seq_at),
                out_sequence: le_u32(self.buf, seq_at + 4),
                messages,
            },
            len,
        ))
    }

    /// Reads a `u32` length `skip` bytes into the body and returns the data
    /// it prefixes plus the total body length consumed.
    fn length_prefixed(
        &self,
        kind: FrameKind,
        tick: i32,
        body: usize,
        skip: usize,
    ) -> WireResult<(&'a [u8], usize)> {
        self.need(body, skip + 4, Some(kind), Some(tick))?;
        let data_len = le_u32(self.buf, body + skip) as usize;
        let total = (skip + 4).saturating_add(data_len);
        if total > self.limits.max_frame_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::FrameBytes,
                limit: self.limits.max_frame_bytes,
                actual: total,
            });
        }
        self.need(body, total, Some(kind), Some(tick))?;
        let data_start = body + skip + 4;
        Ok((&self.buf[data_start..data_start + data_len], total))
    }

    fn need(
        &self,
        at: usize,
        len: usize,
        kind: Option<FrameKind>,
        tick: Option<i32>,
    ) -> WireResult<()> {
        let available = self.buf.len().saturating_sub(at);
        if len > available {
            return Err(DecodeError::FrameLengthOverrun {
                kind,
                tick,
                offset: at,
                needed: len,
                available,
            });
        }
        Ok(())
    }
}

impl<'a> Iterator for FrameSegmenter<'a> {
    type Item = WireResult<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

impl std::iter::FusedIterator for FrameSegmenter<'_> {}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn le_i32(buf: &[u8], at: usize) -> i32 {
    le_u32(buf, at) as i32
}

fn le_f32(buf: &[u8], at: usize) -> f32 {
    f32::from_bits(le_u32(buf, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::DemoWriter;

    fn header(demo_protocol: i32, network_protocol: i32) -> DemoHeader {
        DemoHeader {
            demo_protocol,
            network_protocol,
            server_name: String::new(),
            client_name: String::new(),
            map_name: "map".to_string(),
            game_directory: "portal".to_string(),
            playback_time: 1.0,
            tick_count: 99,
            frame_count: 0,
            sign_on_length: 0,
        }
    }

    fn collect<'a>(buf: &'a [u8], header: &DemoHeader) -> Vec<WireResult<Frame<'a>>> {
        FrameSegmenter::new(buf, header, &Limits::for_testing())
            .unwrap()
            .collect()
    }

    #[test]
    fn frame_codes_differ_between_engines() {
        let old = ProtocolSettings::old_engine();
        let new = ProtocolSettings::new_engine_portal2();
        assert_eq!(FrameKind::from_code(8, &old), Some(FrameKind::StringTables));
        assert_eq!(FrameKind::from_code(8, &new), Some(FrameKind::CustomData));
        assert_eq!(FrameKind::from_code(9, &new), Some(FrameKind::StringTables));
        assert_eq!(FrameKind::from_code(9, &old), None);
        assert_eq!(FrameKind::CustomData.code(&old), None);
    }

    #[test]
    fn segments_mixed_frames_in_order() {
        let header = header(3, 15);
        let mut writer = DemoWriter::new(&header);
        writer.packet(FrameKind::SignOn, 0, 1, 2, &[0xAA, 0xBB]);
        writer.console_cmd(5, "echo hi");
        writer.sync_tick(6);
        writer.user_cmd(7, 42, &[1, 2, 3]);
        writer.string_tables(8, &[9; 5]);
        writer.stop(10);
        let buf = writer.finish();

        let frames: Vec<_> = collect(&buf, &header).into_iter().map(Result::unwrap).collect();
        let kinds: Vec<_> = frames.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FrameKind::SignOn,
                FrameKind::ConsoleCmd,
                FrameKind::SyncTick,
                FrameKind::UserCmd,
                FrameKind::StringTables,
                FrameKind::Stop,
            ]
        );
        match &frames[0].payload {
            FramePayload::Packet {
                cmd_info,
                in_sequence,
                out_sequence,
                messages,
            } => {
                assert_eq!(cmd_info.len(), 1);
                assert_eq!((*in_sequence, *out_sequence), (1, 2));
                assert_eq!(*messages, &[0xAA, 0xBB]);
            }
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(
            frames[3].payload,
            FramePayload::UserCmd {
                command_number: 42,
                data: &[1, 2, 3]
            }
        );
        // Old-engine stop frames take the header tick.
        assert_eq!(frames[5].tick, 99);
    }

    #[test]
    fn new_engine_frames_carry_player_slot() {
        let header = header(4, 2001);
        let mut writer = DemoWriter::new(&header);
        writer.packet(FrameKind::Packet, 3, 0, 0, &[]);
        writer.custom_data(4, 0, &[7]);
        writer.stop(5);
        let buf = writer.finish();

        let frames: Vec<_> = collect(&buf, &header).into_iter().map(Result::unwrap).collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].player_slot, Some(0));
        match &frames[0].payload {
            FramePayload::Packet { cmd_info, .. } => assert_eq!(cmd_info.len(), 2),
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(frames[2].tick, 5);
    }

    #[test]
    fn unknown_frame_type_is_fatal() {
        let header = header(3, 15);
        let mut writer = DemoWriter::new(&header);
        writer.sync_tick(1);
        let mut buf = writer.finish();
        buf.extend_from_slice(&[0x42, 0, 0, 0, 0]);

        let results = collect(&buf, &header);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(DecodeError::UnknownFrameType { code: 0x42, .. })
        ));
    }

    #[test]
    fn length_past_end_is_overrun() {
        let header = header(3, 15);
        let mut writer = DemoWriter::new(&header);
        writer.console_cmd(1, "status");
        let mut buf = writer.finish();
        buf.truncate(buf.len() - 3);

        let results = collect(&buf, &header);
        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(DecodeError::FrameLengthOverrun {
                kind, tick, needed, ..
            }) => {
                assert_eq!(*kind, Some(FrameKind::ConsoleCmd));
                assert_eq!(*tick, Some(1));
                assert_eq!(*needed, 4 + 7);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn frame_count_limit() {
        let header = header(3, 15);
        let mut writer = DemoWriter::new(&header);
        for tick in 0..300 {
            writer.sync_tick(tick);
        }
        let buf = writer.finish();
        let results = collect(&buf, &header);
        assert_eq!(results.len(), 257);
        assert!(matches!(
            results[256],
            Err(DecodeError::LimitsExceeded {
                kind: LimitKind::FrameCount,
                ..
            })
        ));
    }

    #[test]
    fn missing_stop_ends_cleanly() {
        let header = header(3, 15);
        let mut writer = DemoWriter::new(&header);
        writer.sync_tick(1);
        let buf = writer.finish();
        let results = collect(&buf, &header);
        assert_eq!(results.len(), 1);
    }
}
