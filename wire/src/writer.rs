//! Recording writer used to build fixtures.
//!
//! Produces the framing [`FrameSegmenter`](crate::FrameSegmenter) reads.
//! Per-player view blocks are written as zeros.

use crate::frame::FrameKind;
use crate::header::{encode_demo_header, DemoHeader};
use crate::protocol::{ProtocolSettings, CMD_INFO_SIZE};

/// Appends frames to an in-memory recording.
#[derive(Debug, Clone)]
pub struct DemoWriter {
    settings: ProtocolSettings,
    buf: Vec<u8>,
}

impl DemoWriter {
    /// Starts a recording with the given header.
    #[must_use]
    pub fn new(header: &DemoHeader) -> Self {
        Self {
            settings: ProtocolSettings::from_header(header),
            buf: encode_demo_header(header),
        }
    }

    /// Writes a `SignOn` or `Packet` frame around a message stream.
    pub fn packet(
        &mut self,
        kind: FrameKind,
        tick: i32,
        in_sequence: u32,
        out_sequence: u32,
        messages: &[u8],
    ) {
        self.frame_header(kind, tick);
        let players = self.settings.max_splitscreen_players();
        self.buf.resize(self.buf.len() + players * CMD_INFO_SIZE, 0);
        self.buf.extend_from_slice(&in_sequence.to_le_bytes());
        self.buf.extend_from_slice(&out_sequence.to_le_bytes());
        self.length_prefixed(messages);
    }

    /// Writes a console command frame; the command gets a NUL terminator.
    pub fn console_cmd(&mut self, tick: i32, command: &str) {
        self.frame_header(FrameKind::ConsoleCmd, tick);
        let mut bytes = command.as_bytes().to_vec();
        bytes.push(0);
        self.length_prefixed(&bytes);
    }

    pub fn user_cmd(&mut self, tick: i32, command_number: u32, data: &[u8]) {
        self.frame_header(FrameKind::UserCmd, tick);
        self.buf.extend_from_slice(&command_number.to_le_bytes());
        self.length_prefixed(data);
    }

    pub fn data_tables(&mut self, tick: i32, data: &[u8]) {
        self.frame_header(FrameKind::DataTables, tick);
        self.length_prefixed(data);
    }

    pub fn string_tables(&mut self, tick: i32, data: &[u8]) {
        self.frame_header(FrameKind::StringTables, tick);
        self.length_prefixed(data);
    }

    /// Writes a custom data frame. Old-engine recordings have no such frame
    /// type; the frame is written with type byte 0 and will not segment.
    pub fn custom_data(&mut self, tick: i32, data_type: i32, data: &[u8]) {
        self.frame_header(FrameKind::CustomData, tick);
        self.buf.extend_from_slice(&data_type.to_le_bytes());
        self.length_prefixed(data);
    }

    pub fn sync_tick(&mut self, tick: i32) {
        self.frame_header(FrameKind::SyncTick, tick);
    }

    pub fn stop(&mut self, tick: i32) {
        self.frame_header(FrameKind::Stop, tick);
    }

    /// Appends raw bytes, for building corrupt recordings.
    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Finishes the recording.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn frame_header(&mut self, kind: FrameKind, tick: i32) {
        self.buf.push(kind.code(&self.settings).unwrap_or(0));
        self.buf.extend_from_slice(&tick.to_le_bytes());
        if self.settings.has_player_slot() {
            self.buf.push(0);
        }
    }

    fn length_prefixed(&mut self, data: &[u8]) {
        let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(data);
    }
}
