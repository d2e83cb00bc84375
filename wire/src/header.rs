//! Demo file header.

use bitstream::{BitReader, BitResult, BitWriter};

use crate::error::{DecodeError, WireResult};

/// Magic bytes at the start of every recording.
pub const MAGIC: [u8; 8] = *b"HL2DEMO\0";

/// Width of each fixed string field in the header.
pub const HEADER_STRING_LEN: usize = 260;

/// Header size in bytes (1072 total).
pub const HEADER_SIZE: usize = 8 + 4 + 4 + 4 * HEADER_STRING_LEN + 4 + 4 + 4 + 4;

/// The fixed-size header preceding the first frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DemoHeader {
    pub demo_protocol: i32,
    pub network_protocol: i32,
    pub server_name: String,
    pub client_name: String,
    pub map_name: String,
    pub game_directory: String,
    /// Playback length in seconds.
    pub playback_time: f32,
    pub tick_count: i32,
    pub frame_count: i32,
    pub sign_on_length: i32,
}

/// Decodes the demo header from the start of `buf`.
pub fn decode_demo_header(buf: &[u8]) -> WireResult<DemoHeader> {
    if buf.len() < HEADER_SIZE {
        return Err(DecodeError::DemoTooSmall {
            actual: buf.len(),
            required: HEADER_SIZE,
        });
    }
    let mut found = [0u8; 8];
    found.copy_from_slice(&buf[..8]);
    if found != MAGIC {
        return Err(DecodeError::InvalidMagic { found });
    }

    let mut reader = BitReader::new(&buf[8..HEADER_SIZE]);
    read_fields(&mut reader).map_err(|_| DecodeError::DemoTooSmall {
        actual: buf.len(),
        required: HEADER_SIZE,
    })
}

/// Encodes a header into its fixed 1072-byte layout.
#[must_use]
pub fn encode_demo_header(header: &DemoHeader) -> Vec<u8> {
    let mut writer = BitWriter::with_capacity(HEADER_SIZE);
    writer.write_bytes(&MAGIC);
    writer.write_i32(header.demo_protocol);
    writer.write_i32(header.network_protocol);
    writer.write_fixed_string(&header.server_name, HEADER_STRING_LEN);
    writer.write_fixed_string(&header.client_name, HEADER_STRING_LEN);
    writer.write_fixed_string(&header.map_name, HEADER_STRING_LEN);
    writer.write_fixed_string(&header.game_directory, HEADER_STRING_LEN);
    writer.write_f32(header.playback_time);
    writer.write_i32(header.tick_count);
    writer.write_i32(header.frame_count);
    writer.write_i32(header.sign_on_length);
    writer.finish()
}

fn read_fields(reader: &mut BitReader<'_>) -> BitResult<DemoHeader> {
    Ok(DemoHeader {
        demo_protocol: reader.read_i32()?,
        network_protocol: reader.read_i32()?,
        server_name: reader.read_fixed_string(HEADER_STRING_LEN)?,
        client_name: reader.read_fixed_string(HEADER_STRING_LEN)?,
        map_name: reader.read_fixed_string(HEADER_STRING_LEN)?,
        game_directory: reader.read_fixed_string(HEADER_STRING_LEN)?,
        playback_time: reader.read_f32()?,
        tick_count: reader.read_i32()?,
        frame_count: reader.read_i32()?,
        sign_on_length: reader.read_i32()?,
    })
}
