#![allow(dead_code)]

use bitstream::{BitReader, BitWriter};
use codec::MessageKind;
use wire::{DemoHeader, ProtocolSettings};

/// How an entry name is written in an update batch.
pub enum Name<'a> {
    Literal(&'a str),
    FromHistory {
        index: u64,
        prefix: u64,
        suffix: &'a str,
    },
}

/// One entry of a string table update batch.
pub struct EntryUpdate<'a> {
    pub index: Option<u64>,
    pub name: Option<Name<'a>>,
    pub payload: Option<&'a [u8]>,
}

impl<'a> EntryUpdate<'a> {
    pub fn named(name: &'a str) -> Self {
        Self {
            index: None,
            name: Some(Name::Literal(name)),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Writes a variable-size update batch and returns its bytes and bit length.
pub fn update_batch(entries: &[EntryUpdate<'_>], index_bits: u32) -> (Vec<u8>, usize) {
    let mut w = BitWriter::new();
    for entry in entries {
        match entry.index {
            None => w.write_bit(true),
            Some(index) => {
                w.write_bit(false);
                w.write_bits(index, index_bits).unwrap();
            }
        }
        match &entry.name {
            None => w.write_bit(false),
            Some(Name::Literal(name)) => {
                w.write_bit(true);
                w.write_bit(false);
                w.write_cstring(name);
            }
            Some(Name::FromHistory {
                index,
                prefix,
                suffix,
            }) => {
                w.write_bit(true);
                w.write_bit(true);
                w.write_bits(*index, 5).unwrap();
                w.write_bits(*prefix, 5).unwrap();
                w.write_cstring(suffix);
            }
        }
        match entry.payload {
            None => w.write_bit(false),
            Some(bytes) => {
                w.write_bit(true);
                w.write_bits(bytes.len() as u64, 14).unwrap();
                w.write_bytes(bytes);
            }
        }
    }
    let bits = w.bits_written();
    (w.finish(), bits)
}

/// Copies the first `bits` bits of `bytes` into `w`.
pub fn append_bits(w: &mut BitWriter, bytes: &[u8], bits: usize) {
    let mut reader = BitReader::with_bit_len(bytes, bits);
    while let Ok(bit) = reader.read_bit() {
        w.write_bit(bit);
    }
}

pub fn write_kind(w: &mut BitWriter, kind: MessageKind, settings: &ProtocolSettings) {
    let code = kind.code(settings).expect("kind exists on this protocol");
    w.write_bits(u64::from(code), settings.message_type_bits()).unwrap();
}

/// Writes an old-engine `SvcCreateStringTable` for a variable-size table.
pub fn create_table_message(
    w: &mut BitWriter,
    settings: &ProtocolSettings,
    name: &str,
    max_entries: u16,
    entries: &[EntryUpdate<'_>],
) {
    let index_bits = bitstream::highest_bit_index(u32::from(max_entries));
    let (data, bits) = update_batch(entries, index_bits);
    write_kind(w, MessageKind::SvcCreateStringTable, settings);
    w.write_cstring(name);
    w.write_u16(max_entries);
    w.write_bits(entries.len() as u64, bitstream::bits_for_count(u32::from(max_entries)))
        .unwrap();
    w.write_bits(bits as u64, settings.create_table_data_length_bits())
        .unwrap();
    w.write_bit(false);
    if let Some(flag_bits) = settings.string_table_flag_bits() {
        w.write_bits(0, flag_bits).unwrap();
    }
    append_bits(w, &data, bits);
}

/// Writes a `SvcUpdateStringTable` against the table created `table_id`-th.
pub fn update_table_message(
    w: &mut BitWriter,
    settings: &ProtocolSettings,
    table_id: u64,
    max_entries: u16,
    entries: &[EntryUpdate<'_>],
) {
    let index_bits = bitstream::highest_bit_index(u32::from(max_entries));
    let (data, bits) = update_batch(entries, index_bits);
    write_kind(w, MessageKind::SvcUpdateStringTable, settings);
    w.write_bits(table_id, 5).unwrap();
    if entries.len() == 1 {
        w.write_bit(false);
    } else {
        w.write_bit(true);
        w.write_u16(entries.len() as u16);
    }
    w.write_bits(bits as u64, 20).unwrap();
    append_bits(w, &data, bits);
}

pub fn header(demo_protocol: i32, network_protocol: i32) -> DemoHeader {
    DemoHeader {
        demo_protocol,
        network_protocol,
        server_name: "localhost:27015".to_string(),
        client_name: "chell".to_string(),
        map_name: "testchmb_a_00".to_string(),
        game_directory: "portal".to_string(),
        playback_time: 3.0,
        tick_count: 198,
        frame_count: 6,
        sign_on_length: 0,
    }
}
