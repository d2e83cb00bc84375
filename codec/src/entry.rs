//! Typed decoders for string table entry payloads.

use bitstream::BitReader;
use wire::ProtocolSettings;

use crate::error::CodecResult;
use crate::session::Diagnostics;

pub const MODEL_PRECACHE: &str = "modelprecache";
pub const SOUND_PRECACHE: &str = "soundprecache";
pub const GENERIC_PRECACHE: &str = "genericprecache";
pub const DECAL_PRECACHE: &str = "decalprecache";
pub const LIGHT_STYLES: &str = "lightstyles";
pub const USER_INFO: &str = "userinfo";

const PRECACHE_FLAG_BITS: u32 = 2;
const MAX_PLAYER_NAME_LENGTH: usize = 32;
const SIGNED_GUID_LEN: usize = 33;
const MAX_CUSTOM_FILES: usize = 4;

/// An entry payload: the raw bits plus whatever the table's decoder made of them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntryPayload {
    pub bit_len: usize,
    /// Packed payload bits; a trailing partial byte keeps its bits at the low end.
    pub bytes: Vec<u8>,
    pub data: EntryData,
}

/// Interpreted payload contents.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EntryData {
    Precache { flags: u32 },
    LightStyle(String),
    PlayerInfo(Box<PlayerInfo>),
    /// No decoder for this table, or the decoder failed.
    Raw,
}

/// A `userinfo` table entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlayerInfo {
    /// New engine only.
    pub xuid: Option<u64>,
    pub name: String,
    pub user_id: i32,
    pub guid: String,
    pub friends_id: u32,
    pub friends_name: String,
    pub fake_player: bool,
    pub is_hltv: bool,
    pub custom_files: [u32; MAX_CUSTOM_FILES],
    pub files_downloaded: u8,
}

impl PlayerInfo {
    fn decode(reader: &mut BitReader<'_>, settings: &ProtocolSettings) -> CodecResult<Self> {
        let xuid = if settings.new_engine() {
            Some(reader.read_u64()?)
        } else {
            None
        };
        let name = reader.read_fixed_string(MAX_PLAYER_NAME_LENGTH)?;
        let user_id = reader.read_i32()?;
        let guid = reader.read_fixed_string(SIGNED_GUID_LEN)?;
        reader.skip_bits(3 * 8)?;
        let friends_id = reader.read_u32()?;
        let friends_name = reader.read_fixed_string(MAX_PLAYER_NAME_LENGTH)?;
        let fake_player = reader.read_u8()? != 0;
        let is_hltv = reader.read_u8()? != 0;
        reader.skip_bits(2 * 8)?;
        let mut custom_files = [0; MAX_CUSTOM_FILES];
        for crc in &mut custom_files {
            *crc = reader.read_u32()?;
        }
        let files_downloaded = reader.read_u8()?;
        Ok(Self {
            xuid,
            name,
            user_id,
            guid,
            friends_id,
            friends_name,
            fake_player,
            is_hltv,
            custom_files,
            files_downloaded,
        })
    }
}

/// Decodes an entry payload covering all of `reader`.
///
/// A typed decoder that fails leaves the payload as [`EntryData::Raw`] and
/// reports one diagnostic.
pub(crate) fn decode_entry_payload(
    table: &str,
    entry: &str,
    reader: &BitReader<'_>,
    settings: &ProtocolSettings,
    diagnostics: &mut Diagnostics,
) -> CodecResult<EntryPayload> {
    let bit_len = reader.bits_remaining();
    let bytes = reader.clone().read_bit_run(bit_len)?;

    let mut typed = reader.clone();
    let decoded = match table {
        MODEL_PRECACHE | SOUND_PRECACHE | GENERIC_PRECACHE | DECAL_PRECACHE => typed
            .read_u32_bits(PRECACHE_FLAG_BITS)
            .map(|flags| EntryData::Precache { flags })
            .map_err(Into::into),
        LIGHT_STYLES => typed
            .read_fixed_string(bit_len / 8)
            .map(EntryData::LightStyle)
            .map_err(Into::into),
        USER_INFO => PlayerInfo::decode(&mut typed, settings).map(|p| EntryData::PlayerInfo(Box::new(p))),
        _ => Ok(EntryData::Raw),
    };

    let data = match decoded {
        Ok(data) => data,
        Err(e) => {
            diagnostics.push(format!(
                "error while decoding entry {entry:?} of table {table}: {e} ({} bits left)",
                typed.bits_remaining()
            ));
            EntryData::Raw
        }
    };
    Ok(EntryPayload {
        bit_len,
        bytes,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::BitWriter;

    fn decode(table: &str, bytes: &[u8], bits: usize) -> (EntryPayload, Diagnostics) {
        let mut diagnostics = Diagnostics::default();
        let reader = BitReader::with_bit_len(bytes, bits);
        let payload = decode_entry_payload(
            table,
            "entry",
            &reader,
            &ProtocolSettings::old_engine(),
            &mut diagnostics,
        )
        .unwrap();
        (payload, diagnostics)
    }

    #[test]
    fn precache_flags() {
        let (payload, diagnostics) = decode(SOUND_PRECACHE, &[0b10], 2);
        assert_eq!(payload.data, EntryData::Precache { flags: 2 });
        assert_eq!(payload.bit_len, 2);
        assert_eq!(payload.bytes, [0b10]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn light_style_cut_at_nul() {
        let (payload, _) = decode(LIGHT_STYLES, b"mmnm\0", 40);
        assert_eq!(payload.data, EntryData::LightStyle("mmnm".to_string()));
    }

    #[test]
    fn unknown_table_is_raw() {
        let (payload, diagnostics) = decode("instancebaseline", &[1, 2, 3], 24);
        assert_eq!(payload.data, EntryData::Raw);
        assert_eq!(payload.bytes, [1, 2, 3]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn short_user_info_falls_back_to_raw() {
        let (payload, diagnostics) = decode(USER_INFO, &[0; 8], 64);
        assert_eq!(payload.data, EntryData::Raw);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.iter().next().unwrap().contains("userinfo"));
    }

    #[test]
    fn user_info_layout() {
        let mut writer = BitWriter::new();
        writer.write_fixed_string("player", MAX_PLAYER_NAME_LENGTH);
        writer.write_i32(2);
        writer.write_fixed_string("STEAM_1:0:123", SIGNED_GUID_LEN);
        writer.write_bytes(&[0; 3]);
        writer.write_u32(246);
        writer.write_fixed_string("", MAX_PLAYER_NAME_LENGTH);
        writer.write_u8(0);
        writer.write_u8(1);
        writer.write_bytes(&[0; 2]);
        for crc in [1, 2, 3, 4] {
            writer.write_u32(crc);
        }
        writer.write_u8(5);
        let bytes = writer.finish();

        let (payload, diagnostics) = decode(USER_INFO, &bytes, bytes.len() * 8);
        assert!(diagnostics.is_empty());
        let EntryData::PlayerInfo(info) = payload.data else {
            panic!("expected player info");
        };
        assert_eq!(info.name, "player");
        assert_eq!(info.user_id, 2);
        assert_eq!(info.guid, "STEAM_1:0:123");
        assert_eq!(info.friends_id, 246);
        assert!(info.is_hltv);
        assert_eq!(info.custom_files, [1, 2, 3, 4]);
        assert_eq!(info.files_downloaded, 5);
        assert_eq!(info.xuid, None);
    }
}
