//! Per-kind message payload decoders.

use std::fmt;

use bitstream::{bits_for_count, BitReader};
use tracing::debug;
use wire::{ProtocolSettings, SourceGame, MAX_EDICT_BITS};

use crate::error::CodecResult;
use crate::message::MessageKind;
use crate::quant::{read_bit_angle, read_vector_coord};
use crate::session::DecodeSession;
use crate::sound::{decode_sounds, SoundsMessage};
use crate::stringtable::{StringTableSchema, TableUpdate};
use crate::types::Vector3;

const NET_TICK_SCALE_UP: f32 = 100_000.0;
const NETMSG_LENGTH_BITS: u32 = 11;
const DELTA_SIZE_BITS: u32 = 20;
const MAX_SERVER_CLASS_BITS: u32 = 9;
const MAX_DECAL_INDEX_BITS: u32 = 9;
const EVENT_INDEX_BITS: u32 = 8;
const MAX_EVENT_BITS: u32 = 9;
const TEMP_ENTITY_LENGTH_BITS_OLD: u32 = 17;
const UPDATE_TABLE_DATA_LENGTH_BITS: u32 = 20;
const TABLE_ID_BITS: u32 = 5;
const USER_DATA_SIZE_BITS: u32 = 12;
const USER_DATA_SIZE_BITS_BITS: u32 = 4;

/// Bits of an opaque message body whose contents are not interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BitBlob {
    pub bit_len: usize,
    /// Packed bits; a trailing partial byte keeps its bits at the low end.
    pub bytes: Vec<u8>,
}

impl BitBlob {
    fn read(reader: &mut BitReader<'_>, bits: usize) -> CodecResult<Self> {
        Ok(Self {
            bit_len: bits,
            bytes: reader.read_bit_run(bits)?,
        })
    }
}

impl fmt::Display for BitBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.bit_len)
    }
}

/// Connection progress announced by `NetSignOnState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SignOnState {
    None,
    Challenge,
    Connected,
    New,
    PreSpawn,
    Spawn,
    Full,
    ChangeLevel,
    Other(u8),
}

impl From<u8> for SignOnState {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Challenge,
            2 => Self::Connected,
            3 => Self::New,
            4 => Self::PreSpawn,
            5 => Self::Spawn,
            6 => Self::Full,
            7 => Self::ChangeLevel,
            other => Self::Other(other),
        }
    }
}

/// Map checksum in `SvcServerInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MapChecksum {
    Crc(u32),
    Md5([u8; 16]),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServerInfo {
    pub network_protocol: u16,
    pub server_count: u32,
    pub is_hltv: bool,
    pub is_dedicated: bool,
    pub client_crc: i32,
    /// New engine only.
    pub string_table_crc: Option<u32>,
    pub max_classes: u16,
    pub map_checksum: MapChecksum,
    pub player_slot: u8,
    pub max_clients: u8,
    pub tick_interval: f32,
    pub os: u8,
    pub game_dir: String,
    pub map_name: String,
    pub sky_name: String,
    pub host_name: String,
    /// Steampipe builds only.
    pub is_replay: Option<bool>,
}

impl ServerInfo {
    fn decode(reader: &mut BitReader<'_>, settings: &ProtocolSettings) -> CodecResult<Self> {
        let network_protocol = reader.read_u16()?;
        let server_count = reader.read_u32()?;
        let is_hltv = reader.read_bit()?;
        let is_dedicated = reader.read_bit()?;
        let client_crc = reader.read_i32()?;
        let string_table_crc = if settings.new_engine() {
            Some(reader.read_u32()?)
        } else {
            None
        };
        let max_classes = reader.read_u16()?;
        let steampipe = settings.game == SourceGame::Portal1Steampipe || settings.network_protocol == 24;
        let map_checksum = if steampipe {
            let mut md5 = [0u8; 16];
            md5.copy_from_slice(&reader.read_bytes(16)?);
            MapChecksum::Md5(md5)
        } else {
            MapChecksum::Crc(reader.read_u32()?)
        };
        Ok(Self {
            network_protocol,
            server_count,
            is_hltv,
            is_dedicated,
            client_crc,
            string_table_crc,
            max_classes,
            map_checksum,
            player_slot: reader.read_u8()?,
            max_clients: reader.read_u8()?,
            tick_interval: reader.read_f32()?,
            os: reader.read_u8()?,
            game_dir: reader.read_cstring()?,
            map_name: reader.read_cstring()?,
            sky_name: reader.read_cstring()?,
            host_name: reader.read_cstring()?,
            is_replay: if steampipe {
                Some(reader.read_bit()?)
            } else {
                None
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServerClass {
    pub id: u32,
    pub name: String,
    pub data_table_name: String,
}

/// A decoded message body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MessagePayload {
    Nop,
    Disconnect {
        reason: String,
    },
    File {
        transfer_id: u32,
        file_name: String,
        requested: bool,
    },
    SplitScreenUser {
        user: bool,
    },
    Tick {
        engine_tick: u32,
        host_frame_time: Option<f32>,
        host_frame_time_std_dev: Option<f32>,
    },
    StringCmd {
        command: String,
    },
    SetConVar {
        convars: Vec<(String, String)>,
    },
    SignOnState {
        state: SignOnState,
        spawn_count: i32,
        /// New engine fields.
        num_server_players: Option<u32>,
        player_network_ids: Option<Vec<u8>>,
        map_name: Option<String>,
    },
    Print {
        message: String,
    },
    ServerInfo(Box<ServerInfo>),
    SendTable {
        needs_decoder: bool,
        data: BitBlob,
    },
    ClassInfo {
        class_count: u16,
        create_on_client: bool,
        classes: Vec<ServerClass>,
    },
    SetPause {
        paused: bool,
    },
    CreateStringTable {
        schema: StringTableSchema,
        num_entries: u32,
        /// `None` when the initial entries failed to apply.
        updates: Option<Vec<TableUpdate>>,
    },
    UpdateStringTable {
        table_id: u32,
        table_name: String,
        changed_entries: u16,
        /// `None` when the batch was refused or failed.
        updates: Option<Vec<TableUpdate>>,
    },
    VoiceInit {
        codec: String,
        quality: u8,
        sample_rate: Option<u16>,
    },
    VoiceData {
        client: u8,
        proximity: bool,
        data: BitBlob,
    },
    Sounds(SoundsMessage),
    SetView {
        entity_index: u32,
    },
    FixAngle {
        relative: bool,
        angles: Vector3,
    },
    CrosshairAngle {
        angles: Vector3,
    },
    BspDecal {
        position: Vector3,
        texture_index: u32,
        entity_index: Option<u32>,
        model_index: Option<u32>,
        low_priority: bool,
    },
    SplitScreen {
        kind: u32,
        data: BitBlob,
    },
    UserMessage {
        message_type: u8,
        data: BitBlob,
    },
    EntityMessage {
        entity_index: u32,
        class_id: u32,
        data: BitBlob,
    },
    GameEvent {
        data: BitBlob,
    },
    PacketEntities {
        max_entries: u32,
        delta_from: Option<i32>,
        baseline: bool,
        updated_entries: u32,
        update_baseline: bool,
        data: BitBlob,
    },
    TempEntities {
        count: u8,
        data: BitBlob,
    },
    Prefetch {
        sound_index: u32,
    },
    Menu {
        menu_type: i16,
        data: Vec<u8>,
    },
    GameEventList {
        event_count: u32,
        data: BitBlob,
    },
    GetCvarValue {
        cookie: i32,
        cvar_name: String,
    },
    CmdKeyValues {
        data: Vec<u8>,
    },
    PaintmapData {
        data: BitBlob,
    },
}

/// Decodes the body of a known message kind.
///
/// `kind` is never [`MessageKind::Unknown`]; the dispatch loop handles that
/// before calling in.
pub(crate) fn decode_payload(
    kind: MessageKind,
    reader: &mut BitReader<'_>,
    session: &mut DecodeSession,
) -> CodecResult<MessagePayload> {
    let settings = session.settings;
    let payload = match kind {
        MessageKind::NetNop | MessageKind::Unknown(_) => MessagePayload::Nop,
        MessageKind::NetDisconnect => MessagePayload::Disconnect {
            reason: reader.read_cstring()?,
        },
        MessageKind::NetFile => MessagePayload::File {
            transfer_id: reader.read_u32()?,
            file_name: reader.read_cstring()?,
            requested: reader.read_bit()?,
        },
        MessageKind::NetSplitScreenUser => MessagePayload::SplitScreenUser {
            user: reader.read_bit()?,
        },
        MessageKind::NetTick => decode_tick(reader, session)?,
        MessageKind::NetStringCmd => MessagePayload::StringCmd {
            command: reader.read_cstring()?,
        },
        MessageKind::NetSetConVar => {
            let count = reader.read_u8()?;
            let mut convars = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                convars.push((reader.read_cstring()?, reader.read_cstring()?));
            }
            MessagePayload::SetConVar { convars }
        }
        MessageKind::NetSignOnState => decode_sign_on_state(reader, &settings)?,
        MessageKind::SvcPrint => MessagePayload::Print {
            message: reader.read_cstring()?,
        },
        MessageKind::SvcServerInfo => {
            let info = ServerInfo::decode(reader, &settings)?;
            session.tick_interval = Some(info.tick_interval);
            debug!(map = %info.map_name, tick_interval = info.tick_interval, "server info");
            MessagePayload::ServerInfo(Box::new(info))
        }
        MessageKind::SvcSendTable => {
            let needs_decoder = reader.read_bit()?;
            let len = reader.read_u16()?;
            MessagePayload::SendTable {
                needs_decoder,
                data: BitBlob::read(reader, usize::from(len))?,
            }
        }
        MessageKind::SvcClassInfo => decode_class_info(reader)?,
        MessageKind::SvcSetPause => MessagePayload::SetPause {
            paused: reader.read_bit()?,
        },
        MessageKind::SvcCreateStringTable => decode_create_string_table(reader, session)?,
        MessageKind::SvcUpdateStringTable => decode_update_string_table(reader, session)?,
        MessageKind::SvcVoiceInit => {
            let codec = reader.read_cstring()?;
            let quality = reader.read_u8()?;
            let sample_rate = if quality == u8::MAX && (settings.new_engine() || settings.network_protocol >= 24) {
                Some(reader.read_u16()?)
            } else {
                None
            };
            MessagePayload::VoiceInit {
                codec,
                quality,
                sample_rate,
            }
        }
        MessageKind::SvcVoiceData => {
            let client = reader.read_u8()?;
            let proximity = reader.read_u8()? != 0;
            let len = reader.read_u16()?;
            MessagePayload::VoiceData {
                client,
                proximity,
                data: BitBlob::read(reader, usize::from(len))?,
            }
        }
        MessageKind::SvcSounds => MessagePayload::Sounds(decode_sounds(reader, session)?),
        MessageKind::SvcSetView => MessagePayload::SetView {
            entity_index: reader.read_u32_bits(MAX_EDICT_BITS)?,
        },
        MessageKind::SvcFixAngle => MessagePayload::FixAngle {
            relative: reader.read_bit()?,
            angles: read_angles(reader)?,
        },
        MessageKind::SvcCrosshairAngle => MessagePayload::CrosshairAngle {
            angles: read_angles(reader)?,
        },
        MessageKind::SvcBspDecal => {
            let position = read_vector_coord(reader)?;
            let texture_index = reader.read_u32_bits(MAX_DECAL_INDEX_BITS)?;
            let (entity_index, model_index) = if reader.read_bit()? {
                let model_bits = if settings.new_engine() { 12 } else { 11 };
                (
                    Some(reader.read_u32_bits(MAX_EDICT_BITS)?),
                    Some(reader.read_u32_bits(model_bits)?),
                )
            } else {
                (None, None)
            };
            MessagePayload::BspDecal {
                position,
                texture_index,
                entity_index,
                model_index,
                low_priority: reader.read_bit()?,
            }
        }
        MessageKind::SvcSplitScreen => {
            let kind = reader.read_u32_bits(1)?;
            let len = reader.read_bits(NETMSG_LENGTH_BITS)? as usize;
            MessagePayload::SplitScreen {
                kind,
                data: BitBlob::read(reader, len)?,
            }
        }
        MessageKind::SvcUserMessage => {
            let message_type = reader.read_u8()?;
            let len = reader.read_bits(settings.user_message_length_bits())? as usize;
            MessagePayload::UserMessage {
                message_type,
                data: BitBlob::read(reader, len)?,
            }
        }
        MessageKind::SvcEntityMessage => {
            let entity_index = reader.read_u32_bits(MAX_EDICT_BITS)?;
            let class_id = reader.read_u32_bits(MAX_SERVER_CLASS_BITS)?;
            let len = reader.read_bits(NETMSG_LENGTH_BITS)? as usize;
            MessagePayload::EntityMessage {
                entity_index,
                class_id,
                data: BitBlob::read(reader, len)?,
            }
        }
        MessageKind::SvcGameEvent => {
            let len = reader.read_bits(NETMSG_LENGTH_BITS)? as usize;
            MessagePayload::GameEvent {
                data: BitBlob::read(reader, len)?,
            }
        }
        MessageKind::SvcPacketEntities => {
            let max_entries = reader.read_u32_bits(MAX_EDICT_BITS)?;
            let delta_from = if reader.read_bit()? {
                Some(reader.read_i32()?)
            } else {
                None
            };
            let baseline = reader.read_bit()?;
            let updated_entries = reader.read_u32_bits(MAX_EDICT_BITS)?;
            let len = reader.read_bits(DELTA_SIZE_BITS)? as usize;
            let update_baseline = reader.read_bit()?;
            MessagePayload::PacketEntities {
                max_entries,
                delta_from,
                baseline,
                updated_entries,
                update_baseline,
                data: BitBlob::read(reader, len)?,
            }
        }
        MessageKind::SvcTempEntities => {
            let count = reader.read_bits(EVENT_INDEX_BITS)? as u8;
            let len = if settings.new_engine() {
                reader.read_ubit_var()? as usize
            } else {
                reader.read_bits(TEMP_ENTITY_LENGTH_BITS_OLD)? as usize
            };
            MessagePayload::TempEntities {
                count,
                data: BitBlob::read(reader, len)?,
            }
        }
        MessageKind::SvcPrefetch => MessagePayload::Prefetch {
            sound_index: reader.read_u32_bits(settings.sound_index_bits())?,
        },
        MessageKind::SvcMenu => {
            let menu_type = reader.read_u16()? as i16;
            let len = reader.read_u16()?;
            MessagePayload::Menu {
                menu_type,
                data: reader.read_bytes(usize::from(len))?,
            }
        }
        MessageKind::SvcGameEventList => {
            let event_count = reader.read_u32_bits(MAX_EVENT_BITS)?;
            let len = reader.read_bits(DELTA_SIZE_BITS)? as usize;
            MessagePayload::GameEventList {
                event_count,
                data: BitBlob::read(reader, len)?,
            }
        }
        MessageKind::SvcGetCvarValue => MessagePayload::GetCvarValue {
            cookie: reader.read_i32()?,
            cvar_name: reader.read_cstring()?,
        },
        MessageKind::SvcCmdKeyValues => {
            let len = reader.read_u32()? as usize;
            MessagePayload::CmdKeyValues {
                data: reader.read_bytes(len)?,
            }
        }
        MessageKind::SvcPaintmapData => {
            let len = reader.read_u32()? as usize;
            MessagePayload::PaintmapData {
                data: BitBlob::read(reader, len)?,
            }
        }
    };
    Ok(payload)
}

fn decode_tick(reader: &mut BitReader<'_>, session: &mut DecodeSession) -> CodecResult<MessagePayload> {
    let engine_tick = reader.read_u32()?;
    let (host_frame_time, host_frame_time_std_dev) = if session.settings.network_protocol >= 14 {
        (
            Some(f32::from(reader.read_u16()?) / NET_TICK_SCALE_UP),
            Some(f32::from(reader.read_u16()?) / NET_TICK_SCALE_UP),
        )
    } else {
        (None, None)
    };
    session.engine_tick = Some(engine_tick);
    Ok(MessagePayload::Tick {
        engine_tick,
        host_frame_time,
        host_frame_time_std_dev,
    })
}

fn decode_sign_on_state(reader: &mut BitReader<'_>, settings: &ProtocolSettings) -> CodecResult<MessagePayload> {
    let state = SignOnState::from(reader.read_u8()?);
    let spawn_count = reader.read_i32()?;
    let (num_server_players, player_network_ids, map_name) = if settings.new_engine() {
        let players = reader.read_u32()?;
        let id_len = reader.read_u32()? as usize;
        let ids = reader.read_bytes(id_len)?;
        let name_len = reader.read_u32()? as usize;
        let name = reader.read_string_of_length(name_len)?;
        (Some(players), Some(ids), Some(name))
    } else {
        (None, None, None)
    };
    Ok(MessagePayload::SignOnState {
        state,
        spawn_count,
        num_server_players,
        player_network_ids,
        map_name,
    })
}

fn decode_class_info(reader: &mut BitReader<'_>) -> CodecResult<MessagePayload> {
    let class_count = reader.read_u16()?;
    let create_on_client = reader.read_bit()?;
    let mut classes = Vec::new();
    if !create_on_client {
        let id_bits = bits_for_count(u32::from(class_count));
        classes.reserve(usize::from(class_count));
        for _ in 0..class_count {
            classes.push(ServerClass {
                id: reader.read_u32_bits(id_bits)?,
                name: reader.read_cstring()?,
                data_table_name: reader.read_cstring()?,
            });
        }
    }
    Ok(MessagePayload::ClassInfo {
        class_count,
        create_on_client,
        classes,
    })
}

fn decode_create_string_table(reader: &mut BitReader<'_>, session: &mut DecodeSession) -> CodecResult<MessagePayload> {
    let settings = session.settings;
    let name = reader.read_cstring()?;
    let max_entries = reader.read_u16()?;
    let num_entries = reader.read_u32_bits(bits_for_count(u32::from(max_entries)))?;
    let data_len = reader.read_bits(settings.create_table_data_length_bits())? as usize;
    let mut schema = StringTableSchema::new(name, max_entries);
    if reader.read_bit()? {
        let size = reader.read_u32_bits(USER_DATA_SIZE_BITS)?;
        let size_bits = reader.read_u32_bits(USER_DATA_SIZE_BITS_BITS)?;
        schema = schema.with_fixed_size(size, size_bits);
    }
    if let Some(bits) = settings.string_table_flag_bits() {
        schema.flags = Some(reader.read_u32_bits(bits)?);
    }
    let mut data = reader.split_and_skip(data_len)?;

    session.tables.create_table(schema.clone(), &session.limits)?;
    let (tables, mut ctx) = session.table_context();
    let updates = tables
        .apply_update(&schema.name, num_entries as usize, &mut data, &mut ctx)
        .ok();
    Ok(MessagePayload::CreateStringTable {
        schema,
        num_entries,
        updates,
    })
}

fn decode_update_string_table(reader: &mut BitReader<'_>, session: &mut DecodeSession) -> CodecResult<MessagePayload> {
    let table_id = reader.read_u32_bits(TABLE_ID_BITS)?;
    let table_name = session.tables.table_name_by_id(table_id as usize)?.to_string();
    let changed_entries = if reader.read_bit()? {
        reader.read_u16()?
    } else {
        1
    };
    let data_len = reader.read_bits(UPDATE_TABLE_DATA_LENGTH_BITS)? as usize;
    let mut data = reader.split_and_skip(data_len)?;

    let (tables, mut ctx) = session.table_context();
    let updates = tables
        .apply_update(&table_name, usize::from(changed_entries), &mut data, &mut ctx)
        .ok();
    Ok(MessagePayload::UpdateStringTable {
        table_id,
        table_name,
        changed_entries,
        updates,
    })
}

fn read_angles(reader: &mut BitReader<'_>) -> CodecResult<Vector3> {
    Ok(Vector3::new(
        read_bit_angle(reader, 16)?,
        read_bit_angle(reader, 16)?,
        read_bit_angle(reader, 16)?,
    ))
}

impl fmt::Display for MessagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => f.write_str("nop"),
            Self::Disconnect { reason } => write!(f, "disconnect: {reason}"),
            Self::File {
                transfer_id,
                file_name,
                requested,
            } => write!(f, "file #{transfer_id} {file_name:?} (requested: {requested})"),
            Self::SplitScreenUser { user } => write!(f, "split screen user: {}", u8::from(*user)),
            Self::Tick { engine_tick, .. } => write!(f, "engine tick {engine_tick}"),
            Self::StringCmd { command } => write!(f, "command: {command}"),
            Self::SetConVar { convars } => {
                f.write_str("set convars:")?;
                for (name, value) in convars {
                    write!(f, " {name}={value:?}")?;
                }
                Ok(())
            }
            Self::SignOnState {
                state, spawn_count, ..
            } => write!(f, "sign on state {state:?} (spawn count {spawn_count})"),
            Self::Print { message } => write!(f, "print: {}", message.trim_end()),
            Self::ServerInfo(info) => write!(
                f,
                "server info: {} on {} ({} clients)",
                info.host_name, info.map_name, info.max_clients
            ),
            Self::SendTable { data, .. } => write!(f, "send table, {data}"),
            Self::ClassInfo { class_count, .. } => write!(f, "{class_count} server classes"),
            Self::SetPause { paused } => write!(f, "paused: {paused}"),
            Self::CreateStringTable {
                schema, updates, ..
            } => write!(
                f,
                "create table {} (max {}), {}",
                schema.name,
                schema.max_entries,
                describe_updates(updates.as_deref())
            ),
            Self::UpdateStringTable {
                table_name,
                updates,
                ..
            } => write!(f, "update table {table_name}, {}", describe_updates(updates.as_deref())),
            Self::VoiceInit { codec, quality, .. } => write!(f, "voice init: {codec} (quality {quality})"),
            Self::VoiceData { client, data, .. } => write!(f, "voice data from client {client}, {data}"),
            Self::Sounds(sounds) => match &sounds.sounds {
                Some(list) => write!(f, "{} sounds (reliable: {})", list.len(), sounds.reliable),
                None => write!(f, "sounds (reliable: {}), decoding failed", sounds.reliable),
            },
            Self::SetView { entity_index } => write!(f, "set view entity {entity_index}"),
            Self::FixAngle { relative, angles } => write!(f, "fix angle {angles} (relative: {relative})"),
            Self::CrosshairAngle { angles } => write!(f, "crosshair angle {angles}"),
            Self::BspDecal {
                position,
                texture_index,
                ..
            } => write!(f, "decal {texture_index} at {position}"),
            Self::SplitScreen { kind, data } => write!(f, "split screen type {kind}, {data}"),
            Self::UserMessage { message_type, data } => write!(f, "user message {message_type}, {data}"),
            Self::EntityMessage {
                entity_index, data, ..
            } => write!(f, "entity message for {entity_index}, {data}"),
            Self::GameEvent { data } => write!(f, "game event, {data}"),
            Self::PacketEntities {
                updated_entries,
                delta_from,
                data,
                ..
            } => match delta_from {
                Some(from) => write!(f, "{updated_entries} entities (delta from {from}), {data}"),
                None => write!(f, "{updated_entries} entities, {data}"),
            },
            Self::TempEntities { count, data } => write!(f, "{count} temp entities, {data}"),
            Self::Prefetch { sound_index } => write!(f, "prefetch sound {sound_index}"),
            Self::Menu { menu_type, data } => write!(f, "menu type {menu_type}, {} bytes", data.len()),
            Self::GameEventList { event_count, .. } => write!(f, "{event_count} game event descriptors"),
            Self::GetCvarValue { cookie, cvar_name } => write!(f, "get cvar {cvar_name} (cookie {cookie})"),
            Self::CmdKeyValues { data } => write!(f, "key values, {} bytes", data.len()),
            Self::PaintmapData { data } => write!(f, "paint map, {data}"),
        }
    }
}

fn describe_updates(updates: Option<&[TableUpdate]>) -> String {
    match updates {
        Some(updates) => format!("{} updates", updates.len()),
        None => "updates failed".to_string(),
    }
}
