//! Protocol-version dependent layout parameters.

use crate::header::DemoHeader;

/// Bits in an entity index.
pub const MAX_EDICT_BITS: u32 = 11;

/// Bits in a name-history index and in a shared-prefix length.
pub const SUB_STRING_BITS: u32 = 5;

/// Bits in a variable-size string table payload length, counted in bytes.
pub const MAX_USER_DATA_BITS: u32 = 14;

/// Bytes of per-player view information at the start of a packet frame.
pub const CMD_INFO_SIZE: usize = 76;

/// Game build family, identified from the two protocol numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SourceGame {
    Portal1Unpack,
    Portal1_3420,
    Portal1Steampipe,
    Portal2,
    L4d2_2000,
    L4d2_2042,
    Unknown,
}

impl SourceGame {
    /// Identifies the game from the header's protocol pair.
    #[must_use]
    pub const fn identify(demo_protocol: i32, network_protocol: i32) -> Self {
        match (demo_protocol, network_protocol) {
            (3, 14) => Self::Portal1_3420,
            (3, 15) => Self::Portal1Unpack,
            (3, 24) => Self::Portal1Steampipe,
            (4, 2001) => Self::Portal2,
            (4, 2000) => Self::L4d2_2000,
            (4, 2042) => Self::L4d2_2042,
            _ => Self::Unknown,
        }
    }
}

/// Layout parameters derived from the demo header.
///
/// Every width that differs between engine generations is answered here so
/// decoders never branch on raw protocol numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProtocolSettings {
    pub demo_protocol: i32,
    pub network_protocol: i32,
    pub game: SourceGame,
}

impl ProtocolSettings {
    /// Creates settings for an explicit protocol pair.
    #[must_use]
    pub const fn new(demo_protocol: i32, network_protocol: i32) -> Self {
        Self {
            demo_protocol,
            network_protocol,
            game: SourceGame::identify(demo_protocol, network_protocol),
        }
    }

    /// Creates settings from a decoded header.
    #[must_use]
    pub const fn from_header(header: &DemoHeader) -> Self {
        Self::new(header.demo_protocol, header.network_protocol)
    }

    /// Portal 1 3420 settings, a common old-engine protocol.
    #[must_use]
    pub const fn old_engine() -> Self {
        Self::new(3, 14)
    }

    /// Portal 2 settings, a common new-engine protocol.
    #[must_use]
    pub const fn new_engine_portal2() -> Self {
        Self::new(4, 2001)
    }

    /// Returns true for the newer engine generation (demo protocol 4).
    #[must_use]
    pub const fn new_engine(&self) -> bool {
        self.demo_protocol == 4
    }

    /// Frame headers carry a player-slot byte on the new engine.
    #[must_use]
    pub const fn has_player_slot(&self) -> bool {
        self.new_engine()
    }

    /// Width of the type code leading each message.
    #[must_use]
    pub const fn message_type_bits(&self) -> u32 {
        if self.network_protocol == 14 {
            5
        } else {
            6
        }
    }

    /// Width of the length prefix of a user message body.
    #[must_use]
    pub const fn user_message_length_bits(&self) -> u32 {
        if self.new_engine() && !matches!(self.game, SourceGame::L4d2_2042) {
            12
        } else {
            11
        }
    }

    /// Number of per-player view blocks at the start of a packet frame.
    #[must_use]
    pub const fn max_splitscreen_players(&self) -> usize {
        match self.game {
            SourceGame::Portal1Unpack | SourceGame::Portal1_3420 | SourceGame::Portal1Steampipe => {
                1
            }
            SourceGame::Portal2 => 2,
            SourceGame::L4d2_2000 | SourceGame::L4d2_2042 | SourceGame::Unknown => 4,
        }
    }

    /// Width of a sound precache index.
    #[must_use]
    pub const fn sound_index_bits(&self) -> u32 {
        if self.new_engine() {
            14
        } else {
            13
        }
    }

    /// Width of the sound flag field.
    #[must_use]
    pub const fn sound_flag_bits(&self) -> u32 {
        if self.new_engine() {
            13
        } else {
            9
        }
    }

    /// Width of the data-length field of a table creation message.
    #[must_use]
    pub const fn create_table_data_length_bits(&self) -> u32 {
        if self.new_engine() {
            21
        } else {
            20
        }
    }

    /// Width of the table flags field, if the protocol carries one.
    #[must_use]
    pub const fn string_table_flag_bits(&self) -> Option<u32> {
        if self.network_protocol < 15 {
            None
        } else if self.new_engine() {
            Some(2)
        } else {
            Some(1)
        }
    }

    /// Entry indices must be sequential or explicit; later protocols add a
    /// dictionary encoding that is not decoded.
    #[must_use]
    pub const fn supports_explicit_entry_index(&self) -> bool {
        self.network_protocol <= 14
    }
}
