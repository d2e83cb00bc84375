//! Sound event records carried by `SvcSounds`.

use std::fmt;

use bitstream::BitReader;
use tracing::debug;
use wire::{ProtocolSettings, MAX_EDICT_BITS};

use crate::delta::{decode_chain, read_counter, read_or, DeltaRecord};
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::session::DecodeSession;
use crate::entry::SOUND_PRECACHE;
use crate::types::Vector3;

/// Width of a sound sequence number.
pub const SOUND_SEQUENCE_BITS: u32 = 10;
/// Mask applied to the client's reliable sound counter.
pub const SOUND_SEQUENCE_MASK: u32 = (1 << SOUND_SEQUENCE_BITS) - 1;

const SOUND_LEVEL_BITS: u32 = 9;
const SOUND_DELAY_MSEC_BITS: u32 = 13;
const SOUND_DELAY_OFFSET: f32 = 0.1;
const ORIGIN_BITS: u32 = 12;
const CHANNEL_BITS: u32 = 3;

/// Sound flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SoundFlags(u32);

impl SoundFlags {
    pub const CHANGE_VOLUME: Self = Self(1);
    pub const CHANGE_PITCH: Self = Self(1 << 1);
    pub const STOP: Self = Self(1 << 2);
    pub const SPAWNING: Self = Self(1 << 3);
    pub const DELAY: Self = Self(1 << 4);
    pub const STOP_LOOPING: Self = Self(1 << 5);
    pub const SPEAKER: Self = Self(1 << 6);
    pub const SHOULD_PAUSE: Self = Self(1 << 7);
    pub const IGNORE_PHONEMES: Self = Self(1 << 8);
    pub const IGNORE_NAME: Self = Self(1 << 9);
    /// New engine only.
    pub const IS_SCRIPT_HANDLE: Self = Self(1 << 10);
    pub const UPDATE_DELAY_FOR_CHOREO: Self = Self(1 << 11);
    pub const GENERATE_GUID: Self = Self(1 << 12);
    pub const OVERRIDE_PITCH: Self = Self(1 << 13);

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The stop flag alone. Stop combined with anything else is not a stop.
    #[must_use]
    pub const fn is_stop(self) -> bool {
        self.0 == Self::STOP.0
    }
}

impl fmt::Display for SoundFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 14] = [
            "ChangeVol",
            "ChangePitch",
            "Stop",
            "Spawning",
            "Delay",
            "StopLooping",
            "Speaker",
            "ShouldPause",
            "IgnorePhonemes",
            "IgnoreName",
            "IsScriptHandle",
            "UpdateDelayForChoreo",
            "GenerateGuid",
            "OverridePitch",
        ];
        if self.0 == 0 {
            return f.write_str("None");
        }
        let mut first = true;
        for (bit, name) in NAMES.iter().enumerate() {
            if self.0 & (1 << bit) != 0 {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        let unknown = self.0 & !((1 << NAMES.len()) - 1);
        if unknown != 0 {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{unknown:#x}")?;
        }
        Ok(())
    }
}

/// Sound channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Channel {
    Auto,
    Weapon,
    Voice,
    Item,
    Body,
    Stream,
    Static,
    VoiceBase,
}

impl Channel {
    /// Maps a 3-bit channel code.
    #[must_use]
    pub const fn from_code(code: u64) -> Self {
        match code & 0b111 {
            0 => Self::Auto,
            1 => Self::Weapon,
            2 => Self::Voice,
            3 => Self::Item,
            4 => Self::Body,
            5 => Self::Stream,
            6 => Self::Static,
            _ => Self::VoiceBase,
        }
    }
}

/// One sound event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SoundInfo {
    pub entity_index: u32,
    /// Index into `soundprecache`; absent when the sound is a script handle.
    pub sound_num: Option<u32>,
    /// New engine script sounds only.
    pub script_hash: Option<u32>,
    /// Resolved from `soundprecache` when that table is readable.
    pub sound_name: Option<String>,
    pub flags: SoundFlags,
    pub channel: Channel,
    pub is_ambient: bool,
    pub is_sentence: bool,
    pub sequence_number: u32,
    pub volume: f32,
    pub sound_level: u32,
    pub pitch: u32,
    /// New engine only.
    pub random_seed: Option<i32>,
    pub delay: f32,
    pub origin: Vector3,
    pub speaker_entity: i32,
}

impl SoundInfo {
    /// Applies the fixed values a stop event carries instead of its fields.
    fn clear_stop_fields(&mut self) {
        self.volume = 0.0;
        self.sound_level = 0;
        self.pitch = 100;
        self.sound_name = None;
        self.delay = 0.0;
        self.sequence_number = 0;
        self.origin = Vector3::ZERO;
        self.speaker_entity = -1;
    }
}

impl DeltaRecord for SoundInfo {
    fn default_baseline(settings: &ProtocolSettings) -> Self {
        Self {
            entity_index: 0,
            sound_num: Some(0),
            script_hash: None,
            sound_name: None,
            flags: SoundFlags::empty(),
            channel: Channel::Static,
            is_ambient: false,
            is_sentence: false,
            sequence_number: 0,
            volume: 1.0,
            sound_level: 75,
            pitch: 100,
            random_seed: settings.new_engine().then_some(0),
            delay: 0.0,
            origin: Vector3::ZERO,
            speaker_entity: -1,
        }
    }

    fn decode_delta(
        reader: &mut BitReader<'_>,
        baseline: &Self,
        settings: &ProtocolSettings,
    ) -> CodecResult<Self> {
        let mut sound = baseline.clone();

        sound.entity_index = read_or(reader, baseline.entity_index, |r| {
            let bits = if r.read_bit()? { 5 } else { MAX_EDICT_BITS };
            r.read_u32_bits(bits)
        })?;

        let flag_bits = settings.sound_flag_bits();
        let index_bits = settings.sound_index_bits();
        if settings.new_engine() {
            sound.flags = read_flags(reader, baseline.flags, flag_bits)?;
            if sound.flags.contains(SoundFlags::IS_SCRIPT_HANDLE) {
                sound.script_hash = Some(reader.read_u32()?);
            } else {
                sound.sound_num = read_sound_num(reader, baseline.sound_num, index_bits)?;
            }
        } else {
            sound.sound_num = read_sound_num(reader, baseline.sound_num, index_bits)?;
            sound.flags = read_flags(reader, baseline.flags, flag_bits)?;
        }
        sound.channel = reader
            .read_bits_if_exists(CHANNEL_BITS)?
            .map_or(baseline.channel, Channel::from_code);

        sound.is_ambient = reader.read_bit()?;
        sound.is_sentence = reader.read_bit()?;

        if sound.flags.is_stop() {
            sound.clear_stop_fields();
            return Ok(sound);
        }

        sound.sequence_number = read_counter(reader, baseline.sequence_number, SOUND_SEQUENCE_BITS)?;
        sound.volume = read_or(reader, baseline.volume, |r| {
            Ok(r.read_u32_bits(7)? as f32 / 127.0)
        })?;
        sound.sound_level = read_or(reader, baseline.sound_level, |r| r.read_u32_bits(SOUND_LEVEL_BITS))?;
        sound.pitch = read_or(reader, baseline.pitch, |r| r.read_u32_bits(8))?;

        if settings.new_engine() {
            sound.random_seed = read_or(reader, baseline.random_seed, |r| {
                r.read_i32_bits(6).map(Some)
            })?;
            sound.delay = reader.read_f32_if_exists()?.unwrap_or(baseline.delay);
        } else {
            sound.delay = read_or(reader, baseline.delay, |r| {
                let mut delay = r.read_i32_bits(SOUND_DELAY_MSEC_BITS)? as f32 / 1000.0;
                if delay < 0.0 {
                    delay *= 10.0;
                }
                Ok(delay - SOUND_DELAY_OFFSET)
            })?;
        }

        let mut axis = |inherited: f32| {
            read_or(reader, inherited, |r| Ok(r.read_i32_bits(ORIGIN_BITS)? as f32 * 8.0))
        };
        sound.origin = Vector3::new(
            axis(baseline.origin.x)?,
            axis(baseline.origin.y)?,
            axis(baseline.origin.z)?,
        );
        sound.speaker_entity = read_or(reader, baseline.speaker_entity, |r| {
            r.read_i32_bits(MAX_EDICT_BITS + 1)
        })?;

        Ok(sound)
    }
}

fn read_flags(reader: &mut BitReader<'_>, inherited: SoundFlags, bits: u32) -> CodecResult<SoundFlags> {
    Ok(reader
        .read_bits_if_exists(bits)?
        .map_or(inherited, |raw| SoundFlags::from_raw(raw as u32)))
}

fn read_sound_num(reader: &mut BitReader<'_>, inherited: Option<u32>, bits: u32) -> CodecResult<Option<u32>> {
    Ok(reader
        .read_bits_if_exists(bits)?
        .map_or(inherited, |raw| Some(raw as u32)))
}

/// Decoded `SvcSounds` body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SoundsMessage {
    pub reliable: bool,
    /// `None` when the sound list could not be decoded cleanly.
    pub sounds: Option<Vec<SoundInfo>>,
}

/// Decodes an `SvcSounds` body.
///
/// Errors inside the sound list are reported as a diagnostic and leave
/// `sounds` empty; only a truncated header fails the message.
pub(crate) fn decode_sounds(
    reader: &mut BitReader<'_>,
    session: &mut DecodeSession,
) -> CodecResult<SoundsMessage> {
    let reliable = reader.read_bit()?;
    let count = if reliable { 1 } else { usize::from(reader.read_u8()?) };
    let length = reader.read_bits(if reliable { 8 } else { 16 })? as usize;
    let mut body = reader.split_and_skip(length)?;

    let sounds = match decode_sound_list(&mut body, count, reliable, session) {
        Ok(sounds) if body.is_empty() => Some(sounds),
        Ok(_) => {
            session.diagnostics.push(format!(
                "error while decoding sounds: {} bits left to read",
                body.bits_remaining()
            ));
            None
        }
        Err(e) => {
            session
                .diagnostics
                .push(format!("error while decoding sounds: {e}"));
            None
        }
    };
    debug!(reliable, count, decoded = sounds.is_some(), "sounds");
    Ok(SoundsMessage { reliable, sounds })
}

fn decode_sound_list(
    body: &mut BitReader<'_>,
    count: usize,
    reliable: bool,
    session: &mut DecodeSession,
) -> CodecResult<Vec<SoundInfo>> {
    if count > session.limits.max_sounds_per_message {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::SoundsPerMessage,
            limit: session.limits.max_sounds_per_message,
            actual: count,
        });
    }
    let settings = session.settings;
    let mut sounds = decode_chain(body, count, SoundInfo::default_baseline(&settings), &settings)?;

    if reliable {
        session.client_sound_sequence = (session.client_sound_sequence + 1) & SOUND_SEQUENCE_MASK;
        for sound in &mut sounds {
            if sound.sequence_number != 0 {
                return Err(CodecError::SoundSequenceMismatch {
                    found: sound.sequence_number,
                });
            }
            sound.sequence_number = session.client_sound_sequence;
        }
    }

    for sound in &mut sounds {
        resolve_sound_name(sound, session);
    }
    Ok(sounds)
}

fn resolve_sound_name(sound: &mut SoundInfo, session: &mut DecodeSession) {
    let Some(index) = sound.sound_num else {
        return;
    };
    let Ok(table) = session.tables.table(SOUND_PRECACHE) else {
        return;
    };
    let index = index as usize;
    if index >= table.entries.len() {
        let message = format!("sound index out of range: {index}");
        session.diagnostics.push(message);
    } else if index != 0 && !sound.flags.is_stop() {
        sound.sound_name = Some(table.entries[index].name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::BitWriter;

    /// Writes a record whose every optional field is absent.
    fn write_all_absent(w: &mut BitWriter) {
        w.write_bit(false); // entity
        w.write_bit(false); // sound num
        w.write_bit(false); // flags
        w.write_bit(false); // channel
        w.write_bit(false); // ambient
        w.write_bit(false); // sentence
        w.write_bit(true); // sequence: copy
        w.write_bit(false); // volume
        w.write_bit(false); // level
        w.write_bit(false); // pitch
        w.write_bit(false); // delay
        w.write_bit(false); // origin x
        w.write_bit(false); // origin y
        w.write_bit(false); // origin z
        w.write_bit(false); // speaker
    }

    fn fresh_baseline_bits(w: &mut BitWriter) {
        w.write_bit(true);
        w.write_bit(false);
        w.write_bits(300, MAX_EDICT_BITS).unwrap();
        w.write_bit(true);
        w.write_bits(12, 13).unwrap();
        w.write_bit(true);
        w.write_bits(u64::from(SoundFlags::CHANGE_PITCH.raw()), 9).unwrap();
        w.write_bit(true);
        w.write_bits(1, CHANNEL_BITS).unwrap();
        w.write_bit(true); // ambient
        w.write_bit(false); // sentence
        w.write_bit(false);
        w.write_bit(false);
        w.write_bits(77, SOUND_SEQUENCE_BITS).unwrap();
        w.write_bit(true);
        w.write_bits(127, 7).unwrap();
        w.write_bit(true);
        w.write_bits(90, SOUND_LEVEL_BITS).unwrap();
        w.write_bit(true);
        w.write_bits(120, 8).unwrap();
        w.write_bit(true);
        w.write_signed(-50, SOUND_DELAY_MSEC_BITS).unwrap();
        w.write_bit(true);
        w.write_signed(-4, ORIGIN_BITS).unwrap();
        w.write_bit(true);
        w.write_signed(2, ORIGIN_BITS).unwrap();
        w.write_bit(false);
        w.write_bit(true);
        w.write_signed(5, MAX_EDICT_BITS + 1).unwrap();
    }

    #[test]
    fn fresh_fields_decode() {
        let settings = ProtocolSettings::old_engine();
        let mut writer = BitWriter::new();
        fresh_baseline_bits(&mut writer);
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);

        let sound =
            SoundInfo::decode_delta(&mut reader, &SoundInfo::default_baseline(&settings), &settings)
                .unwrap();
        assert_eq!(sound.entity_index, 300);
        assert_eq!(sound.sound_num, Some(12));
        assert_eq!(sound.flags, SoundFlags::CHANGE_PITCH);
        assert_eq!(sound.channel, Channel::Weapon);
        assert!(sound.is_ambient);
        assert_eq!(sound.sequence_number, 77);
        assert_eq!(sound.volume, 1.0);
        assert_eq!(sound.sound_level, 90);
        assert_eq!(sound.pitch, 120);
        assert!((sound.delay - (-0.6)).abs() < 1e-6);
        assert_eq!(sound.origin, Vector3::new(-32.0, 16.0, 0.0));
        assert_eq!(sound.speaker_entity, 5);
        assert_eq!(sound.random_seed, None);
    }

    #[test]
    fn absent_fields_reproduce_baseline() {
        let settings = ProtocolSettings::old_engine();
        let mut writer = BitWriter::new();
        fresh_baseline_bits(&mut writer);
        write_all_absent(&mut writer);
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);

        let chain =
            decode_chain(&mut reader, 2, SoundInfo::default_baseline(&settings), &settings).unwrap();
        assert_eq!(chain[1].entity_index, chain[0].entity_index);
        let mut expected = chain[0].clone();
        expected.is_ambient = false;
        assert_eq!(chain[1], expected);
    }

    #[test]
    fn stop_resets_fixed_subset() {
        let settings = ProtocolSettings::old_engine();
        let mut baseline = SoundInfo::default_baseline(&settings);
        baseline.volume = 0.5;
        baseline.pitch = 140;
        baseline.sound_level = 80;
        baseline.sequence_number = 9;
        baseline.sound_name = Some("ambient/alarm.wav".to_string());
        baseline.origin = Vector3::new(1.0, 2.0, 3.0);
        baseline.entity_index = 44;

        let mut writer = BitWriter::new();
        writer.write_bit(false); // entity
        writer.write_bit(false); // sound num
        writer.write_bit(true);
        writer.write_bits(u64::from(SoundFlags::STOP.raw()), 9).unwrap();
        writer.write_bit(false); // channel
        writer.write_bit(false);
        writer.write_bit(false);
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);

        let sound = SoundInfo::decode_delta(&mut reader, &baseline, &settings).unwrap();
        assert_eq!(sound.volume, 0.0);
        assert_eq!(sound.sound_level, 0);
        assert_eq!(sound.pitch, 100);
        assert_eq!(sound.sequence_number, 0);
        assert_eq!(sound.sound_name, None);
        assert_eq!(sound.origin, Vector3::ZERO);
        assert_eq!(sound.speaker_entity, -1);
        assert_eq!(sound.entity_index, 44);
        assert_eq!(reader.bit_position(), 15);
    }

    #[test]
    fn stop_with_other_flags_is_not_a_stop() {
        let flags = SoundFlags::from_raw(SoundFlags::STOP.raw() | SoundFlags::DELAY.raw());
        assert!(flags.contains(SoundFlags::STOP));
        assert!(!flags.is_stop());
        assert_eq!(flags.to_string(), "Stop | Delay");
        assert_eq!(SoundFlags::empty().to_string(), "None");
    }

    #[test]
    fn new_engine_script_handle_reads_hash() {
        let settings = ProtocolSettings::new_engine_portal2();
        let mut writer = BitWriter::new();
        writer.write_bit(false); // entity
        writer.write_bit(true);
        writer
            .write_bits(u64::from(SoundFlags::IS_SCRIPT_HANDLE.raw()), 13)
            .unwrap();
        writer.write_u32(0xDEAD_BEEF);
        writer.write_bit(false); // channel
        writer.write_bit(false);
        writer.write_bit(false);
        writer.write_bit(true); // sequence copy
        writer.write_bit(false); // volume
        writer.write_bit(false); // level
        writer.write_bit(false); // pitch
        writer.write_bit(true);
        writer.write_signed(-3, 6).unwrap();
        writer.write_bit(true);
        writer.write_f32(0.25);
        writer.write_bit(false);
        writer.write_bit(false);
        writer.write_bit(false);
        writer.write_bit(false);
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);

        let sound =
            SoundInfo::decode_delta(&mut reader, &SoundInfo::default_baseline(&settings), &settings)
                .unwrap();
        assert_eq!(sound.script_hash, Some(0xDEAD_BEEF));
        assert_eq!(sound.sound_num, Some(0));
        assert_eq!(sound.random_seed, Some(-3));
        assert_eq!(sound.delay, 0.25);
    }
}
