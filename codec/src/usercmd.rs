//! Player input records carried by `UserCmd` frames.

use bitstream::BitReader;
use wire::ProtocolSettings;

use crate::delta::{read_or, DeltaRecord};
use crate::error::CodecResult;

const WEAPON_SELECT_BITS: u32 = 11;
const WEAPON_SUBTYPE_BITS: u32 = 6;

/// One player input command.
///
/// Commands chain across the frames of a recording: each inherits absent
/// fields from the previous command.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UserCmd {
    pub command_number: u32,
    pub tick_count: u32,
    pub view_angles: [f32; 3],
    pub forward_move: f32,
    pub side_move: f32,
    pub up_move: f32,
    pub buttons: u32,
    pub impulse: u8,
    pub weapon_select: u32,
    pub weapon_subtype: u32,
    pub mouse_dx: i16,
    pub mouse_dy: i16,
}

impl DeltaRecord for UserCmd {
    fn default_baseline(_settings: &ProtocolSettings) -> Self {
        Self::default()
    }

    fn decode_delta(
        reader: &mut BitReader<'_>,
        baseline: &Self,
        _settings: &ProtocolSettings,
    ) -> CodecResult<Self> {
        let mut cmd = baseline.clone();
        cmd.command_number = read_or(reader, baseline.command_number, |r| r.read_u32())?;
        cmd.tick_count = read_or(reader, baseline.tick_count, |r| r.read_u32())?;
        for (angle, inherited) in cmd.view_angles.iter_mut().zip(baseline.view_angles) {
            *angle = read_or(reader, inherited, |r| r.read_f32())?;
        }
        cmd.forward_move = read_or(reader, baseline.forward_move, |r| r.read_f32())?;
        cmd.side_move = read_or(reader, baseline.side_move, |r| r.read_f32())?;
        cmd.up_move = read_or(reader, baseline.up_move, |r| r.read_f32())?;
        cmd.buttons = read_or(reader, baseline.buttons, |r| r.read_u32())?;
        cmd.impulse = read_or(reader, baseline.impulse, |r| r.read_u8())?;
        if reader.read_bit()? {
            cmd.weapon_select = reader.read_u32_bits(WEAPON_SELECT_BITS)?;
            cmd.weapon_subtype = read_or(reader, baseline.weapon_subtype, |r| {
                r.read_u32_bits(WEAPON_SUBTYPE_BITS)
            })?;
        }
        cmd.mouse_dx = read_or(reader, baseline.mouse_dx, |r| Ok(r.read_u16()? as i16))?;
        cmd.mouse_dy = read_or(reader, baseline.mouse_dy, |r| Ok(r.read_u16()? as i16))?;
        Ok(cmd)
    }
}
