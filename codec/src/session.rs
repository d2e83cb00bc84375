//! Decode session state.

use tracing::warn;
use wire::ProtocolSettings;

use crate::limits::DecodeLimits;
use crate::stringtable::{StringTableReplica, UpdateContext};
use crate::usercmd::UserCmd;

/// Ordered log of recoverable decode failures.
///
/// One entry per failure, each naming the message, table or record that
/// failed. Every push is also logged at `warn`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Diagnostics(Vec<String>);

impl Diagnostics {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.0.push(message);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// State carried across the frames of one recording.
///
/// Frames must be fed in recording order: table lookups and delta chains
/// see exactly the updates decoded before them.
#[derive(Debug, Clone)]
pub struct DecodeSession {
    pub settings: ProtocolSettings,
    pub limits: DecodeLimits,
    pub tables: StringTableReplica,
    pub diagnostics: Diagnostics,
    /// Client-side counter assigned to reliable sounds.
    pub client_sound_sequence: u32,
    /// Previous user command; the next one inherits from it.
    pub user_cmd_baseline: UserCmd,
    /// Latest engine tick announced by `NetTick`.
    pub engine_tick: Option<u32>,
    /// Server tick interval announced by `SvcServerInfo`.
    pub tick_interval: Option<f32>,
}

impl DecodeSession {
    #[must_use]
    pub fn new(settings: ProtocolSettings, limits: DecodeLimits) -> Self {
        Self {
            settings,
            limits,
            tables: StringTableReplica::new(),
            diagnostics: Diagnostics::default(),
            client_sound_sequence: 0,
            user_cmd_baseline: UserCmd::default(),
            engine_tick: None,
            tick_interval: None,
        }
    }

    /// Splits the session into the replica and the context its updates need.
    pub fn table_context(&mut self) -> (&mut StringTableReplica, UpdateContext<'_>) {
        let ctx = UpdateContext::new(&self.settings, &self.limits, &mut self.diagnostics);
        (&mut self.tables, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_keep_order() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push("first");
        diagnostics.push(String::from("second"));
        assert_eq!(diagnostics.iter().collect::<Vec<_>>(), ["first", "second"]);
        assert_eq!(diagnostics.into_vec().len(), 2);
    }

    #[test]
    fn new_session_is_empty() {
        let session = DecodeSession::new(ProtocolSettings::old_engine(), DecodeLimits::default());
        assert!(session.tables.is_empty());
        assert!(session.diagnostics.is_empty());
        assert_eq!(session.engine_tick, None);
    }
}
