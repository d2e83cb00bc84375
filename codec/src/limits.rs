//! Limits for message and table decoding.

/// Codec-level limits enforced while decoding frame payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum number of messages decoded from one message stream.
    pub max_messages_per_stream: usize,
    /// Maximum number of sound records in one sounds message.
    pub max_sounds_per_message: usize,
    /// Maximum number of string tables in a session.
    pub max_tables: usize,
    /// Maximum number of entries in a single string table.
    pub max_table_entries: usize,
    /// Maximum number of classes attached to a single string table.
    pub max_table_classes: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_messages_per_stream: 4096,
            max_sounds_per_message: 256,
            // Table ids are 5 bits wide
            max_tables: 32,
            max_table_entries: 1 << 16,
            max_table_classes: 4096,
        }
    }
}

impl DecodeLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_messages_per_stream: 64,
            max_sounds_per_message: 16,
            max_tables: 8,
            max_table_entries: 64,
            max_table_classes: 16,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_messages_per_stream: usize::MAX,
            max_sounds_per_message: usize::MAX,
            max_tables: usize::MAX,
            max_table_entries: usize::MAX,
            max_table_classes: usize::MAX,
        }
    }
}
