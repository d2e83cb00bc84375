//! Configurable limits for bounded framing.

/// Framing limits.
///
/// Enforced while segmenting so a hostile or corrupt length field cannot
/// make the decoder walk or allocate without bound. Message and table
/// limits belong to the codec crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of a whole recording in bytes.
    pub max_demo_bytes: usize,

    /// Maximum number of frames in a recording.
    pub max_frames: usize,

    /// Maximum payload length of a single frame in bytes.
    pub max_frame_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Long sessions run to a few hundred megabytes
            max_demo_bytes: 1024 * 1024 * 1024,
            max_frames: 1 << 24,
            max_frame_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_demo_bytes: 64 * 1024,
            max_frames: 256,
            max_frame_bytes: 4096,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_demo_bytes: usize::MAX,
            max_frames: usize::MAX,
            max_frame_bytes: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_limits_smaller() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();

        assert!(test_limits.max_demo_bytes < default_limits.max_demo_bytes);
        assert!(test_limits.max_frames < default_limits.max_frames);
        assert!(test_limits.max_frame_bytes < default_limits.max_frame_bytes);
    }

    #[test]
    fn unlimited_is_max() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_frames, usize::MAX);
    }
}
