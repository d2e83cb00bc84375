//! Bit-width helpers for count fields sized to a maximum.

/// Index of the highest set bit, `floor(log2(value))`; zero for zero.
#[must_use]
pub const fn highest_bit_index(value: u32) -> u32 {
    if value == 0 {
        0
    } else {
        31 - value.leading_zeros()
    }
}

/// Bits needed to encode a count in `0..=max`, as the wire lays it out.
#[must_use]
pub const fn bits_for_count(max: u32) -> u32 {
    highest_bit_index(max) + 1
}
