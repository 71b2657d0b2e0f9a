//! Bit-field helpers for 16-bit LC-3 words.
//!
//! Bit 0 is the least significant bit. All functions are pure.

/// Gives the value of `width` bits starting at bit `lsb`, zero-extended.
///
/// The result is always masked to `width` bits.
///
/// # Panics
/// - debug asserts that `width` is in `1..=16` and the field fits into a `u16`
#[must_use]
pub fn extract_field(word: u16, lsb: u8, width: u8) -> u16 {
    debug_assert!(
        (1..=16).contains(&width),
        "width: {width:?} must be between 1 and 16"
    );
    debug_assert!(
        u32::from(lsb) + u32::from(width) <= u16::BITS,
        "field of width {width:?} at {lsb:?} exceeds u16"
    );
    let mask = (1u32 << width) - 1;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "mask never exceeds 16 bits"
    )]
    let mask = mask as u16;
    (word >> lsb) & mask
}

/// Like [`extract_field`] but sign extends the field to 16 bits.
#[must_use]
pub fn extract_signed_field(word: u16, lsb: u8, width: u8) -> u16 {
    sign_extend(extract_field(word, lsb, width), width)
}

#[must_use]
pub const fn bit_set(word: u16, n: u8) -> bool {
    (word >> n) & 1 == 1
}

/// Implements sign extension as described at [Sign extension](https://en.wikipedia.org/wiki/Sign_extension).
///
/// `bits` must not have bits set above `valid_bits`.
#[must_use]
pub const fn sign_extend(bits: u16, valid_bits: u8) -> u16 {
    if valid_bits >= 16 {
        return bits;
    }
    if bit_set(bits, valid_bits - 1) {
        // negative: 1-extend
        bits | (0xFFFF << valid_bits)
    } else {
        // positive, already 0-extended
        bits
    }
}

/// Reinterprets the bits as a 2's complement number.
#[must_use]
pub const fn to_signed(bin_rep: u16) -> i16 {
    bin_rep.cast_signed()
}
