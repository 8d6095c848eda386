//! Bit-addressed access to byte-packed buffers.
//!
//! Every RX state machine keeps its raw samples in a byte-packed circular
//! window and addresses them by bit position modulo the window length. The
//! helpers here implement that addressing once, MSB-first within each byte,
//! so the state machines never do their own shift/mask arithmetic.

/// Reads the bit at `pos` (MSB-first within each byte).
#[inline]
pub fn get_bit(buf: &[u8], pos: usize) -> bool {
    buf[pos >> 3] & (0x80 >> (pos & 7)) != 0
}

/// Writes the bit at `pos` (MSB-first within each byte).
#[inline]
pub fn set_bit(buf: &mut [u8], pos: usize, bit: bool) {
    let mask = 0x80 >> (pos & 7);
    if bit {
        buf[pos >> 3] |= mask;
    } else {
        buf[pos >> 3] &= !mask;
    }
}

/// Copies `count` bits out of a circular window of `len_bits` bits,
/// starting at bit `start` (taken modulo `len_bits`), into `out`
/// packed MSB-first from bit 0.
///
/// `out` must hold at least `count` bits; any trailing bits of the last
/// byte written are cleared.
pub fn read_wrapped(buf: &[u8], start: usize, count: usize, len_bits: usize, out: &mut [u8]) {
    for i in 0..count {
        let bit = get_bit(buf, (start + i) % len_bits);
        set_bit(out, i, bit);
    }
    // clear the slack in the final byte so extracted frames compare cleanly
    let mut i = count;
    while i % 8 != 0 {
        set_bit(out, i, false);
        i += 1;
    }
}

/// Reads `count` bits (at most 32) from a circular window as a big-endian
/// integer, first bit most significant.
pub fn read_field(buf: &[u8], start: usize, count: usize, len_bits: usize) -> u32 {
    let mut v = 0u32;
    for i in 0..count {
        v = (v << 1) | u32::from(get_bit(buf, (start + i) % len_bits));
    }
    v
}
