//! Single-producer/single-consumer ring buffer of bit samples.
//!
//! This is the hand-off point between the hardware-event context (the radio
//! timing interrupt, which decides one bit per event) and the cooperative
//! main loop that runs the protocol state machines. The producer only ever
//! writes the head cursor and the consumer only ever writes the tail cursor,
//! so a single producer and a single consumer need no locking beyond keeping
//! each side in its own context.
//!
//! Each sample is one decided bit plus an 8-bit control tag; the data side
//! is bit-packed, the tags live in a parallel byte array. All operations are
//! O(1) and allocation-free.

use crate::bitbuf;
use crate::consts::RING_BITS;

/// Fixed-capacity circular buffer of `(bit, tag)` samples.
///
/// A `put` on a full buffer fails, drops the new sample, and latches the
/// sticky [`overflow`](SampleRB::overflow_and_clear) flag; the oldest
/// buffered data is always preserved.
#[derive(Debug)]
pub struct SampleRB {
    data: [u8; RING_BITS / 8],
    control: [u8; RING_BITS],
    head: usize,
    tail: usize,
    full: bool,
    overflow: bool,
}

impl SampleRB {
    /// Creates an empty ring.
    pub const fn new() -> Self {
        Self {
            data: [0u8; RING_BITS / 8],
            control: [0u8; RING_BITS],
            head: 0,
            tail: 0,
            full: false,
            overflow: false,
        }
    }

    /// Appends one sample.
    ///
    /// Returns `false` without modifying the buffered data if the ring is
    /// full; the overflow flag is latched until read back through
    /// [`overflow_and_clear`](SampleRB::overflow_and_clear).
    pub fn put(&mut self, bit: bool, tag: u8) -> bool {
        if self.full {
            self.overflow = true;
            return false;
        }
        bitbuf::set_bit(&mut self.data, self.head, bit);
        self.control[self.head] = tag;
        self.head = (self.head + 1) % RING_BITS;
        self.full = self.head == self.tail;
        true
    }

    /// Removes and returns the oldest sample, or `None` when empty.
    pub fn get(&mut self) -> Option<(bool, u8)> {
        if !self.full && self.head == self.tail {
            return None;
        }
        let bit = bitbuf::get_bit(&self.data, self.tail);
        let tag = self.control[self.tail];
        self.tail = (self.tail + 1) % RING_BITS;
        self.full = false;
        Some((bit, tag))
    }

    /// Number of free sample slots.
    pub fn space(&self) -> usize {
        if self.full {
            0
        } else if self.head >= self.tail {
            RING_BITS - (self.head - self.tail)
        } else {
            self.tail - self.head
        }
    }

    /// Number of buffered samples.
    pub fn occupied(&self) -> usize {
        RING_BITS - self.space()
    }

    /// Reads and clears the sticky overflow flag.
    pub fn overflow_and_clear(&mut self) -> bool {
        let o = self.overflow;
        self.overflow = false;
        o
    }

    /// Discards all buffered samples. The overflow flag is left alone.
    pub fn clear(&mut self) {
        self.tail = self.head;
        self.full = false;
    }
}

impl Default for SampleRB {
    fn default() -> Self {
        Self::new()
    }
}
