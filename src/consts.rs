//! Constants shared across the frame recovery engine.
//!
//! Protocol-specific geometry (sync patterns, burst layouts, frame lengths)
//! lives with the owning protocol module; this module only defines the
//! values that cross module boundaries: the sample ring sizing, the
//! host-link framing tags, and the status byte layout.
//!
//! ## Status byte
//!
//! Every frame handed to the host link starts with one status byte:
//!
//! | Bits      | Meaning |
//! |-----------|---------|
//! | `0x80`    | Two big-endian RSSI bytes are appended after the payload |
//! | `0x40`    | A sync field was matched inside this frame |
//! | `0x20`    | Voice frame; the low nibble carries the superframe sequence |
//! | `0x0F`    | Frame subtype (DMR data type, P25 DUID) or voice sequence |

/// Capacity of the sample ring buffer, in bits.
///
/// At typical channel bit rates (4.8–9.6 kbit/s) this gives the main loop
/// better than 100 ms of slack before the producer overruns it.
pub const RING_BITS: usize = 1024;

/// Status flag: two big-endian RSSI bytes follow the payload.
pub const STATUS_RSSI: u8 = 0x80;

/// Status flag: this frame contained a matched sync field.
pub const STATUS_SYNC: u8 = 0x40;

/// Status flag: voice frame; low nibble is the superframe sequence number.
pub const STATUS_VOICE: u8 = 0x20;

/// Mask over the status byte's subtype / sequence nibble.
pub const STATUS_SEQ_MASK: u8 = 0x0F;

/// Host-link frame tag for DMR slot 1 (also used for DMO and idle-channel
/// frames, which are slot-less).
pub const FRAME_TAG_DMR1: u8 = 0x18;

/// Host-link frame tag for DMR slot 2.
pub const FRAME_TAG_DMR2: u8 = 0x1A;

/// Host-link frame tag for P25 frames.
pub const FRAME_TAG_P25: u8 = 0x31;

/// Host-link frame tag for NXDN frames.
pub const FRAME_TAG_NXDN: u8 = 0x41;

/// Channel id reported by lost-lock notifications: DMR slot 1 / DMO.
pub const CHAN_DMR1: u8 = 0;

/// Channel id reported by lost-lock notifications: DMR slot 2.
pub const CHAN_DMR2: u8 = 1;

/// Channel id reported by lost-lock notifications: P25.
pub const CHAN_P25: u8 = 2;

/// Channel id reported by lost-lock notifications: NXDN.
pub const CHAN_NXDN: u8 = 3;

/// Control tag for samples with no timeslot identity (simplex modes, or
/// duplex bits between hardware slot marks).
pub const TAG_NONE: u8 = 0;

/// Control tag marking a sample as belonging to DMR timeslot 1.
pub const TAG_SLOT1: u8 = 1;

/// Control tag marking a sample as belonging to DMR timeslot 2.
pub const TAG_SLOT2: u8 = 2;

/// Largest payload handed to the host link: a P25 LDU (216 bytes) plus the
/// status byte and the optional RSSI annotation.
pub const HOST_BUF_LEN: usize = 224;
