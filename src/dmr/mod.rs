//! DMR (ETSI TS 102 361) receive-side machinery.
//!
//! DMR is a two-slot TDMA protocol: the channel carries two interleaved
//! logical timeslots, 288 bits each, for a 576-bit TDMA frame period. A
//! burst is 264 bits laid out symmetrically around a mid-burst 48-bit sync
//! field — 98 info bits, 10 slot-type bits, the sync, 10 more slot-type
//! bits, 98 more info bits — so half of the signalling precedes the sync
//! and half follows it. The 20-bit slot type is Golay(20,8)-protected and
//! carries the colour code and the data type.
//!
//! Three receivers live here:
//!
//! - [`DmrRx`]: the full state machine, instantiated per duplex timeslot or
//!   once for simplex (DMO) operation, selected by a [`DmrParams`] table.
//! - [`DmrIdleRx`]: a reduced scanner that surfaces control frames (CSBKs,
//!   e.g. channel grants) seen while the modem is otherwise idle.
//! - The slot-type FEC itself is an external collaborator behind the
//!   [`SlotTypeCodec`] trait.

mod idle_rx;
mod rx;

pub use idle_rx::DmrIdleRx;
pub use rx::DmrRx;

use crate::bitbuf;
use crate::consts::{
    CHAN_DMR1, CHAN_DMR2, FRAME_TAG_DMR1, FRAME_TAG_DMR2, TAG_SLOT1, TAG_SLOT2,
};

/// Length of a DMR burst in bits.
pub const DMR_FRAME_BITS: u16 = 264;

/// Length of a DMR burst in bytes.
pub const DMR_FRAME_BYTES: usize = 33;

/// TDMA frame period in bits (two 288-bit slots).
pub const DMR_SLOT_PERIOD_BITS: u16 = 576;

/// Sample window size in bytes (one full TDMA frame period).
pub const DMR_WINDOW_BYTES: usize = DMR_SLOT_PERIOD_BITS as usize / 8;

/// Offset of the sync field within a burst, in bits.
pub const DMR_SYNC_START: u16 = 108;

/// Offset of the first bit after the sync field within a burst.
pub const DMR_SYNC_END: u16 = 156;

/// Base-station sourced data sync pattern.
pub const DMR_BS_DATA_SYNC: u64 = 0xDFF5_7D75_DF5D;

/// Base-station sourced voice sync pattern.
pub const DMR_BS_VOICE_SYNC: u64 = 0x755F_D7DF_75F7;

/// Mobile-station sourced data sync pattern (used by DMO).
pub const DMR_MS_DATA_SYNC: u64 = 0xD5D7_F77F_D757;

/// Mobile-station sourced voice sync pattern (used by DMO).
pub const DMR_MS_VOICE_SYNC: u64 = 0x7F7D_5DD5_7DFD;

/// Voice frames tolerated without a fresh sync before the lock is
/// declared lost (two full superframes).
pub const DMR_MAX_SYNC_LOST: u8 = 12;

/// Data type: privacy-indicator voice header.
pub const DT_VOICE_PI_HEADER: u8 = 0;
/// Data type: voice link-control header.
pub const DT_VOICE_LC_HEADER: u8 = 1;
/// Data type: terminator with link control.
pub const DT_TERMINATOR_WITH_LC: u8 = 2;
/// Data type: control signalling block.
pub const DT_CSBK: u8 = 3;
/// Data type: multi-block control header.
pub const DT_MBC_HEADER: u8 = 4;
/// Data type: multi-block control continuation.
pub const DT_MBC_CONTINUATION: u8 = 5;
/// Data type: data header.
pub const DT_DATA_HEADER: u8 = 6;
/// Data type: rate 1/2 payload.
pub const DT_RATE_12_DATA: u8 = 7;
/// Data type: rate 3/4 payload.
pub const DT_RATE_34_DATA: u8 = 8;
/// Data type: idle filler.
pub const DT_IDLE: u8 = 9;
/// Data type: rate 1 payload.
pub const DT_RATE_1_DATA: u8 = 10;

/// External forward-error-correction codec for the 20-bit slot type field.
///
/// The field carries four colour-code bits and four data-type bits under
/// Golay(20,8) protection; correction is outside this crate. `decode`
/// returns `(colour_code, data_type)`, or `None` when the field is
/// uncorrectable.
pub trait SlotTypeCodec {
    /// Decodes a 20-bit slot type field (in the low bits of `field`).
    fn decode(&self, field: u32) -> Option<(u8, u8)>;
}

/// Codec that trusts the systematic bits without running the Golay check.
///
/// Useful for bring-up and for hosts that do their own FEC downstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawSlotType;

impl SlotTypeCodec for RawSlotType {
    fn decode(&self, field: u32) -> Option<(u8, u8)> {
        let cc = ((field >> 16) & 0x0F) as u8;
        let dt = ((field >> 12) & 0x0F) as u8;
        Some((cc, dt))
    }
}

/// Which sync pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    /// The data sync pattern.
    Data,
    /// The voice sync pattern.
    Voice,
}

/// Protocol-geometry table selecting a [`DmrRx`] personality.
///
/// The duplex slots and the simplex (DMO) variant share one machine shape
/// and differ only in these constants, so the variants are plain static
/// tables instead of separate builds.
#[derive(Debug)]
pub struct DmrParams {
    /// Data sync pattern for this variant's direction.
    pub sync_data: u64,
    /// Voice sync pattern for this variant's direction.
    pub sync_voice: u64,
    /// Maximum sync bit errors accepted for initial acquisition.
    pub acq_errs: u32,
    /// Maximum sync bit errors accepted once locked.
    pub run_errs: u32,
    /// When set, unsynchronized acquisition only considers samples carrying
    /// this hardware slot tag.
    pub gate_tag: Option<u8>,
    /// Host-link frame tag for emitted frames.
    pub frame_tag: u8,
    /// Channel id for lost-lock notifications.
    pub channel: u8,
}

/// Duplex timeslot 1 personality.
pub static DMR_DUPLEX_SLOT1: DmrParams = DmrParams {
    sync_data: DMR_BS_DATA_SYNC,
    sync_voice: DMR_BS_VOICE_SYNC,
    acq_errs: 2,
    run_errs: 4,
    gate_tag: Some(TAG_SLOT1),
    frame_tag: FRAME_TAG_DMR1,
    channel: CHAN_DMR1,
};

/// Duplex timeslot 2 personality.
pub static DMR_DUPLEX_SLOT2: DmrParams = DmrParams {
    sync_data: DMR_BS_DATA_SYNC,
    sync_voice: DMR_BS_VOICE_SYNC,
    acq_errs: 2,
    run_errs: 4,
    gate_tag: Some(TAG_SLOT2),
    frame_tag: FRAME_TAG_DMR2,
    channel: CHAN_DMR2,
};

/// Simplex (DMO) personality. The single channel is always present, so the
/// error tolerance is tighter than duplex.
pub static DMR_DMO: DmrParams = DmrParams {
    sync_data: DMR_MS_DATA_SYNC,
    sync_voice: DMR_MS_VOICE_SYNC,
    acq_errs: 1,
    run_errs: 3,
    gate_tag: None,
    frame_tag: FRAME_TAG_DMR1,
    channel: CHAN_DMR1,
};

/// Assembles the 20-bit slot type field from an extracted burst
/// (10 bits either side of the sync field).
pub fn slot_type_field(frame: &[u8; DMR_FRAME_BYTES]) -> u32 {
    let first = bitbuf::read_field(frame, 98, 10, DMR_FRAME_BITS as usize);
    let second = bitbuf::read_field(frame, DMR_SYNC_END as usize, 10, DMR_FRAME_BITS as usize);
    (first << 10) | second
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitbuf;

    #[test]
    fn test_slot_type_field_assembly() {
        let mut frame = [0u8; DMR_FRAME_BYTES];
        // field = cc 0b0101, dt 0b0110, parity zero -> 0b01010110_000000000000
        let field: u32 = (0x5 << 16) | (0x6 << 12);
        for i in 0..10usize {
            bitbuf::set_bit(&mut frame, 98 + i, (field >> (19 - i)) & 1 != 0);
        }
        for i in 0..10usize {
            bitbuf::set_bit(&mut frame, 156 + i, (field >> (9 - i)) & 1 != 0);
        }
        assert_eq!(slot_type_field(&frame), field);
    }

    #[test]
    fn test_raw_slot_type_decode() {
        let codec = RawSlotType;
        let field: u32 = (0x3 << 16) | (DT_CSBK as u32) << 12 | 0x5A3;
        assert_eq!(codec.decode(field), Some((3, DT_CSBK)));
    }
}
