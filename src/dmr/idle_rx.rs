//! Idle-channel DMR control-frame scanner.
//!
//! While the modem is otherwise idle this reduced receiver watches for the
//! base-station data sync and surfaces control signalling (such as channel
//! grants) without tracking calls: no superframes, no lock-loss counter,
//! and only CSBK frames are forwarded.

use crate::bitbuf;
use crate::consts::{FRAME_TAG_DMR1, STATUS_SYNC};
use crate::correlator::{MASK48, SyncCorrelator};
use crate::link::{FrameWriter, HostLink, RssiSource};
use crate::trace_sync;

use super::{
    DMR_BS_DATA_SYNC, DMR_FRAME_BITS, DMR_FRAME_BYTES, DMR_SLOT_PERIOD_BITS, DMR_SYNC_END,
    DMR_WINDOW_BYTES, DT_CSBK, SlotTypeCodec, slot_type_field,
};

/// Sync bit errors tolerated by the scanner. There is no higher-layer lock
/// to fall back on, so this stays strict.
const IDLE_SYNC_ERRS: u32 = 1;

/// Lightweight scanner for control frames on an idle channel.
#[derive(Debug)]
pub struct DmrIdleRx {
    corr: SyncCorrelator,
    window: [u8; DMR_WINDOW_BYTES],
    data_ptr: u16,
    end_ptr: Option<u16>,
}

impl DmrIdleRx {
    /// Creates an idle scanner.
    pub fn new() -> Self {
        Self {
            corr: SyncCorrelator::new(),
            window: [0u8; DMR_WINDOW_BYTES],
            data_ptr: 0,
            end_ptr: None,
        }
    }

    /// Abandons any burst in flight. Idempotent.
    pub fn reset(&mut self) {
        self.data_ptr = 0;
        self.end_ptr = None;
        self.corr.reset();
    }

    /// Consumes one demodulated bit.
    pub fn databit<L: HostLink, R: RssiSource, C: SlotTypeCodec>(
        &mut self,
        bit: bool,
        color_code: u8,
        codec: &C,
        out: &mut FrameWriter<'_, L, R>,
    ) {
        bitbuf::set_bit(&mut self.window, self.data_ptr as usize, bit);
        self.data_ptr = (self.data_ptr + 1) % DMR_SLOT_PERIOD_BITS;
        self.corr.feed(bit);

        if self
            .corr
            .matches(DMR_BS_DATA_SYNC, MASK48, IDLE_SYNC_ERRS)
            .is_some()
        {
            self.end_ptr =
                Some((self.data_ptr + DMR_FRAME_BITS - DMR_SYNC_END) % DMR_SLOT_PERIOD_BITS);
        }

        if self.end_ptr == Some(self.data_ptr) {
            self.end_ptr = None;
            let start =
                (self.data_ptr + DMR_SLOT_PERIOD_BITS - DMR_FRAME_BITS) % DMR_SLOT_PERIOD_BITS;
            let mut frame = [0u8; DMR_FRAME_BYTES];
            bitbuf::read_wrapped(
                &self.window,
                start as usize,
                DMR_FRAME_BITS as usize,
                DMR_SLOT_PERIOD_BITS as usize,
                &mut frame,
            );
            if let Some((cc, dt)) = codec.decode(slot_type_field(&frame)) {
                if cc == color_code && dt == DT_CSBK {
                    trace_sync!("dmr idle CSBK surfaced");
                    out.frame(FRAME_TAG_DMR1, STATUS_SYNC | dt, &frame);
                }
            }
        }
    }
}

impl Default for DmrIdleRx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DT_DATA_HEADER, RawSlotType};
    use super::*;
    use crate::link::NoRssi;
    use crate::link::mock::MockLink;
    use std::vec::Vec;

    fn push_bits(bits: &mut Vec<bool>, value: u64, nbits: u32) {
        for i in (0..nbits).rev() {
            bits.push((value >> i) & 1 != 0);
        }
    }

    fn burst(field: u32) -> Vec<bool> {
        let mut bits = vec![false; 98];
        push_bits(&mut bits, u64::from(field >> 10), 10);
        push_bits(&mut bits, DMR_BS_DATA_SYNC, 48);
        push_bits(&mut bits, u64::from(field & 0x3FF), 10);
        bits.extend(core::iter::repeat(false).take(98));
        bits
    }

    fn feed(rx: &mut DmrIdleRx, link: &mut MockLink, bits: &[bool]) {
        let codec = RawSlotType;
        for &bit in bits {
            let mut out: FrameWriter<'_, _, NoRssi> = FrameWriter::new(link, None);
            rx.databit(bit, 1, &codec, &mut out);
        }
    }

    #[test]
    fn test_csbk_is_forwarded() {
        let mut rx = DmrIdleRx::new();
        let mut link = MockLink::default();
        let field = (1u32 << 16) | u32::from(DT_CSBK) << 12;
        feed(&mut rx, &mut link, &burst(field));
        assert_eq!(link.frames.len(), 1);
        assert_eq!(link.frames[0].0, FRAME_TAG_DMR1);
        assert_eq!(link.frames[0].1[0], STATUS_SYNC | DT_CSBK);
    }

    #[test]
    fn test_non_csbk_types_are_dropped() {
        let mut rx = DmrIdleRx::new();
        let mut link = MockLink::default();
        let field = (1u32 << 16) | u32::from(DT_DATA_HEADER) << 12;
        feed(&mut rx, &mut link, &burst(field));
        assert!(link.frames.is_empty());
    }

    #[test]
    fn test_wrong_color_code_is_dropped() {
        let mut rx = DmrIdleRx::new();
        let mut link = MockLink::default();
        let field = (7u32 << 16) | u32::from(DT_CSBK) << 12;
        feed(&mut rx, &mut link, &burst(field));
        assert!(link.frames.is_empty());
    }

    #[test]
    fn test_scanner_keeps_scanning() {
        let mut rx = DmrIdleRx::new();
        let mut link = MockLink::default();
        let field = (1u32 << 16) | u32::from(DT_CSBK) << 12;
        feed(&mut rx, &mut link, &burst(field));
        feed(&mut rx, &mut link, &vec![false; 312]);
        feed(&mut rx, &mut link, &burst(field));
        assert_eq!(link.frames.len(), 2);
    }
}
