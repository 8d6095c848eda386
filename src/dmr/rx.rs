//! Burst synchronization and extraction for one DMR channel.

use crate::bitbuf;
use crate::consts::{STATUS_SYNC, STATUS_VOICE};
use crate::correlator::{MASK48, SyncCorrelator};
use crate::link::{FrameWriter, HostLink, RssiSource};
use crate::trace_sync;

use super::{
    DMR_FRAME_BITS, DMR_FRAME_BYTES, DMR_MAX_SYNC_LOST, DMR_SLOT_PERIOD_BITS, DMR_SYNC_END,
    DMR_WINDOW_BYTES, DT_DATA_HEADER, DT_RATE_1_DATA, DT_RATE_12_DATA, DT_RATE_34_DATA,
    DT_VOICE_LC_HEADER, DT_VOICE_PI_HEADER, DmrParams, SlotTypeCodec, SyncKind, slot_type_field,
};

/// Acquisition state of a DMR receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DmrState {
    /// Unsynchronized, hunting for a sync field.
    #[default]
    None,
    /// Provisional sync candidate, awaiting slot-type confirmation at the
    /// end of the burst.
    Syncing,
    /// Locked onto a voice superframe.
    Voice,
    /// Locked onto a data transmission.
    Data,
}

/// One DMR receive state machine.
///
/// The same machine serves a duplex timeslot or the whole channel in
/// simplex (DMO) operation; the [`DmrParams`] table supplies the
/// direction-specific sync patterns, error tolerances and slot gating.
///
/// Feed it one bit per sample period with [`databit`](DmrRx::databit);
/// completed bursts and lock-loss notifications come out through the
/// supplied [`FrameWriter`]. Processing is O(1) per bit and allocation
/// free.
#[derive(Debug)]
pub struct DmrRx {
    params: &'static DmrParams,
    corr: SyncCorrelator,
    window: [u8; DMR_WINDOW_BYTES],
    data_ptr: u16,
    state: DmrState,
    pending: Option<SyncKind>,
    end_ptr: Option<u16>,
    expected: Option<u16>,
    lost: u8,
    seq: u8,
}

impl DmrRx {
    /// Creates an unsynchronized receiver with the given personality.
    pub fn new(params: &'static DmrParams) -> Self {
        Self {
            params,
            corr: SyncCorrelator::new(),
            window: [0u8; DMR_WINDOW_BYTES],
            data_ptr: 0,
            state: DmrState::None,
            pending: None,
            end_ptr: None,
            expected: None,
            lost: 0,
            seq: 0,
        }
    }

    /// Whether the receiver currently holds a confirmed lock.
    pub fn locked(&self) -> bool {
        matches!(self.state, DmrState::Voice | DmrState::Data)
    }

    /// Returns to the unsynchronized state. Idempotent; allocation free.
    pub fn reset(&mut self) {
        self.state = DmrState::None;
        self.pending = None;
        self.end_ptr = None;
        self.expected = None;
        self.lost = 0;
        self.seq = 0;
        self.data_ptr = 0;
        self.corr.reset();
    }

    /// Consumes one demodulated bit.
    ///
    /// `tag` is the hardware slot tag attached to the sample; it gates
    /// initial acquisition when this personality is slot-bound.
    pub fn databit<L: HostLink, R: RssiSource, C: SlotTypeCodec>(
        &mut self,
        bit: bool,
        tag: u8,
        color_code: u8,
        codec: &C,
        out: &mut FrameWriter<'_, L, R>,
    ) {
        bitbuf::set_bit(&mut self.window, self.data_ptr as usize, bit);
        self.data_ptr = (self.data_ptr + 1) % DMR_SLOT_PERIOD_BITS;
        self.corr.feed(bit);

        let threshold = match self.state {
            DmrState::None | DmrState::Syncing => self.params.acq_errs,
            DmrState::Voice | DmrState::Data => self.params.run_errs,
        };
        // While hunting, stay off the adjacent slot: a fresh candidate must
        // carry our slot tag, and a provisional one must recur within +-2
        // bits of the slot period. Once locked any position is accepted so
        // the lock can follow clock drift.
        let position_ok = match self.state {
            DmrState::None => self.params.gate_tag.map_or(true, |t| t == tag),
            DmrState::Syncing => self.near_expected(),
            DmrState::Voice | DmrState::Data => true,
        };

        if position_ok {
            let kind = if self
                .corr
                .matches(self.params.sync_data, MASK48, threshold)
                .is_some()
            {
                Some(SyncKind::Data)
            } else if self
                .corr
                .matches(self.params.sync_voice, MASK48, threshold)
                .is_some()
            {
                Some(SyncKind::Voice)
            } else {
                None
            };
            if let Some(kind) = kind {
                self.pending = Some(kind);
                self.end_ptr =
                    Some((self.data_ptr + DMR_FRAME_BITS - DMR_SYNC_END) % DMR_SLOT_PERIOD_BITS);
                self.expected = Some(self.data_ptr);
                if self.state == DmrState::None {
                    self.state = DmrState::Syncing;
                    trace_sync!("dmr sync candidate on channel {}", self.params.channel);
                }
            }
        }

        if self.end_ptr == Some(self.data_ptr) {
            self.frame_complete(color_code, codec, out);
        }
    }

    /// Whether the write cursor sits within +-2 bits of the position the
    /// next sync is expected to complete at.
    fn near_expected(&self) -> bool {
        match self.expected {
            Some(e) => {
                let d = (self.data_ptr + DMR_SLOT_PERIOD_BITS - e) % DMR_SLOT_PERIOD_BITS;
                d <= 2 || d >= DMR_SLOT_PERIOD_BITS - 2
            }
            None => true,
        }
    }

    fn frame_complete<L: HostLink, R: RssiSource, C: SlotTypeCodec>(
        &mut self,
        color_code: u8,
        codec: &C,
        out: &mut FrameWriter<'_, L, R>,
    ) {
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
        match self.pending.take() {
            Some(SyncKind::Voice) => self.voice_sync(&frame, out),
            Some(SyncKind::Data) => self.data_sync(&frame, color_code, codec, out),
            None => self.missed_sync(&frame, out),
        }
    }

    fn voice_sync<L: HostLink, R: RssiSource>(
        &mut self,
        frame: &[u8; DMR_FRAME_BYTES],
        out: &mut FrameWriter<'_, L, R>,
    ) {
        self.state = DmrState::Voice;
        self.seq = 0;
        self.lost = DMR_MAX_SYNC_LOST;
        out.frame(self.params.frame_tag, STATUS_SYNC | STATUS_VOICE, frame);
    }

    fn data_sync<L: HostLink, R: RssiSource, C: SlotTypeCodec>(
        &mut self,
        frame: &[u8; DMR_FRAME_BYTES],
        color_code: u8,
        codec: &C,
        out: &mut FrameWriter<'_, L, R>,
    ) {
        let was_locked = self.locked();
        let Some((cc, dt)) = codec.decode(slot_type_field(frame)) else {
            self.false_lock(was_locked, out);
            return;
        };
        if cc != color_code {
            self.false_lock(was_locked, out);
            return;
        }
        match dt {
            DT_DATA_HEADER => {
                self.state = DmrState::Data;
                self.lost = DMR_MAX_SYNC_LOST;
                out.frame(self.params.frame_tag, STATUS_SYNC | dt, frame);
            }
            DT_RATE_12_DATA | DT_RATE_34_DATA | DT_RATE_1_DATA => {
                // a continuation confirms nothing on its own; arriving
                // anywhere but an established data call it is a false lock
                if self.state == DmrState::Data {
                    self.lost = DMR_MAX_SYNC_LOST;
                    out.frame(self.params.frame_tag, STATUS_SYNC | dt, frame);
                } else {
                    self.false_lock(was_locked, out);
                }
            }
            DT_VOICE_LC_HEADER | DT_VOICE_PI_HEADER => {
                self.state = DmrState::Voice;
                self.seq = 0;
                self.lost = DMR_MAX_SYNC_LOST;
                out.frame(self.params.frame_tag, STATUS_SYNC | dt, frame);
            }
            _ => {
                // terminator and control frames (CSBK, MBC, idle) are
                // surfaced, then the channel is released
                out.frame(self.params.frame_tag, STATUS_SYNC | dt, frame);
                self.reset();
            }
        }
    }

    fn missed_sync<L: HostLink, R: RssiSource>(
        &mut self,
        frame: &[u8; DMR_FRAME_BYTES],
        out: &mut FrameWriter<'_, L, R>,
    ) {
        match self.state {
            DmrState::Voice => {
                // superframe continuation: frames B-F carry no sync
                self.seq = if self.seq >= 5 { 1 } else { self.seq + 1 };
                out.frame(self.params.frame_tag, STATUS_VOICE | self.seq, frame);
                self.tick_lost(out);
            }
            DmrState::Data => self.tick_lost(out),
            // the candidate never recurred; back to hunting
            DmrState::Syncing | DmrState::None => self.reset(),
        }
    }

    fn tick_lost<L: HostLink, R: RssiSource>(&mut self, out: &mut FrameWriter<'_, L, R>) {
        self.lost = self.lost.saturating_sub(1);
        if self.lost == 0 {
            trace_sync!("dmr lock lost on channel {}", self.params.channel);
            out.lost(self.params.channel);
            self.reset();
        }
    }

    fn false_lock<L: HostLink, R: RssiSource>(
        &mut self,
        was_locked: bool,
        out: &mut FrameWriter<'_, L, R>,
    ) {
        if was_locked {
            trace_sync!("dmr false lock on channel {}", self.params.channel);
            out.lost(self.params.channel);
        }
        self.reset();
    }
}
