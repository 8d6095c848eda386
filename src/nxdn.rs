//! NXDN receive-side machinery.
//!
//! NXDN is the simplest geometry here: a 20-bit frame sync word (FSW)
//! opens every fixed 384-bit frame, and frames arrive back to back for the
//! whole transmission. Once the FSW position is known the receiver only
//! re-checks it at the expected boundary — a fresh match refreshes the
//! lock-loss counter, a miss lets it run down — and never needs to hunt
//! again until the counter expires.

use crate::bitbuf;
use crate::consts::{CHAN_NXDN, FRAME_TAG_NXDN, STATUS_SYNC};
use crate::correlator::{MASK20, SyncCorrelator};
use crate::link::{FrameWriter, HostLink, RssiSource};
use crate::trace_sync;

/// NXDN frame sync word.
pub const NXDN_FSW: u64 = 0xC_DF59;

/// Length of the FSW in bits.
pub const NXDN_FSW_BITS: u16 = 20;

/// Total frame length in bits, FSW included.
pub const NXDN_FRAME_BITS: u16 = 384;

/// Total frame length in bytes.
pub const NXDN_FRAME_BYTES: usize = NXDN_FRAME_BITS as usize / 8;

/// Frames tolerated without a fresh FSW before the lock is declared lost.
pub const NXDN_MAX_SYNC_LOST: u8 = 4;

const ACQ_ERRS: u32 = 1;
const RUN_ERRS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NxdnState {
    #[default]
    None,
    Data,
}

/// The NXDN receive state machine.
#[derive(Debug)]
pub struct NxdnRx {
    corr: SyncCorrelator,
    window: [u8; NXDN_FRAME_BYTES],
    frame: [u8; NXDN_FRAME_BYTES],
    data_ptr: u16,
    state: NxdnState,
    fsw_pos: u16,
    end_ptr: Option<u16>,
    first: bool,
    lost: u8,
}

impl NxdnRx {
    /// Creates an unsynchronized receiver.
    pub fn new() -> Self {
        Self {
            corr: SyncCorrelator::new(),
            window: [0u8; NXDN_FRAME_BYTES],
            frame: [0u8; NXDN_FRAME_BYTES],
            data_ptr: 0,
            state: NxdnState::None,
            fsw_pos: 0,
            end_ptr: None,
            first: false,
            lost: 0,
        }
    }

    /// Whether the receiver currently holds a lock.
    pub fn locked(&self) -> bool {
        self.state == NxdnState::Data
    }

    /// Returns to the unsynchronized state. Idempotent; allocation free.
    pub fn reset(&mut self) {
        self.state = NxdnState::None;
        self.fsw_pos = 0;
        self.end_ptr = None;
        self.first = false;
        self.lost = 0;
        self.data_ptr = 0;
        self.corr.reset();
    }

    /// Consumes one demodulated bit.
    pub fn databit<L: HostLink, R: RssiSource>(
        &mut self,
        bit: bool,
        out: &mut FrameWriter<'_, L, R>,
    ) {
        bitbuf::set_bit(&mut self.window, self.data_ptr as usize, bit);
        self.data_ptr = (self.data_ptr + 1) % NXDN_FRAME_BITS;
        self.corr.feed(bit);

        match self.state {
            NxdnState::None => {
                if self.corr.matches(NXDN_FSW, MASK20, ACQ_ERRS).is_some() {
                    trace_sync!("nxdn FSW acquired");
                    self.state = NxdnState::Data;
                    self.first = true;
                    self.lost = NXDN_MAX_SYNC_LOST;
                    self.fsw_pos = self.data_ptr;
                    self.end_ptr = Some(
                        (self.data_ptr + NXDN_FRAME_BITS - NXDN_FSW_BITS) % NXDN_FRAME_BITS,
                    );
                }
            }
            NxdnState::Data => {
                if self.data_ptr == self.fsw_pos
                    && self.corr.matches(NXDN_FSW, MASK20, RUN_ERRS).is_some()
                {
                    self.lost = NXDN_MAX_SYNC_LOST;
                }
                if self.end_ptr == Some(self.data_ptr) {
                    self.emit(out);
                }
            }
        }
    }

    fn emit<L: HostLink, R: RssiSource>(&mut self, out: &mut FrameWriter<'_, L, R>) {
        // window length equals frame length, so the frame starts where it ends
        bitbuf::read_wrapped(
            &self.window,
            self.data_ptr as usize,
            NXDN_FRAME_BITS as usize,
            NXDN_FRAME_BITS as usize,
            &mut self.frame,
        );
        let status = if self.first { STATUS_SYNC } else { 0 };
        self.first = false;
        out.frame(FRAME_TAG_NXDN, status, &self.frame);

        self.lost = self.lost.saturating_sub(1);
        if self.lost == 0 {
            trace_sync!("nxdn lock lost");
            out.lost(CHAN_NXDN);
            self.reset();
        }
    }
}

impl Default for NxdnRx {
    fn default() -> Self {
        Self::new()
    }
}
