//! APCO Project 25 phase 1 receive-side machinery.
//!
//! Every P25 frame opens with a 48-bit frame sync followed by a 64-bit
//! network identifier (NID): twelve NAC bits and a four-bit data unit id
//! (DUID) under BCH protection. The DUID selects the total frame length,
//! which varies sharply — a 144-bit terminator against a 1728-bit voice
//! LDU — so the receiver cannot place the extraction window until the NID
//! has been read and validated. BCH correction of the NID belongs to the
//! external FEC collaborator; the systematic bits are used as received.

use crate::bitbuf;
use crate::config::NAC_ANY;
use crate::consts::{CHAN_P25, FRAME_TAG_P25, STATUS_SYNC, STATUS_VOICE};
use crate::correlator::{MASK48, SyncCorrelator};
use crate::link::{FrameWriter, HostLink, RssiSource};
use crate::trace_sync;

/// P25 frame sync pattern.
pub const P25_SYNC: u64 = 0x5575_F5FF_77FF;

/// Length of the NID field in bits.
pub const P25_NID_BITS: u16 = 64;

/// Sample window size in bits: one voice LDU, the longest frame handled.
pub const P25_WINDOW_BITS: u16 = 1728;

/// Sample window size in bytes.
pub const P25_WINDOW_BYTES: usize = P25_WINDOW_BITS as usize / 8;

/// Frame periods tolerated without a revalidated sync before the lock is
/// declared lost.
pub const P25_MAX_SYNC_LOST: u8 = 4;

/// DUID: header data unit.
pub const DUID_HDU: u8 = 0x0;
/// DUID: terminator data unit.
pub const DUID_TDU: u8 = 0x3;
/// DUID: logical link data unit 1 (voice).
pub const DUID_LDU1: u8 = 0x5;
/// DUID: trunking signalling data unit.
pub const DUID_TSDU: u8 = 0x7;
/// DUID: logical link data unit 2 (voice).
pub const DUID_LDU2: u8 = 0xA;
/// DUID: terminator data unit with link control.
pub const DUID_TDULC: u8 = 0xF;

const ACQ_ERRS: u32 = 2;
const RUN_ERRS: u32 = 4;

/// Total frame length for a DUID, in bits (sync and NID included), or
/// `None` for a frame-type code this engine does not recognize.
pub fn duid_frame_bits(duid: u8) -> Option<u16> {
    match duid {
        DUID_HDU => Some(792),
        DUID_TDU => Some(144),
        DUID_LDU1 | DUID_LDU2 => Some(1728),
        DUID_TSDU => Some(360),
        DUID_TDULC => Some(432),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum P25State {
    /// Unsynchronized.
    #[default]
    None,
    /// Sync found, collecting the NID.
    Nid,
    /// Locked onto a voice superframe (LDU stream).
    Voice,
    /// Locked onto data or signalling frames.
    Data,
}

/// The P25 receive state machine.
///
/// O(1) per bit, allocation free. Frames are emitted whole (sync and NID
/// included) with the DUID in the status byte's low nibble.
#[derive(Debug)]
pub struct P25Rx {
    corr: SyncCorrelator,
    window: [u8; P25_WINDOW_BYTES],
    frame: [u8; P25_WINDOW_BYTES],
    data_ptr: u16,
    state: P25State,
    start_ptr: u16,
    end_ptr: Option<u16>,
    nid_count: u16,
    frame_len: u16,
    duid: u8,
    bit_run: u16,
    lost: u8,
}

impl P25Rx {
    /// Creates an unsynchronized receiver.
    pub fn new() -> Self {
        Self {
            corr: SyncCorrelator::new(),
            window: [0u8; P25_WINDOW_BYTES],
            frame: [0u8; P25_WINDOW_BYTES],
            data_ptr: 0,
            state: P25State::None,
            start_ptr: 0,
            end_ptr: None,
            nid_count: 0,
            frame_len: 0,
            duid: 0,
            bit_run: 0,
            lost: 0,
        }
    }

    /// Whether the receiver currently holds a confirmed lock.
    pub fn locked(&self) -> bool {
        matches!(self.state, P25State::Voice | P25State::Data)
    }

    /// Returns to the unsynchronized state. Idempotent; allocation free.
    pub fn reset(&mut self) {
        self.state = P25State::None;
        self.start_ptr = 0;
        self.end_ptr = None;
        self.nid_count = 0;
        self.frame_len = 0;
        self.duid = 0;
        self.bit_run = 0;
        self.lost = 0;
        self.data_ptr = 0;
        self.corr.reset();
    }

    /// Consumes one demodulated bit.
    pub fn databit<L: HostLink, R: RssiSource>(
        &mut self,
        bit: bool,
        nac: u16,
        out: &mut FrameWriter<'_, L, R>,
    ) {
        bitbuf::set_bit(&mut self.window, self.data_ptr as usize, bit);
        self.data_ptr = (self.data_ptr + 1) % P25_WINDOW_BITS;
        self.corr.feed(bit);

        match self.state {
            P25State::None => {
                if self.corr.matches(P25_SYNC, MASK48, ACQ_ERRS).is_some() {
                    self.begin_nid();
                }
            }
            P25State::Nid => {
                self.nid_count += 1;
                if self.nid_count == P25_NID_BITS {
                    self.validate_nid(nac, out);
                }
            }
            P25State::Voice | P25State::Data => {
                if let Some(end) = self.end_ptr {
                    if self.data_ptr == end {
                        self.emit(out);
                    }
                } else if self.corr.matches(P25_SYNC, MASK48, RUN_ERRS).is_some() {
                    // next frame's sync; the NID is revalidated each boundary
                    self.begin_nid();
                } else {
                    self.bit_run += 1;
                    if self.bit_run >= self.frame_len {
                        self.bit_run = 0;
                        self.lost = self.lost.saturating_sub(1);
                        if self.lost == 0 {
                            trace_sync!("p25 lock lost");
                            out.lost(CHAN_P25);
                            self.reset();
                        }
                    }
                }
            }
        }
    }

    fn begin_nid(&mut self) {
        let was = self.state;
        self.state = P25State::Nid;
        self.nid_count = 0;
        self.start_ptr = (self.data_ptr + P25_WINDOW_BITS - 48) % P25_WINDOW_BITS;
        if was == P25State::None {
            trace_sync!("p25 sync candidate");
        }
    }

    fn validate_nid<L: HostLink, R: RssiSource>(
        &mut self,
        nac: u16,
        out: &mut FrameWriter<'_, L, R>,
    ) {
        let win_len = P25_WINDOW_BITS as usize;
        let nid_start = self.start_ptr as usize + 48;
        let rx_nac = bitbuf::read_field(&self.window, nid_start, 12, win_len) as u16;
        let duid = bitbuf::read_field(&self.window, nid_start + 12, 4, win_len) as u8;

        let nac_ok = nac == NAC_ANY || rx_nac == nac;
        match (nac_ok, duid_frame_bits(duid)) {
            (true, Some(len)) => {
                self.duid = duid;
                self.frame_len = len;
                self.end_ptr = Some((self.start_ptr + len) % P25_WINDOW_BITS);
                self.bit_run = 0;
                self.lost = P25_MAX_SYNC_LOST;
                self.state = if duid == DUID_LDU1 || duid == DUID_LDU2 {
                    P25State::Voice
                } else {
                    P25State::Data
                };
            }
            _ => {
                // false lock on noise or a foreign network
                trace_sync!("p25 NID rejected, nac {:#x}", rx_nac);
                out.lost(CHAN_P25);
                self.reset();
            }
        }
    }

    fn emit<L: HostLink, R: RssiSource>(&mut self, out: &mut FrameWriter<'_, L, R>) {
        bitbuf::read_wrapped(
            &self.window,
            self.start_ptr as usize,
            self.frame_len as usize,
            P25_WINDOW_BITS as usize,
            &mut self.frame,
        );
        let mut status = STATUS_SYNC | self.duid;
        if self.state == P25State::Voice {
            status |= STATUS_VOICE;
        }
        let nbytes = usize::from(self.frame_len / 8);
        out.frame(FRAME_TAG_P25, status, &self.frame[..nbytes]);

        if self.duid == DUID_TDU || self.duid == DUID_TDULC {
            // clean end of transmission
            self.reset();
        } else {
            self.end_ptr = None;
            self.bit_run = 0;
        }
    }
}

impl Default for P25Rx {
    fn default() -> Self {
        Self::new()
    }
}
