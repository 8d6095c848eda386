//! Frame dispatch towards the host link.
//!
//! The engine never talks to the host directly; completed frames and
//! lost-lock notifications go through the [`HostLink`] trait, and the
//! optional signal-level annotation is read from an [`RssiSource`]
//! collaborator. [`FrameWriter`] is the dispatch adapter the RX state
//! machines write into: it prepends the status byte, appends the RSSI
//! bytes when enabled, and forwards the result.

use crate::consts::STATUS_RSSI;

#[cfg(not(feature = "std"))]
use crate::consts::HOST_BUF_LEN;
#[cfg(not(feature = "std"))]
use heapless::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
type HostBuf = Vec<u8, HOST_BUF_LEN>;
#[cfg(feature = "std")]
type HostBuf = Vec<u8>;

/// Upward interface to the host communication layer.
///
/// Implementations must not block; they are called from the main loop
/// within the per-bit time budget.
pub trait HostLink {
    /// Delivers one completed or continuing frame. `payload[0]` is the
    /// status byte (see [`crate::consts`]), the rest is the raw frame.
    fn write_frame(&mut self, tag: u8, payload: &[u8]);

    /// Reports that the lock-loss counter for `channel` reached zero.
    /// Called exactly once per loss.
    fn write_lost(&mut self, channel: u8);
}

/// External signal-level collaborator.
pub trait RssiSource {
    /// Returns the current raw RSSI reading.
    fn read_rssi(&mut self) -> u16;
}

/// Placeholder source for builds without RSSI plumbing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRssi;

impl RssiSource for NoRssi {
    fn read_rssi(&mut self) -> u16 {
        0
    }
}

/// Per-call dispatch adapter handed to the RX state machines.
pub struct FrameWriter<'a, L: HostLink, R: RssiSource> {
    link: &'a mut L,
    rssi: Option<&'a mut R>,
}

impl<'a, L: HostLink, R: RssiSource> FrameWriter<'a, L, R> {
    /// Wraps a host link, optionally annotating frames with RSSI.
    pub fn new(link: &'a mut L, rssi: Option<&'a mut R>) -> Self {
        Self { link, rssi }
    }

    /// Emits one frame: status byte, payload, then the two big-endian RSSI
    /// bytes when a source is attached.
    pub fn frame(&mut self, tag: u8, status: u8, payload: &[u8]) {
        let mut buf = HostBuf::new();
        let mut status = status;
        if self.rssi.is_some() {
            status |= STATUS_RSSI;
        }
        let _ = buf.push(status);
        let _ = buf.extend_from_slice(payload);
        if let Some(rssi) = self.rssi.as_mut() {
            let _ = buf.extend_from_slice(&rssi.read_rssi().to_be_bytes());
        }
        self.link.write_frame(tag, &buf);
    }

    /// Forwards a lost-lock notification.
    pub fn lost(&mut self, channel: u8) {
        self.link.write_lost(channel);
    }
}

impl<L: HostLink, R: RssiSource> core::fmt::Debug for FrameWriter<'_, L, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameWriter")
            .field("rssi", &self.rssi.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::HostLink;
    use std::vec::Vec;

    /// Recording host link used across the engine's tests.
    #[derive(Debug, Default)]
    pub(crate) struct MockLink {
        pub frames: Vec<(u8, Vec<u8>)>,
        pub lost: Vec<u8>,
    }

    impl HostLink for MockLink {
        fn write_frame(&mut self, tag: u8, payload: &[u8]) {
            self.frames.push((tag, payload.to_vec()));
        }

        fn write_lost(&mut self, channel: u8) {
            self.lost.push(channel);
        }
    }
}
