//! Top-level receive engine.
//!
//! [`Modem`] ties the pieces together: the hardware-event context deposits
//! one decided bit per timing event through [`sample`](Modem::sample) or
//! [`databit`](Modem::databit) (never blocking, O(1)), and the cooperative
//! main loop drains the ring through [`process`](Modem::process), routing
//! each bit into the RX state machine selected by the active protocol
//! mode. Switching modes resets every state machine; no partial frame
//! state survives a switch.

use core::convert::Infallible;

use embedded_hal::digital::InputPin;

use crate::config::{ConfigError, ModemConfig};
use crate::consts::TAG_NONE;
use crate::dmr::{
    DMR_DMO, DMR_DUPLEX_SLOT1, DMR_DUPLEX_SLOT2, DmrIdleRx, DmrRx, SlotTypeCodec,
};
use crate::link::{FrameWriter, HostLink, NoRssi, RssiSource};
use crate::nxdn::NxdnRx;
use crate::p25::P25Rx;
use crate::ring::SampleRB;

/// Active protocol mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModemMode {
    /// No call in progress; the DMR idle scanner watches for control frames.
    #[default]
    Idle,
    /// DMR duplex: both timeslots received, hardware slot tags honoured.
    DmrDuplex,
    /// DMR simplex (DMO): a single channel, mobile-station sync patterns.
    DmrDmo,
    /// P25 phase 1.
    P25,
    /// NXDN.
    Nxdn,
}

/// Multi-protocol receive engine.
///
/// `RX` is the demodulator's hard-decision data line; pass `None` to drive
/// the engine purely through [`databit`](Modem::databit). `C` is the
/// external slot-type FEC collaborator used by the DMR receivers.
pub struct Modem<RX: InputPin, C: SlotTypeCodec> {
    /// The active protocol mode. Change it through
    /// [`set_mode`](Modem::set_mode), which performs the required resets.
    pub mode: ModemMode,
    /// Demodulator data pin, when the engine samples the line itself.
    pub rx: Option<RX>,
    cfg: ModemConfig,
    codec: C,
    ring: SampleRB,
    slot1: DmrRx,
    slot2: DmrRx,
    dmo: DmrRx,
    idle: DmrIdleRx,
    p25: P25Rx,
    nxdn: NxdnRx,
    delay: u16,
    cur_slot: u8,
}

impl<RX: InputPin, C: SlotTypeCodec> Modem<RX, C> {
    /// Creates an engine in [`ModemMode::Idle`].
    pub fn new(rx: Option<RX>, cfg: ModemConfig, codec: C) -> Self {
        Self {
            mode: ModemMode::Idle,
            rx,
            cfg,
            codec,
            ring: SampleRB::new(),
            slot1: DmrRx::new(&DMR_DUPLEX_SLOT1),
            slot2: DmrRx::new(&DMR_DUPLEX_SLOT2),
            dmo: DmrRx::new(&DMR_DMO),
            idle: DmrIdleRx::new(),
            p25: P25Rx::new(),
            nxdn: NxdnRx::new(),
            delay: 0,
            cur_slot: TAG_NONE,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ModemConfig {
        &self.cfg
    }

    /// Replaces the configuration. Takes effect from the next bit; call
    /// [`set_mode`](Modem::set_mode) afterwards if a clean restart of the
    /// current mode is wanted.
    pub fn set_config(&mut self, cfg: ModemConfig) {
        self.cfg = cfg;
    }

    /// Hardware-event entry point: samples the data pin and buffers the
    /// bit. Returns `false` when no pin is attached or the ring was full
    /// (the sample is dropped and the sticky overflow flag set).
    pub fn sample(&mut self, tag: u8) -> bool {
        match self.rx.as_mut() {
            Some(rx) => {
                let bit = rx.is_high().unwrap_or(false);
                self.ring.put(bit, tag)
            }
            None => false,
        }
    }

    /// Buffers one externally demodulated bit. Same overflow semantics as
    /// [`sample`](Modem::sample).
    pub fn databit(&mut self, bit: bool, tag: u8) -> bool {
        self.ring.put(bit, tag)
    }

    /// Takes the oldest buffered sample, or
    /// [`nb::Error::WouldBlock`] when the ring is empty.
    pub fn read_sample(&mut self) -> nb::Result<(bool, u8), Infallible> {
        self.ring.get().ok_or(nb::Error::WouldBlock)
    }

    /// Switches the active protocol mode.
    ///
    /// Every receiver is reset and buffered samples are discarded, so no
    /// partial frame state crosses the switch. Fails without side effects
    /// when the requested mode's protocol is disabled.
    pub fn set_mode(&mut self, mode: ModemMode) -> Result<(), ConfigError> {
        let enabled = match mode {
            ModemMode::Idle => true,
            ModemMode::DmrDuplex | ModemMode::DmrDmo => self.cfg.dmr_enable,
            ModemMode::P25 => self.cfg.p25_enable,
            ModemMode::Nxdn => self.cfg.nxdn_enable,
        };
        if !enabled {
            return Err(ConfigError::ProtocolDisabled);
        }
        self.slot1.reset();
        self.slot2.reset();
        self.dmo.reset();
        self.idle.reset();
        self.p25.reset();
        self.nxdn.reset();
        self.ring.clear();
        self.cur_slot = TAG_NONE;
        self.delay = if mode == ModemMode::DmrDuplex {
            self.cfg.rx_delay
        } else {
            0
        };
        self.mode = mode;
        Ok(())
    }

    /// Drains the ring and runs the active receiver, without RSSI
    /// annotation.
    pub fn process<L: HostLink>(&mut self, link: &mut L) {
        self.process_inner::<L, NoRssi>(link, None);
    }

    /// Drains the ring and runs the active receiver, annotating frames
    /// with readings from `rssi` when the configuration asks for it.
    pub fn process_rssi<L: HostLink, R: RssiSource>(&mut self, link: &mut L, rssi: &mut R) {
        if self.cfg.append_rssi {
            self.process_inner(link, Some(rssi));
        } else {
            self.process_inner::<L, R>(link, None);
        }
    }

    fn process_inner<L: HostLink, R: RssiSource>(
        &mut self,
        link: &mut L,
        rssi: Option<&mut R>,
    ) {
        let mut out = FrameWriter::new(link, rssi);
        while let Ok((bit, tag)) = self.read_sample() {
            // hardware asserts the slot tag at slot boundaries only;
            // bits in between inherit the last mark
            if tag != TAG_NONE {
                self.cur_slot = tag;
            }
            if self.delay > 0 {
                self.delay -= 1;
                continue;
            }
            match self.mode {
                ModemMode::Idle => {
                    if self.cfg.dmr_enable {
                        self.idle
                            .databit(bit, self.cfg.color_code(), &self.codec, &mut out);
                    }
                }
                ModemMode::DmrDuplex => {
                    self.slot1.databit(
                        bit,
                        self.cur_slot,
                        self.cfg.color_code(),
                        &self.codec,
                        &mut out,
                    );
                    self.slot2.databit(
                        bit,
                        self.cur_slot,
                        self.cfg.color_code(),
                        &self.codec,
                        &mut out,
                    );
                }
                ModemMode::DmrDmo => {
                    self.dmo.databit(
                        bit,
                        self.cur_slot,
                        self.cfg.color_code(),
                        &self.codec,
                        &mut out,
                    );
                }
                ModemMode::P25 => self.p25.databit(bit, self.cfg.nac(), &mut out),
                ModemMode::Nxdn => self.nxdn.databit(bit, &mut out),
            }
        }
    }

    /// Reads and clears the ring's sticky overflow flag, for the status
    /// reporting path.
    pub fn overflow(&mut self) -> bool {
        self.ring.overflow_and_clear()
    }
}

impl<RX: InputPin, C: SlotTypeCodec> core::fmt::Debug for Modem<RX, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Modem")
            .field("mode", &self.mode)
            .field("occupied", &self.ring.occupied())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{
        FRAME_TAG_NXDN, RING_BITS, STATUS_RSSI, STATUS_SYNC, STATUS_VOICE, TAG_SLOT1,
    };
    use crate::dmr::{DMR_MS_VOICE_SYNC, RawSlotType};
    use crate::link::mock::MockLink;
    use crate::nxdn::NXDN_FSW;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    type TestModem = Modem<PinMock, RawSlotType>;

    fn modem() -> TestModem {
        Modem::new(None, ModemConfig::new(), RawSlotType)
    }

    fn feed_value(m: &mut TestModem, value: u64, nbits: u32) {
        for i in (0..nbits).rev() {
            assert!(m.databit((value >> i) & 1 != 0, TAG_NONE));
        }
    }

    fn feed_zeros(m: &mut TestModem, link: &mut MockLink, count: usize) {
        // in chunks so the ring never overflows
        let mut left = count;
        while left > 0 {
            let n = left.min(RING_BITS / 2);
            for _ in 0..n {
                assert!(m.databit(false, TAG_NONE));
            }
            m.process(link);
            left -= n;
        }
    }

    #[test]
    fn test_pin_sampling() {
        let pin = PinMock::new(&[
            PinTransaction::get(PinState::High),
            PinTransaction::get(PinState::Low),
        ]);
        let mut m: TestModem = Modem::new(Some(pin), ModemConfig::new(), RawSlotType);
        assert!(m.sample(TAG_SLOT1));
        assert!(m.sample(TAG_NONE));
        assert_eq!(m.read_sample(), Ok((true, TAG_SLOT1)));
        assert_eq!(m.read_sample(), Ok((false, TAG_NONE)));
        assert_eq!(m.read_sample(), Err(nb::Error::WouldBlock));
        let mut pin = m.rx.take().unwrap();
        pin.done();
    }

    #[test]
    fn test_nxdn_end_to_end() {
        let mut m = modem();
        let mut link = MockLink::default();
        m.set_mode(ModemMode::Nxdn).unwrap();
        feed_value(&mut m, NXDN_FSW, 20);
        m.process(&mut link);
        feed_zeros(&mut m, &mut link, 364);
        assert_eq!(link.frames.len(), 1);
        assert_eq!(link.frames[0].0, FRAME_TAG_NXDN);
        assert_eq!(link.frames[0].1[0], STATUS_SYNC);
    }

    #[test]
    fn test_dmo_voice_end_to_end() {
        let mut m = modem();
        let mut link = MockLink::default();
        m.set_mode(ModemMode::DmrDmo).unwrap();
        feed_zeros(&mut m, &mut link, 108);
        feed_value(&mut m, DMR_MS_VOICE_SYNC, 48);
        m.process(&mut link);
        feed_zeros(&mut m, &mut link, 108);
        assert_eq!(link.frames.len(), 1);
        assert_eq!(link.frames[0].1[0], STATUS_SYNC | STATUS_VOICE);
    }

    #[test]
    fn test_mode_switch_discards_partial_frames() {
        let mut m = modem();
        let mut link = MockLink::default();
        m.set_mode(ModemMode::Nxdn).unwrap();
        feed_value(&mut m, NXDN_FSW, 20);
        m.process(&mut link);
        feed_zeros(&mut m, &mut link, 100);
        m.set_mode(ModemMode::P25).unwrap();
        m.set_mode(ModemMode::Nxdn).unwrap();
        // only the tail of the interrupted frame arrives; nothing may emerge
        feed_zeros(&mut m, &mut link, 264);
        assert!(link.frames.is_empty());
        assert!(link.lost.is_empty());
    }

    #[test]
    fn test_disabled_protocol_is_rejected() {
        let mut cfg = ModemConfig::new();
        cfg.p25_enable = false;
        let mut m: TestModem = Modem::new(None, cfg, RawSlotType);
        assert_eq!(m.set_mode(ModemMode::P25), Err(ConfigError::ProtocolDisabled));
        assert_eq!(m.mode, ModemMode::Idle);
        assert_eq!(m.set_mode(ModemMode::DmrDuplex), Ok(()));
    }

    #[test]
    fn test_rx_delay_skips_leading_samples() {
        let mut cfg = ModemConfig::new();
        cfg.rx_delay = 10;
        let mut m: TestModem = Modem::new(None, cfg, RawSlotType);
        let mut link = MockLink::default();
        m.set_mode(ModemMode::DmrDuplex).unwrap();
        // ten junk bits, then a clean slot-1 burst; the delay must swallow
        // exactly the junk so the burst still aligns
        for _ in 0..10 {
            assert!(m.databit(true, TAG_SLOT1));
        }
        let field = (1u32 << 16) | u32::from(crate::dmr::DT_CSBK) << 12;
        for _ in 0..98 {
            assert!(m.databit(false, TAG_SLOT1));
        }
        for i in (0..10).rev() {
            assert!(m.databit((field >> (10 + i)) & 1 != 0, TAG_SLOT1));
        }
        for i in (0..48).rev() {
            assert!(m.databit((crate::dmr::DMR_BS_DATA_SYNC >> i) & 1 != 0, TAG_SLOT1));
        }
        for i in (0..10).rev() {
            assert!(m.databit((field >> i) & 1 != 0, TAG_SLOT1));
        }
        m.process(&mut link);
        feed_zeros(&mut m, &mut link, 98);
        assert_eq!(link.frames.len(), 1);
        assert_eq!(link.frames[0].1[0] & STATUS_SYNC, STATUS_SYNC);
    }

    #[test]
    fn test_overflow_is_surfaced_once() {
        let mut m = modem();
        for _ in 0..RING_BITS {
            assert!(m.databit(true, TAG_NONE));
        }
        assert!(!m.databit(true, TAG_NONE));
        assert!(m.overflow());
        assert!(!m.overflow());
    }

    #[test]
    fn test_rssi_annotation_end_to_end() {
        struct FixedRssi(u16);
        impl RssiSource for FixedRssi {
            fn read_rssi(&mut self) -> u16 {
                self.0
            }
        }

        let mut cfg = ModemConfig::new();
        cfg.append_rssi = true;
        let mut m: TestModem = Modem::new(None, cfg, RawSlotType);
        let mut link = MockLink::default();
        let mut rssi = FixedRssi(0x0BAD);
        m.set_mode(ModemMode::Nxdn).unwrap();
        feed_value(&mut m, NXDN_FSW, 20);
        for _ in 0..364 {
            assert!(m.databit(false, TAG_NONE));
        }
        m.process_rssi(&mut link, &mut rssi);
        assert_eq!(link.frames.len(), 1);
        let payload = &link.frames[0].1;
        assert_eq!(payload[0] & STATUS_RSSI, STATUS_RSSI);
        assert_eq!(&payload[payload.len() - 2..], &[0x0B, 0xAD]);
        assert!(link.lost.is_empty());
    }
}
