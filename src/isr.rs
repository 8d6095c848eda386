//! Interrupt-context plumbing for a global [`Modem`] instance.
//!
//! The sample clock usually lives in a hardware timer ISR while frame
//! processing runs in the main loop, so the engine ends up shared between
//! the two contexts. These helpers wrap that sharing in a
//! `critical_section::Mutex`: declare the static with
//! [`global_modem_init`], fill it from `main` with [`global_modem_setup`],
//! call [`global_modem_sample`] from the ISR and [`global_modem_process`]
//! from the main loop.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::InputPin;

use crate::config::ModemConfig;
use crate::dmr::SlotTypeCodec;
use crate::link::HostLink;
use crate::modem::Modem;

/// Used to initialize the global static [`Modem`] for use with
/// `critical_section`.
///
/// # Example
/// ```rust,ignore
/// use framerx::isr::global_modem_init;
/// use framerx::modem::Modem;
/// use core::cell::RefCell;
/// use critical_section::Mutex;
///
/// static MODEM: Mutex<RefCell<Option<Modem<PD2, MyCodec>>>> =
///     global_modem_init::<PD2, MyCodec>();
/// ```
pub const fn global_modem_init<RX: InputPin, C: SlotTypeCodec>()
-> Mutex<RefCell<Option<Modem<RX, C>>>> {
    Mutex::new(RefCell::new(None))
}

/// Constructs the engine and stores it in the global static. Call once
/// from `main` before enabling the sample interrupt.
pub fn global_modem_setup<RX: InputPin, C: SlotTypeCodec>(
    global_modem: &'static Mutex<RefCell<Option<Modem<RX, C>>>>,
    rx: Option<RX>,
    cfg: ModemConfig,
    codec: C,
) {
    critical_section::with(|cs| {
        let _ = global_modem.borrow(cs).replace(Some(Modem::new(rx, cfg, codec)));
    });
}

/// Samples the data pin from the timer ISR. Returns `false` when the
/// engine is not set up yet or the sample ring was full.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     let _ = framerx::isr::global_modem_sample(&MODEM, framerx::consts::TAG_NONE);
/// }
/// ```
pub fn global_modem_sample<RX: InputPin, C: SlotTypeCodec>(
    global_modem: &'static Mutex<RefCell<Option<Modem<RX, C>>>>,
    tag: u8,
) -> bool {
    critical_section::with(|cs| {
        match global_modem.borrow(cs).borrow_mut().as_mut() {
            Some(modem) => modem.sample(tag),
            None => false,
        }
    })
}

/// Drains buffered samples through the active receiver from the main
/// loop.
///
/// The whole drain runs inside one critical section; call it often
/// enough that the ring stays shallow, or samples arriving while it runs
/// will be delayed to the next pass.
pub fn global_modem_process<RX: InputPin, C: SlotTypeCodec, L: HostLink>(
    global_modem: &'static Mutex<RefCell<Option<Modem<RX, C>>>>,
    link: &mut L,
) {
    critical_section::with(|cs| {
        if let Some(modem) = global_modem.borrow(cs).borrow_mut().as_mut() {
            modem.process(link);
        }
    });
}
