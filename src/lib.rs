//! # framerx
//!
//! A portable, no_std frame synchronization and extraction engine for
//! multi-protocol digital voice modems, covering the receive paths of
//! DMR (duplex and simplex), P25 phase 1 and NXDN.
//!
//! The engine implements the bit-level layer between a demodulator and a
//! host: it buffers hard-decision bits, hunts for frame sync patterns
//! with a Hamming-distance correlator, tracks lock state per protocol and
//! hands completed, status-tagged frames to a host link.
//!
//! This engine is built on:
//! - `embedded-hal` traits for digital I/O
//! - interrupt-safe shared state with `critical-section`
//! - fixed-capacity buffers with `heapless` (no allocation anywhere)
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` support and replaces `heapless::Vec`s with
//! `std::vec::Vec`s |
//! | `timer-isr` (default) | Enables the `critical_section` global-instance helpers in [`isr`] |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Operating model
//!
//! - A hardware timing event (timer ISR, sync-serial edge) deposits one
//!   demodulated bit per sample period via [`modem::Modem::sample`] or
//!   [`modem::Modem::databit`]. This path is O(1) and never blocks.
//! - The cooperative main loop calls [`modem::Modem::process`], which
//!   drains the sample ring through the state machine of the protocol
//!   selected with [`modem::Modem::set_mode`].
//! - Completed frames and lock-loss notifications come out through the
//!   [`link::HostLink`] trait the caller implements over its host
//!   transport.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use framerx::config::ModemConfig;
//! use framerx::modem::{Modem, ModemMode};
//!
//! let mut modem = Modem::new(Some(rx_pin), ModemConfig::new(), my_fec);
//! modem.set_mode(ModemMode::DmrDuplex)?;
//! loop {
//!     modem.process(&mut serial_link); // ISR calls modem.sample(tag)
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - The engine expects one bit per symbol period, MSB-first within each
//!   frame; demodulation and symbol timing recovery happen upstream.
//! - DMR slot-type FEC decoding is delegated to a caller-supplied
//!   [`dmr::SlotTypeCodec`], so the engine carries no FEC tables.
//! - In interrupt-driven setups only one engine instance should be
//!   active; see [`isr`] for the shared-instance helpers.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

#[cfg(not(feature = "std"))]
pub use heapless;

pub(crate) mod bitbuf;
pub mod config;
pub mod consts;
pub mod correlator;
pub mod dmr;
#[cfg(feature = "timer-isr")]
pub mod isr;
pub mod link;
pub mod modem;
pub mod nxdn;
pub mod p25;
pub mod ring;

/// Trace-level logging for sync acquisition and loss events, routed to
/// `defmt` or `log` when the matching feature is enabled and compiled
/// out otherwise.
macro_rules! trace_sync {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt-0-3")]
        defmt::trace!($($arg)*);
        #[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
        log::trace!($($arg)*);
        #[cfg(not(any(feature = "defmt-0-3", feature = "log")))]
        {
            let _ = ($($arg)*,);
        }
    }};
}
pub(crate) use trace_sync;
