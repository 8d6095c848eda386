//! Sliding sync-pattern correlator.
//!
//! Frame alignment is found statistically: the most recent bits are kept in
//! a shift register and compared against each protocol's known sync pattern
//! by Hamming distance. A window is accepted when the number of differing
//! bits is at or below a threshold chosen by the caller — strict while
//! hunting for an initial lock (to keep the false-positive rate on noise
//! down), looser once a lock has been confirmed by a higher-layer check,
//! so ordinary channel errors do not drop an established lock.
//!
//! The register is 64 bits wide; patterns are masked to their defined-bit
//! count, so anything from NXDN's 20-bit FSW up to the 48-bit DMR and P25
//! sync fields correlates with the same code. Older bits fall out of the
//! register naturally as new ones shift in.

/// Mask selecting a 48-bit sync field in the shift register.
pub const MASK48: u64 = 0x0000_FFFF_FFFF_FFFF;

/// Mask selecting a 20-bit sync field in the shift register.
pub const MASK20: u64 = 0x000F_FFFF;

/// Rolling shift register over the most recent input bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncCorrelator {
    shift: u64,
}

impl SyncCorrelator {
    /// Creates an empty correlator.
    pub const fn new() -> Self {
        Self { shift: 0 }
    }

    /// Shifts one new bit in (first-received bit ends up most significant
    /// within the masked field).
    #[inline]
    pub fn feed(&mut self, bit: bool) {
        self.shift = (self.shift << 1) | u64::from(bit);
    }

    /// Hamming distance between the masked register and `pattern`.
    #[inline]
    pub fn errors(&self, pattern: u64, mask: u64) -> u32 {
        ((self.shift & mask) ^ pattern).count_ones()
    }

    /// Returns the error count when the register matches `pattern` to
    /// within `threshold` bit errors.
    #[inline]
    pub fn matches(&self, pattern: u64, mask: u64, threshold: u32) -> Option<u32> {
        let errs = self.errors(pattern, mask);
        (errs <= threshold).then_some(errs)
    }

    /// Forgets all buffered bits.
    pub fn reset(&mut self) {
        self.shift = 0;
    }
}
