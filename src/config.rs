//! Runtime modem configuration.
//!
//! Everything here is an ordinary capability flag or identifier resolved
//! once at startup: the values that gate frame acceptance (DMR colour
//! code, P25 NAC), the per-protocol enables, the duplex channel delay and
//! the RSSI annotation switch. Nothing is baked in at compile time.

use thiserror::Error;

/// P25 network access code wildcard: accept frames from any network.
pub const NAC_ANY: u16 = 0xFFF;

/// Configuration faults reported by the validated setters.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// DMR colour codes occupy four bits.
    #[error("colour code out of range: {0}")]
    InvalidColorCode(u8),
    /// P25 network access codes occupy twelve bits.
    #[error("NAC out of range: {0:#x}")]
    InvalidNac(u16),
    /// The requested mode's protocol is disabled in this configuration.
    #[error("protocol is not enabled")]
    ProtocolDisabled,
}

/// Modem-wide configuration consumed by the RX engine.
#[derive(Debug, Clone, Copy)]
pub struct ModemConfig {
    color_code: u8,
    nac: u16,
    /// Whether DMR reception (duplex, simplex and idle scanning) is enabled.
    pub dmr_enable: bool,
    /// Whether P25 reception is enabled.
    pub p25_enable: bool,
    /// Whether NXDN reception is enabled.
    pub nxdn_enable: bool,
    /// Number of samples to discard after entering duplex DMR mode,
    /// compensating known propagation/processing skew between the slots.
    pub rx_delay: u16,
    /// Whether to append a two-byte big-endian RSSI reading to each frame.
    pub append_rssi: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            color_code: 1,
            nac: 0x293,
            dmr_enable: true,
            p25_enable: true,
            nxdn_enable: true,
            rx_delay: 0,
            append_rssi: false,
        }
    }
}

impl ModemConfig {
    /// Creates the default configuration (colour code 1, NAC 0x293, all
    /// protocols enabled, no delay, no RSSI annotation).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the DMR colour code frames must carry to be accepted.
    pub fn set_color_code(&mut self, cc: u8) -> Result<(), ConfigError> {
        if cc > 15 {
            return Err(ConfigError::InvalidColorCode(cc));
        }
        self.color_code = cc;
        Ok(())
    }

    /// The configured DMR colour code.
    pub fn color_code(&self) -> u8 {
        self.color_code
    }

    /// Sets the P25 network access code ([`NAC_ANY`] accepts every network).
    pub fn set_nac(&mut self, nac: u16) -> Result<(), ConfigError> {
        if nac > NAC_ANY {
            return Err(ConfigError::InvalidNac(nac));
        }
        self.nac = nac;
        Ok(())
    }

    /// The configured P25 network access code.
    pub fn nac(&self) -> u16 {
        self.nac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ModemConfig::new();
        assert_eq!(cfg.color_code(), 1);
        assert_eq!(cfg.nac(), 0x293);
        assert!(cfg.dmr_enable && cfg.p25_enable && cfg.nxdn_enable);
        assert!(!cfg.append_rssi);
    }

    #[test]
    fn test_color_code_range() {
        let mut cfg = ModemConfig::new();
        assert_eq!(cfg.set_color_code(15), Ok(()));
        assert_eq!(cfg.color_code(), 15);
        assert_eq!(cfg.set_color_code(16), Err(ConfigError::InvalidColorCode(16)));
        assert_eq!(cfg.color_code(), 15);
    }

    #[test]
    fn test_nac_range() {
        let mut cfg = ModemConfig::new();
        assert_eq!(cfg.set_nac(NAC_ANY), Ok(()));
        assert_eq!(cfg.set_nac(0x1000), Err(ConfigError::InvalidNac(0x1000)));
        assert_eq!(cfg.nac(), NAC_ANY);
    }
}
