//! Transmitter configuration.
//!
//! Compile-time defaults suit an ESP32-S3 board driving an RS-485
//! transceiver from one GPIO.  The struct is serde-enabled so a host tool
//! can ship an alternative set as JSON.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::FRAME_DURATION_US;
use crate::pins;

/// Longest break-to-break gap DMX512 receivers must tolerate, in ms.
pub const MAX_REFRESH_INTERVAL_MS: u32 = 1250;

/// Transmitter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmxConfig {
    /// Resend an unchanged frame after this many milliseconds.  Some
    /// fixtures blank their output when the line goes quiet.
    pub refresh_interval_ms: u32,
    /// GPIO routed to the SPI MOSI signal.
    pub tx_gpio: i32,
    /// SPI host peripheral index.
    pub spi_host: u32,
}

impl Default for DmxConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 400,
            tx_gpio: pins::DMX_TX_GPIO,
            spi_host: pins::DMX_SPI_HOST,
        }
    }
}

impl DmxConfig {
    /// Refresh interval in microseconds.
    pub fn refresh_interval_us(&self) -> u64 {
        u64::from(self.refresh_interval_ms) * 1000
    }

    /// Reject values that would flood or starve the line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_us() < FRAME_DURATION_US {
            return Err(ConfigError::RefreshTooShort);
        }
        if self.refresh_interval_ms > MAX_REFRESH_INTERVAL_MS {
            return Err(ConfigError::RefreshTooLong);
        }
        if self.tx_gpio < 0 {
            return Err(ConfigError::InvalidPin);
        }
        Ok(())
    }
}

/// Range-validation failures for [`DmxConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Refresh interval shorter than one frame on the wire.
    RefreshTooShort,
    /// Refresh interval longer than the receiver timeout.
    RefreshTooLong,
    /// TX GPIO number is negative.
    InvalidPin,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshTooShort => write!(
                f,
                "refresh interval below frame duration ({} us)",
                FRAME_DURATION_US
            ),
            Self::RefreshTooLong => write!(
                f,
                "refresh interval above {} ms receiver timeout",
                MAX_REFRESH_INTERVAL_MS
            ),
            Self::InvalidPin => write!(f, "invalid TX GPIO"),
        }
    }
}

impl std::error::Error for ConfigError {}
