//! Port traits — the boundary between the DMX core and the platform.
//!
//! ```text
//!   SpiTransport adapter ──▶ SerialTransport ──▶ DmxTransmitter
//!   Time adapter         ──▶ MonotonicClock  ──▶
//! ```
//!
//! The [`DmxTransmitter`](super::transmitter::DmxTransmitter) borrows these
//! at every call site, so the core never owns a peripheral and runs
//! unchanged against the mocks in `tests/`.

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Serial transport (driven adapter: domain → SPI peripheral)
// ───────────────────────────────────────────────────────────────

/// Order in which the bits of each byte are shifted out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// SPI clock polarity/phase.  DMX only uses MOSI, so this only matters
/// for where the line idles between transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiMode {
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

/// Settings applied once by [`SerialTransport::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiSettings {
    pub clock_hz: u32,
    pub bit_order: BitOrder,
    pub mode: SpiMode,
}

/// A clocked serial peripheral that can shift a byte buffer out in the
/// background (typically via DMA).
///
/// Contract for implementations: [`transfer_async`](Self::transfer_async)
/// returns as soon as the transfer is started, and the transfer stays
/// observable through [`is_busy`](Self::is_busy) until the last bit has
/// left the pin.  An implementation that reads `frame` after returning
/// must copy it into its own DMA-capable memory first.
pub trait SerialTransport {
    /// One-time peripheral setup.
    fn configure(&mut self, settings: &SpiSettings) -> Result<(), TransportError>;

    /// Route the TX pin to the peripheral.  Called after
    /// [`configure`](Self::configure), which may reset pin muxing.
    fn route_pin(&mut self) -> Result<(), TransportError>;

    /// Whether a previously started transfer is still shifting out.
    fn is_busy(&mut self) -> bool;

    /// Start shifting `frame` out and return immediately.
    fn transfer_async(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Give up the CPU while waiting for the peripheral.
    fn yield_now(&mut self) {
        std::thread::yield_now();
    }
}

impl<T: SerialTransport + ?Sized> SerialTransport for &mut T {
    fn configure(&mut self, settings: &SpiSettings) -> Result<(), TransportError> {
        (**self).configure(settings)
    }

    fn route_pin(&mut self) -> Result<(), TransportError> {
        (**self).route_pin()
    }

    fn is_busy(&mut self) -> bool {
        (**self).is_busy()
    }

    fn transfer_async(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).transfer_async(frame)
    }

    fn yield_now(&mut self) {
        (**self).yield_now();
    }
}

// ───────────────────────────────────────────────────────────────
// Clock (driven adapter: platform timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond clock.
pub trait MonotonicClock {
    /// Microseconds since an arbitrary fixed origin (usually boot).
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SerialTransport`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The peripheral rejected the requested settings.
    Unsupported(&'static str),
    /// Bus or device setup failed; carries the platform return code.
    InitFailed(i32),
    /// Pin could not be routed to the peripheral.
    PinRouting(i32),
    /// A transfer could not be queued.
    TransferFailed(i32),
    /// The underlying bus reported an I/O error.
    Bus,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "unsupported setting: {}", what),
            Self::InitFailed(rc) => write!(f, "SPI init failed (rc={})", rc),
            Self::PinRouting(rc) => write!(f, "pin routing failed (rc={})", rc),
            Self::TransferFailed(rc) => write!(f, "transfer start failed (rc={})", rc),
            Self::Bus => write!(f, "bus error"),
        }
    }
}

impl std::error::Error for TransportError {}
