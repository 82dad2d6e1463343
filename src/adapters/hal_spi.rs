//! Blocking transport over any `embedded-hal` 1.0 [`SpiBus`].
//!
//! For boards whose HAL exposes a plain SPI bus instead of a queued DMA
//! driver.  `transfer_async` shifts the whole frame out before returning,
//! so [`is_busy`](SerialTransport::is_busy) is always `false` and the
//! service tick blocks for one frame time (~22.7 ms) per transfer.
//!
//! Clock rate and polarity are fixed when the HAL bus is built; the
//! adapter only checks them.  A bus that can only shift MSB-first gets
//! each byte bit-reversed on the way out.

use embedded_hal::spi::{Error as _, SpiBus};
use heapless::Vec;
use log::{info, warn};

use crate::app::ports::{BitOrder, SerialTransport, SpiSettings, TransportError};
use crate::frame::FRAME_LEN;

pub struct BlockingSpiTransport<S> {
    bus: S,
    clock_hz: u32,
    native_order: BitOrder,
    reverse_bits: bool,
    scratch: Vec<u8, FRAME_LEN>,
}

impl<S: SpiBus<u8>> BlockingSpiTransport<S> {
    /// Wrap `bus`, which the HAL already clocks at `clock_hz` and which
    /// shifts bits in `native_order`.
    pub fn new(bus: S, clock_hz: u32, native_order: BitOrder) -> Self {
        Self {
            bus,
            clock_hz,
            native_order,
            reverse_bits: false,
            scratch: Vec::new(),
        }
    }

    /// Give the HAL bus back.
    pub fn release(self) -> S {
        self.bus
    }
}

impl<S: SpiBus<u8>> SerialTransport for BlockingSpiTransport<S> {
    fn configure(&mut self, settings: &SpiSettings) -> Result<(), TransportError> {
        if settings.clock_hz != self.clock_hz {
            return Err(TransportError::Unsupported("bus clock differs from requested rate"));
        }
        self.reverse_bits = settings.bit_order != self.native_order;
        info!(
            "hal_spi: {} Hz, {:?}{}",
            self.clock_hz,
            settings.bit_order,
            if self.reverse_bits { " (bit-reversed)" } else { "" }
        );
        Ok(())
    }

    fn route_pin(&mut self) -> Result<(), TransportError> {
        // The HAL bus owns its pins already.
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        false
    }

    fn transfer_async(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let out = if self.reverse_bits {
            self.scratch.clear();
            self.scratch
                .extend_from_slice(frame)
                .map_err(|()| TransportError::Unsupported("frame larger than scratch buffer"))?;
            for b in self.scratch.iter_mut() {
                *b = b.reverse_bits();
            }
            self.scratch.as_slice()
        } else {
            frame
        };

        self.bus
            .write(out)
            .and_then(|()| self.bus.flush())
            .map_err(|e| {
                warn!("hal_spi: write failed ({:?})", e.kind());
                TransportError::Bus
            })
    }
}
