//! DMX512 transmitter over a looping SPI DMA transfer.
//!
//! The SPI peripheral runs at the DMX bit rate with LSB-first bit order,
//! and the frame buffer carries the Break, Mark-after-Break and every
//! slot's start and stop bits, so MOSI wired to an RS-485 transceiver
//! speaks DMX512 without a UART.
//!
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; the rest runs and is tested on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod frame;
pub mod pins;

pub use app::ports::{MonotonicClock, SerialTransport};
pub use app::transmitter::{DmxTransmitter, TransferReason, TransmitterState, TransmitterStats};
pub use config::DmxConfig;
pub use error::{Error, Result};
