//! Hexagonal core: the DMX transmitter and the ports it drives.
//!
//! - [`ports`]       — `SerialTransport` and `MonotonicClock` boundaries
//! - [`transmitter`] — channel table, frame encoding and refresh policy

pub mod ports;
pub mod transmitter;
