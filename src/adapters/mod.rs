//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to                        |
//! |------------|------------------|------------------------------------|
//! | `spi`      | SerialTransport  | ESP-IDF SPI master + DMA (host sim)|
//! | `hal_spi`  | SerialTransport  | any `embedded-hal` 1.0 `SpiBus`    |
//! | `time`     | MonotonicClock   | ESP32 system timer                 |

pub mod hal_spi;
pub mod spi;
pub mod time;
