//! GPIO / peripheral assignments for the DMX output board.
//!
//! Single source of truth — the config defaults and the SPI adapter read
//! these rather than hard-coding numbers.

// ---------------------------------------------------------------------------
// DMX line (RS-485 transceiver, DI input)
// ---------------------------------------------------------------------------

/// GPIO driving the transceiver's DI input.  Routed to the SPI MOSI signal
/// through the GPIO matrix; no other SPI pin is claimed.
pub const DMX_TX_GPIO: i32 = 17;

/// SPI host used for the DMX stream (`SPI2_HOST`, general-purpose SPI).
pub const DMX_SPI_HOST: u32 = 1;

/// DMA channel selection for the SPI bus (`SPI_DMA_CH_AUTO`).
pub const DMX_SPI_DMA_CHANNEL: u32 = 3;
