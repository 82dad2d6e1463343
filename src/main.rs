//! dmxspi firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Adapters (outer ring)                    │
//! │                                                          │
//! │   EspSpiTransport (SerialTransport)                      │
//! │   Esp32TimeAdapter (MonotonicClock)                      │
//! │                                                          │
//! │   ─────────────── Port Trait Boundary ───────────────    │
//! │                                                          │
//! │   ┌──────────────────────────────────────────────────┐   │
//! │   │      DmxTransmitter (pure logic)                 │   │
//! │   │      channel table · frame encoder · refresh     │   │
//! │   └──────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::info;

use dmxspi::adapters::spi::EspSpiTransport;
use dmxspi::adapters::time::Esp32TimeAdapter;
use dmxspi::{DmxConfig, DmxTransmitter};

#[cfg(feature = "bringup-pattern")]
use dmxspi::MonotonicClock;

/// Seconds between statistics lines on the console.
const STATS_INTERVAL_SECS: u64 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  dmxspi v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config ─────────────────────────────────────────────
    let config = DmxConfig::default();
    config.validate()?;

    // ── 3. Transport + transmitter ────────────────────────────
    let mut spi = EspSpiTransport::new(config.spi_host, config.tx_gpio);
    let clock = Esp32TimeAdapter::new();
    let mut dmx = DmxTransmitter::new(&config);
    dmx.initialize(&mut spi)?;

    // ── 4. Service loop ───────────────────────────────────────
    let mut next_stats = STATS_INTERVAL_SECS;
    loop {
        #[cfg(feature = "bringup-pattern")]
        bringup_pattern(&mut dmx, &clock);

        dmx.service_tick(&mut spi, &clock);

        let uptime = clock.uptime_secs();
        if uptime >= next_stats {
            let s = dmx.stats();
            info!(
                "STATS | frames={} (update={} refresh={}) | deferred={} dropped={} failed={} | state={:?}",
                s.frames_sent,
                s.update_frames,
                s.refresh_frames,
                s.deferred_ticks,
                s.dropped_writes,
                s.failed_transfers,
                dmx.state(),
            );
            next_stats = uptime + STATS_INTERVAL_SECS;
        }

        // One RTOS tick; a frame takes ~23 ms, so this keeps up easily
        // and lets the idle task feed the watchdog.
        FreeRtos::delay_ms(1);
    }
}

/// Ramp channels 1–8 (DMX numbering) through a full cycle every ~5 s.
#[cfg(feature = "bringup-pattern")]
fn bringup_pattern(dmx: &mut DmxTransmitter, clock: &impl MonotonicClock) {
    let level = ((clock.now_us() / 20_000) % 256) as u8;
    if dmx.get_channel(0) != level {
        dmx.set_channels(0, &[level; 8]);
    }
}
