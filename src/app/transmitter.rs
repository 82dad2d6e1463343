//! DMX transmitter — the hexagonal core.
//!
//! [`DmxTransmitter`] owns the channel table and the encoded frame.  The
//! host loop calls [`service_tick`](DmxTransmitter::service_tick) as often
//! as it can; each tick re-encodes pending channel writes and, when the
//! transport is idle, starts the next frame.
//!
//! ```text
//!  set_channel(s) ──▶ channels ──dirty──▶ encode ──pending──▶ transfer_async
//!                                                   ▲
//!                         refresh interval elapsed ─┘
//! ```
//!
//! Two flags instead of one: `dirty` means the frame buffer is stale,
//! `pending` means a send is owed.  A burst of writes while the transport
//! is busy collapses into one encode and one transfer once it frees up.
//!
//! The frame buffer is never touched while the transport reports busy, so
//! a DMA transfer in flight always shifts out a consistent frame.

use log::{debug, info, trace, warn};

use crate::config::DmxConfig;
use crate::error::Result;
use crate::frame::{CHANNEL_COUNT, DMX_BIT_RATE_HZ, FrameBuffer, blocks_in_use};

use super::ports::{BitOrder, MonotonicClock, SerialTransport, SpiMode, SpiSettings};

/// SPI settings that make MOSI carry a DMX512 bitstream.
pub const DMX_SPI_SETTINGS: SpiSettings = SpiSettings {
    clock_hz: DMX_BIT_RATE_HZ,
    bit_order: BitOrder::LsbFirst,
    mode: SpiMode::Mode0,
};

// ───────────────────────────────────────────────────────────────
// State, reasons, counters
// ───────────────────────────────────────────────────────────────

/// Observable transmitter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitterState {
    /// [`DmxTransmitter::initialize`] has not run yet.
    Uninitialized,
    /// Frame buffer is current and no send is owed.
    Idle,
    /// Channels changed since the last encode.
    Dirty,
    /// Frame is encoded and waits for the transport.
    TransferPending,
}

/// Why a frame was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferReason {
    /// New channel data.
    Update,
    /// Keep-alive resend of unchanged data.
    Refresh,
}

/// Running counters, reset only with the transmitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitterStats {
    /// Frames handed to the transport.
    pub frames_sent: u64,
    /// Of those, frames carrying new data.
    pub update_frames: u64,
    /// Of those, keep-alive resends.
    pub refresh_frames: u64,
    /// Ticks that owed work but found the transport busy.
    pub deferred_ticks: u64,
    /// Channel writes dropped for exceeding the universe.
    pub dropped_writes: u64,
    /// Transfers the transport refused to start.
    pub failed_transfers: u64,
}

// ───────────────────────────────────────────────────────────────
// DmxTransmitter
// ───────────────────────────────────────────────────────────────

/// Encoder and refresh scheduler for one DMX512 universe.
pub struct DmxTransmitter {
    refresh_interval_us: u64,
    channels: [u8; CHANNEL_COUNT],
    /// One past the highest channel written since reset.
    high_water: usize,
    frame: FrameBuffer,
    dirty: bool,
    pending: bool,
    last_transfer_us: u64,
    initialized: bool,
    stats: TransmitterStats,
}

impl DmxTransmitter {
    /// Build a transmitter from configuration.
    ///
    /// Does **not** touch the transport — call [`initialize`](Self::initialize)
    /// next.
    pub fn new(config: &DmxConfig) -> Self {
        Self {
            refresh_interval_us: config.refresh_interval_us(),
            channels: [0; CHANNEL_COUNT],
            high_water: 0,
            frame: FrameBuffer::new(),
            dirty: true,
            pending: false,
            last_transfer_us: 0,
            initialized: false,
            stats: TransmitterStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Configure the transport for DMX, route the TX pin, then [`reset`](Self::reset).
    ///
    /// Must run exactly once before any other operation.
    pub fn initialize(&mut self, bus: &mut impl SerialTransport) -> Result<()> {
        bus.configure(&DMX_SPI_SETTINGS)?;
        // Pin routing goes last; configure() may have re-muxed it.
        bus.route_pin()?;
        self.initialized = true;
        info!(
            "DMX transmitter initialised ({} Hz, refresh {} ms)",
            DMX_SPI_SETTINGS.clock_hz,
            self.refresh_interval_us / 1000
        );
        self.reset(bus);
        Ok(())
    }

    /// Wait for the transport to go idle, then restore power-on defaults.
    ///
    /// The first tick after a reset always sends a frame.
    pub fn reset(&mut self, bus: &mut impl SerialTransport) {
        while bus.is_busy() {
            bus.yield_now();
        }

        self.frame.clear();
        self.channels = [0; CHANNEL_COUNT];
        self.high_water = 0;
        self.last_transfer_us = 0;
        self.pending = false;
        self.dirty = true;
        self.stats = TransmitterStats::default();
        debug!("DMX transmitter reset");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Encode pending writes and start a frame when one is owed.
    ///
    /// Never blocks.  Returns why a frame was started, or `None` when the
    /// transport was busy or nothing was due.
    pub fn service_tick(
        &mut self,
        bus: &mut impl SerialTransport,
        clock: &impl MonotonicClock,
    ) -> Option<TransferReason> {
        debug_assert!(self.initialized, "service_tick before initialize");

        if bus.is_busy() {
            if self.dirty || self.pending {
                self.stats.deferred_ticks += 1;
            }
            return None;
        }

        if self.dirty {
            self.frame
                .encode(&self.channels, blocks_in_use(self.high_water));
            self.dirty = false;
            self.pending = true;
        }

        let now = clock.now_us();
        let reason = if self.pending {
            TransferReason::Update
        } else if now.saturating_sub(self.last_transfer_us) >= self.refresh_interval_us {
            TransferReason::Refresh
        } else {
            return None;
        };

        if let Err(e) = bus.transfer_async(self.frame.as_bytes()) {
            // Keep `pending` so the next tick retries.
            self.stats.failed_transfers += 1;
            warn!("DMX frame not started: {}", e);
            return None;
        }

        self.pending = false;
        self.last_transfer_us = now;
        self.stats.frames_sent += 1;
        match reason {
            TransferReason::Update => self.stats.update_frames += 1,
            TransferReason::Refresh => self.stats.refresh_frames += 1,
        }
        trace!("DMX frame started ({:?}) at {} us", reason, now);
        Some(reason)
    }

    // ── Channel access ────────────────────────────────────────

    /// Write `data` to consecutive channels starting at `start`.
    ///
    /// Writes reaching past channel 511 are dropped whole, without error;
    /// DMX has no back channel to report them on.  An in-range empty write
    /// still raises the high-water mark to `start` and marks the frame dirty.
    pub fn set_channels(&mut self, start: usize, data: &[u8]) {
        let Some(end) = start
            .checked_add(data.len())
            .filter(|&end| end <= CHANNEL_COUNT)
        else {
            self.stats.dropped_writes += 1;
            debug!(
                "DMX write dropped: start={} len={} exceeds {} channels",
                start,
                data.len(),
                CHANNEL_COUNT
            );
            return;
        };

        self.high_water = self.high_water.max(end);
        self.channels[start..end].copy_from_slice(data);
        self.dirty = true;
    }

    /// Write a single channel.
    pub fn set_channel(&mut self, index: usize, value: u8) {
        self.set_channels(index, &[value]);
    }

    /// Current value of a channel.
    ///
    /// # Panics
    ///
    /// If `index` is not below 512.
    pub fn get_channel(&self, index: usize) -> u8 {
        self.channels[index]
    }

    // ── Queries ───────────────────────────────────────────────

    /// The whole channel table, index 0 being DMX channel 1.
    pub fn channels(&self) -> &[u8; CHANNEL_COUNT] {
        &self.channels
    }

    /// The frame as it will next be shifted out.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// One past the highest channel written since the last reset.
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    /// Lifecycle state, derived from the dirty and pending flags.
    pub fn state(&self) -> TransmitterState {
        if !self.initialized {
            TransmitterState::Uninitialized
        } else if self.dirty {
            TransmitterState::Dirty
        } else if self.pending {
            TransmitterState::TransferPending
        } else {
            TransmitterState::Idle
        }
    }

    /// Counters since the last reset.
    pub fn stats(&self) -> &TransmitterStats {
        &self.stats
    }

    /// Idle time after which an unchanged frame is sent again.
    pub fn refresh_interval_us(&self) -> u64 {
        self.refresh_interval_us
    }
}
