//! Mock transport and clock for integration tests.
//!
//! Records every transport call so tests can assert on the full history
//! and decode exactly what would have gone out on the wire.

use std::cell::Cell;

use dmxspi::app::ports::{MonotonicClock, SerialTransport, SpiSettings, TransportError};
use dmxspi::frame::{DecodedFrame, decode};

// ── Transport call record ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Configure(SpiSettings),
    RoutePin,
    Transfer(Vec<u8>),
}

// ── MockTransport ─────────────────────────────────────────────

pub struct MockTransport {
    pub calls: Vec<TransportCall>,
    /// Reported by `is_busy` while no countdown is running.
    pub busy: bool,
    /// `is_busy` answers `true` this many more times, then falls back
    /// to `busy`.
    pub busy_polls: u32,
    pub yields: u32,
    pub fail_configure: Option<TransportError>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            busy: false,
            busy_polls: 0,
            yields: 0,
            fail_configure: None,
        }
    }

    pub fn transfers(&self) -> Vec<&[u8]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::Transfer(frame) => Some(frame.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers().len()
    }

    /// Decode the most recent frame handed to the transport.
    pub fn last_decoded(&self) -> DecodedFrame {
        let frames = self.transfers();
        let last = frames.last().expect("no frame transferred");
        decode(last).expect("transferred frame must decode")
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialTransport for MockTransport {
    fn configure(&mut self, settings: &SpiSettings) -> Result<(), TransportError> {
        if let Some(e) = self.fail_configure {
            return Err(e);
        }
        self.calls.push(TransportCall::Configure(*settings));
        Ok(())
    }

    fn route_pin(&mut self) -> Result<(), TransportError> {
        self.calls.push(TransportCall::RoutePin);
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return true;
        }
        self.busy
    }

    fn transfer_async(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.calls.push(TransportCall::Transfer(frame.to_vec()));
        Ok(())
    }

    fn yield_now(&mut self) {
        self.yields += 1;
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Clock that only moves when the test says so.
pub struct ManualClock(Cell<u64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn at(us: u64) -> Self {
        Self(Cell::new(us))
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.set(self.0.get() + ms * 1000);
    }
}

impl MonotonicClock for ManualClock {
    fn now_us(&self) -> u64 {
        self.0.get()
    }
}
