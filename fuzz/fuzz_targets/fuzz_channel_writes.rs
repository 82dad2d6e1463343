//! Fuzz target: `DmxTransmitter::set_channels` + `service_tick`
//!
//! Interprets the input as a sequence of `(start, len, value)` writes,
//! services the transmitter, and checks that the frame on the wire still
//! decodes to exactly the channel table.
//!
//! cargo fuzz run fuzz_channel_writes

#![no_main]

use dmxspi::app::ports::{SerialTransport, SpiSettings, TransportError};
use dmxspi::frame::decode;
use dmxspi::{DmxConfig, DmxTransmitter, MonotonicClock};
use libfuzzer_sys::fuzz_target;

struct Wire(Vec<u8>);

impl SerialTransport for Wire {
    fn configure(&mut self, _: &SpiSettings) -> Result<(), TransportError> {
        Ok(())
    }
    fn route_pin(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
    fn is_busy(&mut self) -> bool {
        false
    }
    fn transfer_async(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.0 = frame.to_vec();
        Ok(())
    }
}

struct Zero;

impl MonotonicClock for Zero {
    fn now_us(&self) -> u64 {
        0
    }
}

fuzz_target!(|data: &[u8]| {
    let mut wire = Wire(Vec::new());
    let mut dmx = DmxTransmitter::new(&DmxConfig::default());
    dmx.initialize(&mut wire).unwrap();

    for op in data.chunks_exact(4) {
        let start = usize::from(u16::from_le_bytes([op[0], op[1]]));
        let len = usize::from(op[2]);
        dmx.set_channels(start, &vec![op[3]; len]);
    }
    dmx.service_tick(&mut wire, &Zero);

    let frame = decode(&wire.0).expect("encoded frame must decode");
    assert_eq!(frame.slots.as_slice(), &dmx.channels()[..]);
});
