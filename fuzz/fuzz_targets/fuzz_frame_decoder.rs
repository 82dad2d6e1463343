//! Fuzz target: `frame::decode`
//!
//! Throws arbitrary byte buffers at the wire decoder and asserts that it
//! never panics and never reports more slots than a universe holds.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use dmxspi::frame::{CHANNEL_COUNT, decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = decode(data) {
        assert!(frame.slots.len() <= CHANNEL_COUNT);
        assert!(frame.break_us() >= 92, "decoder accepted a short break");
        assert!(frame.mab_us() >= 12, "decoder accepted a short mark");
    }
});
