//! Initialisation and reset against the mock transport.

use dmxspi::app::ports::{BitOrder, SpiMode, TransportError};
use dmxspi::app::transmitter::DMX_SPI_SETTINGS;
use dmxspi::frame::{BLOCK_COUNT, BLOCK_TEMPLATE, CHANNEL_COUNT, HEADER, HEADER_LEN, decode};
use dmxspi::{DmxConfig, DmxTransmitter, Error, TransmitterState};

use crate::mock_transport::{ManualClock, MockTransport, TransportCall};

#[test]
fn initialize_configures_then_routes_pin() {
    let mut bus = MockTransport::new();
    let mut dmx = DmxTransmitter::new(&DmxConfig::default());
    dmx.initialize(&mut bus).unwrap();

    assert_eq!(
        bus.calls,
        vec![TransportCall::Configure(DMX_SPI_SETTINGS), TransportCall::RoutePin]
    );
    assert_eq!(DMX_SPI_SETTINGS.clock_hz, 250_000);
    assert_eq!(DMX_SPI_SETTINGS.bit_order, BitOrder::LsbFirst);
    assert_eq!(DMX_SPI_SETTINGS.mode, SpiMode::Mode0);
    assert_eq!(dmx.state(), TransmitterState::Dirty);
}

#[test]
fn configure_failure_is_returned() {
    let mut bus = MockTransport::new();
    bus.fail_configure = Some(TransportError::InitFailed(-3));
    let mut dmx = DmxTransmitter::new(&DmxConfig::default());

    let err = dmx.initialize(&mut bus).unwrap_err();
    assert_eq!(err, Error::Transport(TransportError::InitFailed(-3)));
    assert_eq!(dmx.state(), TransmitterState::Uninitialized);
    // Pin is not routed after a failed configure.
    assert!(bus.calls.is_empty());
}

#[test]
fn reset_frame_decodes_to_empty_universe() {
    let mut bus = MockTransport::new();
    let mut dmx = DmxTransmitter::new(&DmxConfig::default());
    dmx.initialize(&mut bus).unwrap();

    let bytes = dmx.frame().as_bytes();
    assert_eq!(bytes[..HEADER_LEN], HEADER);
    for b in 0..BLOCK_COUNT {
        assert_eq!(dmx.frame().block(b), BLOCK_TEMPLATE);
    }

    let frame = decode(bytes).unwrap();
    assert!(frame.break_us() >= 92);
    assert!(frame.mab_us() >= 12);
    assert_eq!(frame.start_code, 0);
    assert_eq!(frame.slots.len(), CHANNEL_COUNT);
    assert!(frame.slots.iter().all(|&v| v == 0));
}

#[test]
fn reset_waits_for_transfer_in_flight() {
    let mut bus = MockTransport::new();
    let mut dmx = DmxTransmitter::new(&DmxConfig::default());
    dmx.initialize(&mut bus).unwrap();
    dmx.set_channels(0, &[0x55; 64]);

    bus.busy_polls = 3;
    dmx.reset(&mut bus);

    assert_eq!(bus.yields, 3);
    assert_eq!(bus.busy_polls, 0);
    assert_eq!(dmx.high_water_mark(), 0);
    assert!(dmx.channels().iter().all(|&v| v == 0));
}

#[test]
fn reset_after_traffic_sends_blank_frame() {
    let mut bus = MockTransport::new();
    let clock = ManualClock::at(0);
    let mut dmx = DmxTransmitter::new(&DmxConfig::default());
    dmx.initialize(&mut bus).unwrap();

    dmx.set_channels(0, &[0xFF; CHANNEL_COUNT]);
    dmx.service_tick(&mut bus, &clock);
    assert!(bus.last_decoded().slots.iter().all(|&v| v == 0xFF));

    dmx.reset(&mut bus);
    assert_eq!(dmx.state(), TransmitterState::Dirty);
    clock.advance_ms(1);
    dmx.service_tick(&mut bus, &clock);
    assert!(bus.last_decoded().slots.iter().all(|&v| v == 0));
}
