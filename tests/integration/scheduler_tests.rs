//! Refresh/transmission scheduling: when `service_tick` starts a frame.

use dmxspi::frame::FrameBuffer;
use dmxspi::{DmxConfig, DmxTransmitter, TransferReason, TransmitterState};

use crate::mock_transport::{ManualClock, MockTransport};

/// Initialised transmitter whose post-reset frame has already gone out.
fn settled(config: &DmxConfig) -> (DmxTransmitter, MockTransport, ManualClock) {
    let mut bus = MockTransport::new();
    let clock = ManualClock::at(1_000_000);
    let mut dmx = DmxTransmitter::new(config);
    dmx.initialize(&mut bus).unwrap();
    assert_eq!(dmx.service_tick(&mut bus, &clock), Some(TransferReason::Update));
    assert_eq!(dmx.state(), TransmitterState::Idle);
    (dmx, bus, clock)
}

#[test]
fn single_write_then_tick_sends_one_frame() {
    let mut bus = MockTransport::new();
    let clock = ManualClock::at(0);
    let mut dmx = DmxTransmitter::new(&DmxConfig::default());
    dmx.initialize(&mut bus).unwrap();

    dmx.set_channel(0, 0xFF);
    dmx.service_tick(&mut bus, &clock);

    assert_eq!(bus.transfer_count(), 1);
    let frame = bus.last_decoded();
    assert_eq!(frame.start_code, 0);
    assert_eq!(frame.slots[0], 0xFF);
    assert!(frame.slots[1..8].iter().all(|&v| v == 0));
}

#[test]
fn transfer_hands_over_the_whole_frame() {
    let (mut dmx, mut bus, clock) = settled(&DmxConfig::default());
    dmx.set_channel(3, 0x10);
    dmx.service_tick(&mut bus, &clock);
    assert_eq!(bus.transfers().last().copied(), Some(&dmx.frame().as_bytes()[..]));
}

#[test]
fn unchanged_frame_is_refreshed_after_interval() {
    let (mut dmx, mut bus, clock) = settled(&DmxConfig::default());
    let sent = bus.transfer_count();

    clock.advance_ms(399);
    assert_eq!(dmx.service_tick(&mut bus, &clock), None);
    assert_eq!(bus.transfer_count(), sent);

    clock.advance_ms(1);
    assert_eq!(dmx.service_tick(&mut bus, &clock), Some(TransferReason::Refresh));
    assert_eq!(bus.transfer_count(), sent + 1);
    assert_eq!(dmx.stats().refresh_frames, 1);

    // Same data both times.
    let frames = bus.transfers();
    assert_eq!(frames[frames.len() - 1], frames[frames.len() - 2]);

    // Timer restarts from the refresh.
    assert_eq!(dmx.service_tick(&mut bus, &clock), None);
}

#[test]
fn shorter_refresh_interval_is_honoured() {
    let config = DmxConfig {
        refresh_interval_ms: 200,
        ..DmxConfig::default()
    };
    let (mut dmx, mut bus, clock) = settled(&config);

    clock.advance_ms(199);
    assert_eq!(dmx.service_tick(&mut bus, &clock), None);
    clock.advance_ms(1);
    assert_eq!(dmx.service_tick(&mut bus, &clock), Some(TransferReason::Refresh));
}

#[test]
fn update_does_not_wait_for_refresh_timer() {
    let (mut dmx, mut bus, clock) = settled(&DmxConfig::default());

    clock.advance_ms(1);
    dmx.set_channel(42, 7);
    assert_eq!(dmx.service_tick(&mut bus, &clock), Some(TransferReason::Update));
    assert_eq!(bus.last_decoded().slots[42], 7);

    // Update restarted the refresh timer.
    clock.advance_ms(399);
    assert_eq!(dmx.service_tick(&mut bus, &clock), None);
}

#[test]
fn busy_transport_defers_encode_and_transfer() {
    let (mut dmx, mut bus, clock) = settled(&DmxConfig::default());
    let sent = bus.transfer_count();
    let before: FrameBuffer = dmx.frame().clone();

    bus.busy = true;
    for i in 0..5u8 {
        dmx.set_channel(usize::from(i), i + 1);
        clock.advance_ms(100);
        assert_eq!(dmx.service_tick(&mut bus, &clock), None);
        assert_eq!(dmx.frame(), &before, "frame mutated while busy");
    }
    assert_eq!(bus.transfer_count(), sent);
    assert_eq!(dmx.stats().deferred_ticks, 5);

    bus.busy = false;
    assert_eq!(dmx.service_tick(&mut bus, &clock), Some(TransferReason::Update));
    assert_eq!(bus.transfer_count(), sent + 1);
    assert_eq!(&bus.last_decoded().slots[..6], &[1, 2, 3, 4, 5, 0]);

    // Caught up: nothing more owed.
    assert_eq!(dmx.service_tick(&mut bus, &clock), None);
    assert_eq!(bus.transfer_count(), sent + 1);
}

#[test]
fn busy_transport_defers_refresh() {
    let (mut dmx, mut bus, clock) = settled(&DmxConfig::default());
    let sent = bus.transfer_count();

    bus.busy = true;
    clock.advance_ms(500);
    assert_eq!(dmx.service_tick(&mut bus, &clock), None);
    assert_eq!(bus.transfer_count(), sent);

    bus.busy = false;
    assert_eq!(dmx.service_tick(&mut bus, &clock), Some(TransferReason::Refresh));
}

#[test]
fn burst_of_writes_collapses_into_one_frame() {
    let (mut dmx, mut bus, clock) = settled(&DmxConfig::default());
    let sent = bus.transfer_count();

    for v in 0..=200u8 {
        dmx.set_channel(10, v);
    }
    dmx.set_channels(100, &[9; 16]);
    assert_eq!(dmx.state(), TransmitterState::Dirty);

    dmx.service_tick(&mut bus, &clock);
    dmx.service_tick(&mut bus, &clock);
    assert_eq!(bus.transfer_count(), sent + 1);

    let frame = bus.last_decoded();
    assert_eq!(frame.slots[10], 200);
    assert!(frame.slots[100..116].iter().all(|&v| v == 9));
    assert_eq!(dmx.stats().update_frames, 2);
}

#[test]
fn dropped_write_sends_nothing() {
    let (mut dmx, mut bus, clock) = settled(&DmxConfig::default());
    let sent = bus.transfer_count();

    dmx.set_channels(500, &[0xAA; 20]);
    assert_eq!(dmx.state(), TransmitterState::Idle);
    assert_eq!(dmx.service_tick(&mut bus, &clock), None);
    assert_eq!(bus.transfer_count(), sent);
    assert_eq!(dmx.stats().dropped_writes, 1);
}
