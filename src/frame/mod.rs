//! DMX512 frame layout for an LSB-first SPI bitstream.
//!
//! The SPI peripheral is clocked at the DMX bit rate (250 kHz), so every
//! transport bit is one DMX bit and the MOSI line *is* the DMX line.  The
//! UART framing (start bit, 8 data bits LSB-first, 2 stop bits) is baked
//! into constant templates; encoding only ORs channel bits on top.
//!
//! ```text
//!  ┌──────────── header (5 bytes) ────────────┬─ block 0 (11 bytes) ─┬ … ┬─ block 63 ─┐
//!  │ Break 26b │ MAB 3b │ S │ 0x00 │ P P      │ 8 × (S d0..d7 P P)   │   │            │
//!  └───────────┴────────┴───┴──────┴──────────┴──────────────────────┴───┴────────────┘
//!     104 µs      12 µs        start code         channels 0..7            504..511
//! ```
//!
//! One block carries 8 slots × 11 bits = 88 bits = 11 bytes, so slot
//! boundaries line up with byte boundaries again at every block edge.

pub mod decode;

pub use decode::{DecodeError, DecodedFrame, decode};

// ───────────────────────────────────────────────────────────────
// Protocol constants
// ───────────────────────────────────────────────────────────────

/// DMX512 bit rate; the SPI clock runs at exactly this rate.
pub const DMX_BIT_RATE_HZ: u32 = 250_000;

/// Number of channel slots in one universe.
pub const CHANNEL_COUNT: usize = 512;

/// Channels packed into one slot block.
pub const CHANNELS_PER_BLOCK: usize = 8;

/// Bits per framed slot: start + 8 data + 2 stop.
pub const BITS_PER_SLOT: usize = 11;

/// Bytes per slot block (8 slots × 11 bits).
pub const BLOCK_LEN: usize = 11;

/// Number of slot blocks in a full frame.
pub const BLOCK_COUNT: usize = CHANNEL_COUNT / CHANNELS_PER_BLOCK;

/// Header length: Break + Mark-after-Break + start code.
pub const HEADER_LEN: usize = 5;

/// Total transport bytes per frame.
pub const FRAME_LEN: usize = HEADER_LEN + BLOCK_COUNT * BLOCK_LEN;

/// Break length in bits (104 µs at 250 kHz, minimum 92 µs).
pub const BREAK_BITS: usize = 26;

/// Mark-after-Break length in bits (12 µs at 250 kHz, minimum 12 µs).
pub const MAB_BITS: usize = 3;

/// Time one frame occupies on the wire, in microseconds.
pub const FRAME_DURATION_US: u64 =
    (FRAME_LEN as u64 * 8 * 1_000_000).div_ceil(DMX_BIT_RATE_HZ as u64);

/// Break + Mark + start code `0`, LSB first.
///
/// 26 low bits, 3 high bits, then the start code framed as one start bit,
/// eight zero data bits and two stop bits.
pub const HEADER: [u8; HEADER_LEN] = [
    0b0000_0000,
    0b0000_0000,
    0b0000_0000,
    0b0001_1100,
    0b1100_0000,
];

/// Eight slots of value `0` with their start and stop bits, LSB first.
pub const BLOCK_TEMPLATE: [u8; BLOCK_LEN] = [
    0b0000_0000,
    0b0000_0110,
    0b0011_0000,
    0b1000_0000,
    0b0000_0001,
    0b0000_1100,
    0b0110_0000,
    0b0000_0000,
    0b0000_0011,
    0b0001_1000,
    0b1100_0000,
];

// ───────────────────────────────────────────────────────────────
// Index helpers
// ───────────────────────────────────────────────────────────────

/// Where a channel's data bits land in the frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPosition {
    /// Slot block holding the channel.
    pub block: usize,
    /// Byte within the block receiving the low data bits.
    pub byte: usize,
    /// Left shift of the data byte within `byte`; the remaining
    /// `shift` high bits spill into `byte + 1`.
    pub shift: u32,
}

/// Map a channel index (0..512) to its block, byte offset and bit shift.
pub const fn slot_position(channel: usize) -> SlotPosition {
    let slot = channel % CHANNELS_PER_BLOCK;
    // Skip the start bit.
    let bit = slot * BITS_PER_SLOT + 1;
    SlotPosition {
        block: channel / CHANNELS_PER_BLOCK,
        byte: bit / 8,
        shift: (bit % 8) as u32,
    }
}

/// Byte range of slot block `block` within the frame buffer.
pub const fn block_range(block: usize) -> core::ops::Range<usize> {
    let start = HEADER_LEN + block * BLOCK_LEN;
    start..start + BLOCK_LEN
}

/// Number of blocks that must be encoded to cover `high_water` channels.
pub const fn blocks_in_use(high_water: usize) -> usize {
    high_water.div_ceil(CHANNELS_PER_BLOCK)
}

// ───────────────────────────────────────────────────────────────
// Encoding
// ───────────────────────────────────────────────────────────────

/// Pack eight channel values into one 11-byte slot block.
///
/// The block is rebuilt from [`BLOCK_TEMPLATE`] so framing bits are never
/// lost, whatever the previous contents were.
pub fn encode_block(block: &mut [u8; BLOCK_LEN], channels: &[u8; CHANNELS_PER_BLOCK]) {
    *block = BLOCK_TEMPLATE;
    for (slot, &value) in channels.iter().enumerate() {
        let pos = slot_position(slot);
        block[pos.byte] |= value << pos.shift;
        if pos.shift != 0 {
            block[pos.byte + 1] |= value >> (8 - pos.shift);
        }
    }
}

/// The complete transport frame: header followed by 64 slot blocks.
///
/// Always holds a valid 512-slot frame, so it can be handed to the
/// transport at any moment.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: [u8; FRAME_LEN],
}

impl FrameBuffer {
    /// A frame with every channel at zero.
    pub const fn new() -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        let mut i = 0;
        while i < HEADER_LEN {
            bytes[i] = HEADER[i];
            i += 1;
        }
        let mut block = 0;
        while block < BLOCK_COUNT {
            let mut j = 0;
            while j < BLOCK_LEN {
                bytes[HEADER_LEN + block * BLOCK_LEN + j] = BLOCK_TEMPLATE[j];
                j += 1;
            }
            block += 1;
        }
        Self { bytes }
    }

    /// Restore header and all blocks to their power-on contents.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Re-encode the first `blocks` slot blocks from `channels`.
    pub fn encode(&mut self, channels: &[u8; CHANNEL_COUNT], blocks: usize) {
        for block in 0..blocks.min(BLOCK_COUNT) {
            let first = block * CHANNELS_PER_BLOCK;
            let values: [u8; CHANNELS_PER_BLOCK] = core::array::from_fn(|i| channels[first + i]);
            let mut packed = [0u8; BLOCK_LEN];
            encode_block(&mut packed, &values);
            self.bytes[block_range(block)].copy_from_slice(&packed);
        }
    }

    /// Raw bytes as shifted out by the transport.
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// One slot block.
    pub fn block(&self, block: usize) -> &[u8] {
        &self.bytes[block_range(block)]
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("header", &&self.bytes[..HEADER_LEN])
            .field("len", &FRAME_LEN)
            .finish()
    }
}
