//! Frame decoder — reads an encoded transport buffer the way a DMX
//! receiver's UART would.
//!
//! Used to inspect what actually goes out on the wire: tests check the
//! encoder against it, and the fuzz target throws arbitrary buffers at it.
//!
//! Bits are consumed LSB-first, one transport bit per DMX bit.  Idle line
//! (high) between slots is skipped, as a UART waits for the next falling
//! edge.  Slot numbering follows DMX: slot 0 is the start code.

use core::fmt;

use heapless::Vec;

use super::{CHANNEL_COUNT, DMX_BIT_RATE_HZ};

/// Minimum Break a receiver must see, in microseconds.
pub const MIN_BREAK_US: u32 = 92;

/// Minimum Mark-after-Break, in microseconds.
pub const MIN_MAB_US: u32 = 12;

/// A decoded DMX512 packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Length of the Break in bit times.
    pub break_bits: usize,
    /// Length of the Mark-after-Break in bit times.
    pub mab_bits: usize,
    /// Slot 0.
    pub start_code: u8,
    /// Channel values, slot 1 onwards.
    pub slots: Vec<u8, CHANNEL_COUNT>,
}

impl DecodedFrame {
    /// Break duration in microseconds.
    pub fn break_us(&self) -> u32 {
        bits_to_us(self.break_bits)
    }

    /// Mark-after-Break duration in microseconds.
    pub fn mab_us(&self) -> u32 {
        bits_to_us(self.mab_bits)
    }
}

/// Why a buffer is not a valid DMX512 packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream does not begin with a low Break.
    NoBreak,
    /// Break shorter than [`MIN_BREAK_US`].
    BreakTooShort { bits: usize },
    /// Mark-after-Break shorter than [`MIN_MAB_US`].
    MarkTooShort { bits: usize },
    /// Stream ended before a start code was seen.
    MissingStartCode,
    /// Stop bits of a slot were not high.
    Framing { slot: usize },
    /// Stream ended in the middle of a slot.
    Truncated { slot: usize },
    /// More than 512 data slots.
    TooManySlots,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBreak => write!(f, "no break at start of frame"),
            Self::BreakTooShort { bits } => {
                write!(f, "break too short ({} us)", bits_to_us(*bits))
            }
            Self::MarkTooShort { bits } => {
                write!(f, "mark-after-break too short ({} us)", bits_to_us(*bits))
            }
            Self::MissingStartCode => write!(f, "missing start code"),
            Self::Framing { slot } => write!(f, "framing error in slot {}", slot),
            Self::Truncated { slot } => write!(f, "frame truncated in slot {}", slot),
            Self::TooManySlots => write!(f, "more than {} slots", CHANNEL_COUNT),
        }
    }
}

impl std::error::Error for DecodeError {}

fn bits_to_us(bits: usize) -> u32 {
    (bits as u64 * 1_000_000 / DMX_BIT_RATE_HZ as u64) as u32
}

fn us_to_bits(us: u32) -> usize {
    (us as u64 * DMX_BIT_RATE_HZ as u64).div_ceil(1_000_000) as usize
}

// ───────────────────────────────────────────────────────────────
// Bit reader
// ───────────────────────────────────────────────────────────────

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<bool> {
        let byte = self.bytes.get(self.pos / 8)?;
        Some((byte >> (self.pos % 8)) & 1 == 1)
    }

    fn next(&mut self) -> Option<bool> {
        let bit = self.peek()?;
        self.pos += 1;
        Some(bit)
    }

    /// Consume consecutive bits equal to `level`, returning how many.
    fn run(&mut self, level: bool) -> usize {
        let start = self.pos;
        while self.peek() == Some(level) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Read one UART character: start bit, 8 data bits, 2 stop bits.
    /// The caller has already checked that the next bit is low.
    fn slot(&mut self, slot: usize) -> Result<u8, DecodeError> {
        let truncated = DecodeError::Truncated { slot };
        self.next().ok_or(truncated)?;
        let mut value = 0u8;
        for i in 0..8 {
            if self.next().ok_or(truncated)? {
                value |= 1 << i;
            }
        }
        for _ in 0..2 {
            if !self.next().ok_or(truncated)? {
                return Err(DecodeError::Framing { slot });
            }
        }
        Ok(value)
    }
}

/// Decode an LSB-first transport buffer into a DMX packet.
pub fn decode(bytes: &[u8]) -> Result<DecodedFrame, DecodeError> {
    let mut bits = BitReader::new(bytes);

    let break_bits = bits.run(false);
    if break_bits == 0 {
        return Err(DecodeError::NoBreak);
    }
    let mab_bits = bits.run(true);
    if bits.peek().is_none() {
        return Err(DecodeError::MissingStartCode);
    }
    if break_bits < us_to_bits(MIN_BREAK_US) {
        return Err(DecodeError::BreakTooShort { bits: break_bits });
    }
    if mab_bits < us_to_bits(MIN_MAB_US) {
        return Err(DecodeError::MarkTooShort { bits: mab_bits });
    }

    let start_code = bits.slot(0)?;
    let mut slots = Vec::new();
    loop {
        // Inter-slot mark; a UART just waits for the next start bit.
        bits.run(true);
        if bits.peek().is_none() {
            break;
        }
        let value = bits.slot(slots.len() + 1)?;
        slots.push(value).map_err(|_| DecodeError::TooManySlots)?;
    }

    Ok(DecodedFrame {
        break_bits,
        mab_bits,
        start_code,
        slots,
    })
}
