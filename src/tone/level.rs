//! Shared Output Register
//!
//! A single byte combining the global volume level and the instantaneous
//! output state of each channel. As a whole it is the index into the duty
//! table:
//!
//! ```text
//! bit:  7 6 5 | 4   3   2  | 1 0
//!       unused| ch2 ch1 ch0| volume
//! ```
//!
//! This is the only state written from both the channel timer interrupts and
//! foreground code. Every mutation is one atomic read-modify-write, so a bit
//! flipped by an interrupt can never be lost to a concurrent volume change
//! and vice versa.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::channel::{Channel, ChannelMask};

/// Volume bits of the register
pub const VOLUME_MASK: u8 = 0b0000_0011;
/// Position of channel 0's activity bit
pub const ACTIVITY_SHIFT: u8 = 2;
/// Activity bits of the register
pub const ACTIVITY_MASK: u8 = 0b0001_1100;
/// Number of distinct register values (duty table length)
pub const LEVEL_INDEX_COUNT: usize = 32;

/// Snapshot of the register, always within `0..LEVEL_INDEX_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelIndex(u8);

impl LevelIndex {
    /// Build an index from volume bits and channel activity
    pub const fn new(volume_bits: u8, activity: ChannelMask) -> Self {
        LevelIndex((volume_bits & VOLUME_MASK) | (activity.bits() << ACTIVITY_SHIFT))
    }

    /// Index from a raw register value (unused bits discarded)
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        LevelIndex(raw & (VOLUME_MASK | ACTIVITY_MASK))
    }

    /// Raw register value
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Volume bits (0-3)
    #[inline]
    pub const fn volume_bits(self) -> u8 {
        self.0 & VOLUME_MASK
    }

    /// Channels whose output is currently high
    #[inline]
    pub const fn activity(self) -> ChannelMask {
        ChannelMask::from_bits_truncate((self.0 & ACTIVITY_MASK) >> ACTIVITY_SHIFT)
    }

    /// Table index
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

#[inline]
const fn channel_bit(channel: Channel) -> u8 {
    1 << (channel as u8 + ACTIVITY_SHIFT)
}

/// Interrupt-shared output register
#[derive(Debug, Default)]
pub struct OutputLevel(AtomicU8);

impl OutputLevel {
    /// Create a register with all channels low at the given volume bits
    pub const fn new(volume_bits: u8) -> Self {
        OutputLevel(AtomicU8::new(volume_bits & VOLUME_MASK))
    }

    /// Current register value
    #[inline]
    pub fn load(&self) -> LevelIndex {
        LevelIndex::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Flip a channel's output bit, returning the updated value
    #[inline]
    pub fn toggle_channel(&self, channel: Channel) -> LevelIndex {
        let bit = channel_bit(channel);
        let previous = self.0.fetch_xor(bit, Ordering::AcqRel);
        LevelIndex::from_raw(previous ^ bit)
    }

    /// Force a channel's output bit low, returning the updated value
    #[inline]
    pub fn clear_channel(&self, channel: Channel) -> LevelIndex {
        let bit = channel_bit(channel);
        let previous = self.0.fetch_and(!bit, Ordering::AcqRel);
        LevelIndex::from_raw(previous & !bit)
    }

    /// Force every channel bit low, keeping the volume
    pub fn clear_activity(&self) -> LevelIndex {
        let previous = self.0.fetch_and(VOLUME_MASK, Ordering::AcqRel);
        LevelIndex::from_raw(previous & VOLUME_MASK)
    }

    /// Replace the volume bits, keeping channel activity
    pub fn set_volume_bits(&self, volume_bits: u8) -> LevelIndex {
        let bits = volume_bits & VOLUME_MASK;
        let update = |raw: u8| Some((raw & !VOLUME_MASK) | bits);
        // closure never returns None, so both arms carry the previous value
        let previous = match self.0.fetch_update(Ordering::AcqRel, Ordering::Acquire, update) {
            Ok(raw) | Err(raw) => raw,
        };
        LevelIndex::from_raw((previous & !VOLUME_MASK) | bits)
    }
}
