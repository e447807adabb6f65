//! Tone Channels
//!
//! The synthesizer has three independent square-wave channels sharing one
//! pulse-width output. Music normally occupies channels 0 and 1, sound
//! effects channel 2.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Number of tone channels
pub const CHANNEL_COUNT: usize = 3;

/// One of the three tone channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Channel 0
    Ch0,
    /// Channel 1
    Ch1,
    /// Channel 2
    Ch2,
}

impl Channel {
    /// All channels in index order
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel::Ch0, Channel::Ch1, Channel::Ch2];

    /// Channel from its index (0-2)
    pub const fn from_index(index: u8) -> Option<Channel> {
        match index {
            0 => Some(Channel::Ch0),
            1 => Some(Channel::Ch1),
            2 => Some(Channel::Ch2),
            _ => None,
        }
    }

    /// Channel index (0-2)
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-channel mask
    #[inline]
    pub const fn mask(self) -> ChannelMask {
        ChannelMask::from_bits_truncate(1 << self as u8)
    }
}

bitflags! {
    /// Set of tone channels
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ChannelMask: u8 {
        /// Channel 0
        const CH0 = 0x01;
        /// Channel 1
        const CH1 = 0x02;
        /// Channel 2
        const CH2 = 0x04;
    }
}

impl ChannelMask {
    /// Iterate over the channels in this mask, in index order
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL
            .into_iter()
            .filter(move |ch| self.contains(ch.mask()))
    }
}

impl From<Channel> for ChannelMask {
    fn from(channel: Channel) -> Self {
        channel.mask()
    }
}
