//! Tempo Encoding
//!
//! Tempo is stored as the number of system ticks in 1/16th of a beat, minus
//! one. Higher values are slower. The encodable range runs from 3.75 BPM
//! (255) to 960 BPM (0), with less than 10% error under 200 BPM.

use serde::{Deserialize, Serialize};

/// System tick frequency in Hz
pub const SYSTICK_FREQUENCY: u32 = 256;

/// Finest beat subdivision a track can express (1/16th of a beat)
pub const SOUND_RESOLUTION: u32 = 16;

/// Encoded playback tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tempo(u8);

impl Tempo {
    /// Slowest encodable tempo
    pub const SLOWEST: Tempo = Tempo(u8::MAX);
    /// Fastest encodable tempo
    pub const FASTEST: Tempo = Tempo(0);

    /// Wrap an already-encoded tempo value
    pub const fn from_raw(raw: u8) -> Self {
        Tempo(raw)
    }

    /// Encode a tempo given in beats per minute
    ///
    /// Out-of-range values saturate to [`Tempo::FASTEST`] / [`Tempo::SLOWEST`].
    pub fn from_bpm(bpm: f32) -> Self {
        let ticks =
            (60.0 * SYSTICK_FREQUENCY as f32) / (bpm * SOUND_RESOLUTION as f32) - 0.5;
        // float -> int casts saturate; NaN maps to 0
        Tempo(ticks as u8)
    }

    /// Raw encoded value
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// System ticks per 1/16th of a beat
    #[inline]
    pub const fn ticks_per_step(self) -> u16 {
        self.0 as u16 + 1
    }

    /// Effective beats per minute
    pub fn bpm(self) -> f32 {
        (60.0 * SYSTICK_FREQUENCY as f32)
            / (self.ticks_per_step() as f32 * SOUND_RESOLUTION as f32)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        // 60 BPM
        Tempo(15)
    }
}
