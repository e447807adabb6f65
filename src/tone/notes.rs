//! Note Table
//!
//! Maps a note index (C2 = 0) to the compare value of the channel timer.
//! Each compare match toggles the channel output, so the timer runs at twice
//! the note frequency:
//!
//! ```text
//! count = round(TIMER_CLOCK_HZ / frequency / 2) - 1
//! ```
//!
//! Maximum error is about 0.01 semitone.

/// Clock feeding the channel timers (CPU clock after prescaler)
pub const TIMER_CLOCK_HZ: u32 = 5_000_000;

/// Timer compare values for each playable note, C2 upward
pub const TIMER_NOTES: [u16; 73] = [
    38222, 36076, 34051, 32140, 30336, 28634, 27026, 25510, 24078, 22726, 21451, 20247, //
    19110, 18038, 17025, 16070, 15168, 14316, 13513, 12754, 12038, 11363, 10725, 10123, //
    9555, 9018, 8512, 8034, 7583, 7158, 6756, 6377, 6019, 5681, 5362, 5061, //
    4777, 4509, 4256, 4017, 3791, 3578, 3377, 3188, 3009, 2840, 2680, 2530, //
    2388, 2254, 2127, 2008, 1895, 1789, 1688, 1593, 1504, 1419, 1340, 1264, //
    1193, 1126, 1063, 1003, 947, 894, 844, 796, 751, 709, 669, 632, //
    596,
];

/// Note index of A4 (440 Hz)
const A4_INDEX: i32 = 33;

/// A note to play on a tone channel, or silence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note(u8);

impl Note {
    /// "No note": silences the channel
    pub const NONE: Note = Note(0x54);

    /// Number of playable notes
    pub const COUNT: u8 = TIMER_NOTES.len() as u8;

    /// Playable note from its index, `None` if outside the table
    pub const fn new(index: u8) -> Option<Note> {
        if index < Self::COUNT {
            Some(Note(index))
        } else {
            None
        }
    }

    /// Note from a validated track byte (no range check)
    pub(crate) const fn from_raw(raw: u8) -> Note {
        Note(raw)
    }

    /// Raw note index
    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Whether this is the silence sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /// Timer compare value for this note, `None` for silence
    #[inline]
    pub fn timer_period(self) -> Option<u16> {
        TIMER_NOTES.get(self.0 as usize).copied()
    }

    /// Nominal frequency in Hz, `None` for silence
    pub fn frequency_hz(self) -> Option<f32> {
        self.timer_period()?;
        let semitones = self.0 as i32 - A4_INDEX;
        Some(440.0 * 2f32.powf(semitones as f32 / 12.0))
    }
}
