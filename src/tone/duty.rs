//! Duty Table
//!
//! Precomputed PWM compare values for every value of the shared output
//! register. The interrupt handlers only perform a lookup; all arithmetic and
//! range checking happens once, when the table is built.
//!
//! Entry for a register value:
//!
//! ```text
//! duty = (sum of weights of high channels) * VOLUME_STEPS[volume]
//! ```

use super::level::{LevelIndex, LEVEL_INDEX_COUNT};
use crate::channel::CHANNEL_COUNT;
use crate::{AudioError, Result};

/// Duty contribution of one unit of channel weight at each volume level
pub const VOLUME_STEPS: [u8; 4] = [2, 4, 8, 8];

/// Default loudness weight per channel (effects channel twice as loud)
pub const DEFAULT_CHANNEL_WEIGHTS: [u8; CHANNEL_COUNT] = [1, 1, 2];

/// Default PWM counter top value
pub const DEFAULT_PWM_TOP: u8 = 32;

/// Lookup table from output register value to PWM duty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyTable {
    levels: [u8; LEVEL_INDEX_COUNT],
}

impl DutyTable {
    /// Build a table from per-channel weights
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::ConfigError`] if any entry would exceed `pwm_top`.
    pub fn new(weights: [u8; CHANNEL_COUNT], pwm_top: u8) -> Result<Self> {
        let wide = compute(weights);
        if let Some((index, duty)) = wide
            .iter()
            .copied()
            .enumerate()
            .find(|&(_, duty)| duty > pwm_top as u16)
        {
            return Err(AudioError::ConfigError(format!(
                "duty {duty} at level index {index:#04x} exceeds PWM top {pwm_top}"
            )));
        }

        let mut levels = [0u8; LEVEL_INDEX_COUNT];
        for (slot, duty) in levels.iter_mut().zip(wide) {
            *slot = duty as u8;
        }
        Ok(DutyTable { levels })
    }

    /// Duty value for a register value
    #[inline]
    pub fn duty(&self, index: LevelIndex) -> u8 {
        self.levels[index.as_usize()]
    }

    /// Largest duty value in the table
    pub fn max_duty(&self) -> u8 {
        self.levels.iter().copied().max().unwrap_or(0)
    }
}

impl Default for DutyTable {
    fn default() -> Self {
        let mut levels = [0u8; LEVEL_INDEX_COUNT];
        for (slot, duty) in levels.iter_mut().zip(compute(DEFAULT_CHANNEL_WEIGHTS)) {
            *slot = duty as u8;
        }
        DutyTable { levels }
    }
}

fn compute(weights: [u8; CHANNEL_COUNT]) -> [u16; LEVEL_INDEX_COUNT] {
    let mut wide = [0u16; LEVEL_INDEX_COUNT];
    for (raw, slot) in wide.iter_mut().enumerate() {
        let index = LevelIndex::from_raw(raw as u8);
        let weight: u16 = index
            .activity()
            .channels()
            .map(|ch| weights[ch.index()] as u16)
            .sum();
        *slot = weight * VOLUME_STEPS[index.volume_bits() as usize] as u16;
    }
    wide
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelMask;

    #[test]
    fn test_default_table_is_valid() {
        let table = DutyTable::new(DEFAULT_CHANNEL_WEIGHTS, DEFAULT_PWM_TOP).unwrap();
        assert_eq!(table, DutyTable::default());
        assert_eq!(table.max_duty(), DEFAULT_PWM_TOP);
    }

    #[test]
    fn test_silent_entries_are_zero() {
        let table = DutyTable::default();
        for volume in 0..4 {
            assert_eq!(table.duty(LevelIndex::new(volume, ChannelMask::empty())), 0);
        }
    }

    #[test]
    fn test_reference_rows() {
        let table = DutyTable::default();
        let row = |mask| -> Vec<u8> {
            (0..4)
                .map(|volume| table.duty(LevelIndex::new(volume, mask)))
                .collect()
        };
        assert_eq!(row(ChannelMask::CH0), vec![2, 4, 8, 8]);
        assert_eq!(row(ChannelMask::CH0 | ChannelMask::CH1), vec![4, 8, 16, 16]);
        assert_eq!(row(ChannelMask::CH2), vec![4, 8, 16, 16]);
        assert_eq!(row(ChannelMask::all()), vec![8, 16, 32, 32]);
    }

    #[test]
    fn test_rejects_overflowing_weights() {
        let err = DutyTable::new([4, 4, 4], DEFAULT_PWM_TOP).unwrap_err();
        assert!(matches!(err, AudioError::ConfigError(_)));
    }

    #[test]
    fn test_more_channels_never_quieter() {
        let table = DutyTable::default();
        for volume in 0..4 {
            for bits in 0..8u8 {
                let mask = ChannelMask::from_bits_truncate(bits);
                let base = table.duty(LevelIndex::new(volume, mask));
                for extra in ChannelMask::all().difference(mask).channels() {
                    let louder = table.duty(LevelIndex::new(volume, mask | extra.mask()));
                    assert!(louder > base);
                }
            }
        }
    }
}
