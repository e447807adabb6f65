//! Audio Configuration
//!
//! Tuning parameters of the audio subsystem. Every delay is expressed in
//! game ticks (the unit of `dt` passed to [`crate::AudioSystem::tick`]).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelMask, CHANNEL_COUNT};
use crate::tempo::Tempo;
use crate::tone::duty::{DEFAULT_CHANNEL_WEIGHTS, DEFAULT_PWM_TOP};
use crate::tone::DutyTable;
use crate::{AudioError, Result};

/// Number of entries in the level tempo table (levels above the last one
/// reuse it)
pub const LEVEL_TEMPO_COUNT: usize = 21;

/// 60 BPM at level 0 up to 120 BPM at level 20, 3 BPM per level as closely as
/// the encoding allows
pub const DEFAULT_LEVEL_TEMPO: [u8; LEVEL_TEMPO_COUNT] = [
    16, 15, 15, 14, 13, 13, 12, 12, 11, 11, 11, 10, 10, 10, 9, 9, 9, 9, 8, 8, 8,
];

/// Audio subsystem configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// System ticks (1/256 s) per game tick
    pub systicks_per_game_tick: u8,
    /// Start delay of music started with [`crate::MusicFlags::DELAYED`]
    pub music_start_delay: u8,
    /// Effect start delay when nothing was playing
    pub effect_minimal_delay: u8,
    /// Effect start delay after another effect
    pub effect_settle_delay: u8,
    /// Music tempo outside of gameplay, in BPM
    pub default_tempo_bpm: f32,
    /// Encoded tempo per gameplay level
    pub level_tempo: [u8; LEVEL_TEMPO_COUNT],
    /// Channels used by music tracks
    pub music_channels: ChannelMask,
    /// Channel used by sound effects
    pub effect_channel: u8,
    /// Loudness weight of each channel
    pub channel_weights: [u8; CHANNEL_COUNT],
    /// PWM counter top value (maximum duty)
    pub pwm_top: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            systicks_per_game_tick: 4,
            music_start_delay: 32,
            effect_minimal_delay: 1,
            effect_settle_delay: 8,
            default_tempo_bpm: 60.0,
            level_tempo: DEFAULT_LEVEL_TEMPO,
            music_channels: ChannelMask::CH0 | ChannelMask::CH1,
            effect_channel: 2,
            channel_weights: DEFAULT_CHANNEL_WEIGHTS,
            pwm_top: DEFAULT_PWM_TOP,
        }
    }
}

impl AudioConfig {
    /// Parse a JSON document; missing fields take their default value
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AudioConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.systicks_per_game_tick == 0 {
            return Err(AudioError::ConfigError(
                "systicks_per_game_tick must be at least 1".to_string(),
            ));
        }
        if self.effect_minimal_delay == 0 {
            return Err(AudioError::ConfigError(
                "effect_minimal_delay must be at least 1".to_string(),
            ));
        }
        if self.effect_settle_delay <= self.effect_minimal_delay {
            return Err(AudioError::ConfigError(format!(
                "effect_settle_delay ({}) must exceed effect_minimal_delay ({})",
                self.effect_settle_delay, self.effect_minimal_delay
            )));
        }
        if !(self.default_tempo_bpm.is_finite() && self.default_tempo_bpm > 0.0) {
            return Err(AudioError::ConfigError(format!(
                "default_tempo_bpm must be positive, got {}",
                self.default_tempo_bpm
            )));
        }
        if self.level_tempo.windows(2).any(|pair| pair[1] > pair[0]) {
            return Err(AudioError::ConfigError(
                "level_tempo must not slow down as the level increases".to_string(),
            ));
        }

        let effect = Channel::from_index(self.effect_channel).ok_or_else(|| {
            AudioError::ConfigError(format!("effect_channel {} out of range", self.effect_channel))
        })?;
        if self.music_channels.is_empty() {
            return Err(AudioError::ConfigError(
                "music_channels must not be empty".to_string(),
            ));
        }
        if self.music_channels.contains(effect.mask()) {
            return Err(AudioError::ConfigError(format!(
                "effect channel {} is also a music channel",
                self.effect_channel
            )));
        }

        DutyTable::new(self.channel_weights, self.pwm_top)?;
        Ok(())
    }

    /// Channels used by music
    pub fn music_channel_mask(&self) -> ChannelMask {
        self.music_channels
    }

    /// Channel used by sound effects (channel 2 if misconfigured)
    pub fn effect_channel(&self) -> Channel {
        Channel::from_index(self.effect_channel).unwrap_or(Channel::Ch2)
    }

    /// Encoded tempo used outside of gameplay
    pub fn default_tempo(&self) -> Tempo {
        Tempo::from_bpm(self.default_tempo_bpm)
    }

    /// Build the duty table for these channel weights
    pub fn duty_table(&self) -> Result<DutyTable> {
        DutyTable::new(self.channel_weights, self.pwm_top)
    }
}
