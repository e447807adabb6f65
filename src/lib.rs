//! Buzzer Synthesizer for a handheld game console
//!
//! Real-time audio subsystem built around three square-wave tone channels that
//! share a single pulse-width output. Each channel is clocked by its own timer
//! interrupt; foreground code schedules one-shot sound effects and sequences
//! looping music on top of them from a fixed 256 Hz system tick.
//!
//! # Features
//! - Interrupt-safe shared output register (channel activity + volume)
//! - O(1) duty-cycle lookup from a table validated at construction
//! - Compact binary track format with validation and streaming decoder
//! - Tempo-driven track player with per-channel start/stop/resume
//! - Fixed-capacity sound-effect queue with debounced start delays
//! - Music sequencer with delayed start, looping and level-based tempo
//! - Host-side simulated output stage rendering PCM samples
//!
//! # Crate feature flags
//! - `export-wav` (opt-in): WAV export in the `buzzer-demo` binary (enables `hound`)
//!
//! # Quick start
//! ```
//! use buzzer_synth::bank::{SoundId, StaticSoundBank};
//! use buzzer_synth::sim::SimulatedHardware;
//! use buzzer_synth::{AudioConfig, AudioSystem, Features, Gameplay, MusicFlags};
//!
//! static THEME: [u8; 10] = [0x00, 0x09, 0x00, 0x00, 0x18, 0x07, 0x1c, 0x07, 0xff, 0xff];
//!
//! let mut bank = StaticSoundBank::new();
//! bank.insert(SoundId(1), &THEME).unwrap();
//!
//! let mut audio =
//!     AudioSystem::new(SimulatedHardware::new(), bank, AudioConfig::default()).unwrap();
//! audio.set_features(Features::all());
//! audio.start_music(SoundId(1), MusicFlags::LOOP);
//! audio.tick(1, &Gameplay::menu());
//! assert_eq!(audio.sequencer().current(), Some(SoundId(1)));
//! ```

#![warn(missing_docs)]

pub mod bank; // Read-only sound assets
pub mod channel; // Channel identifiers and masks
pub mod config; // Tuning parameters
pub mod player; // Tempo-driven track player
pub mod scheduler; // Sound-effect queue
pub mod sequencer; // Music sequencing
pub mod sim; // Simulated output stage
pub mod system; // Tick integration
pub mod tempo; // Tempo encoding
pub mod tone; // Tone channel driver (interrupt side)
pub mod track; // Track format and decoder

use bank::SoundId;

/// Error types for audio subsystem operations
#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    /// Sound asset failed structural validation
    #[error("Invalid sound data: {0}")]
    InvalidSound(String),

    /// Sound asset id not present in the bank
    #[error("Unknown sound asset: {0}")]
    UnknownSound(SoundId),

    /// Effect queue already holds its full capacity of pending effects
    #[error("Effect queue is full ({capacity} pending)")]
    EffectQueueFull {
        /// Queue capacity
        capacity: usize,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error while reading configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration document
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for audio subsystem operations
pub type Result<T> = std::result::Result<T, AudioError>;

// Public API exports
pub use channel::{Channel, ChannelMask};
pub use config::AudioConfig;
pub use player::TrackPlayer;
pub use scheduler::EffectScheduler;
pub use sequencer::{Gameplay, MusicFlags, MusicSequencer, SequencerState};
pub use system::{AudioSystem, Features};
pub use tempo::Tempo;
pub use tone::{Note, ToneDriver, ToneHardware, Volume};
pub use track::SoundData;
