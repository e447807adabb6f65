//! Tone Channel Driver
//!
//! Three square-wave channels, each clocked by its own timer. On every
//! compare match the channel's interrupt flips its bit in the shared
//! [`OutputLevel`] register and writes the matching duty value to the PWM
//! oscillator, so the PWM output is the sum of the three square waves.
//!
//! Foreground code only decides *which* note each channel plays and at what
//! volume; the waveform itself is produced entirely from interrupt context.

pub mod duty;
pub mod hardware;
pub mod level;
pub mod notes;

pub use duty::DutyTable;
pub use hardware::ToneHardware;
pub use level::{LevelIndex, OutputLevel};
pub use notes::Note;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::channel::Channel;

/// Global volume setting
///
/// `Off` keeps tracks playing (time still advances) but the output stage
/// stays disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Volume {
    /// No sound
    Off,
    /// Quietest level
    #[default]
    Level0,
    /// Level 1
    Level1,
    /// Level 2
    Level2,
    /// Loudest level (H-bridge output)
    Level3,
}

impl Volume {
    const OFF_CODE: u8 = 0xff;

    /// Volume bits stored in the output register, `None` for `Off`
    pub const fn bits(self) -> Option<u8> {
        match self {
            Volume::Off => None,
            Volume::Level0 => Some(0),
            Volume::Level1 => Some(1),
            Volume::Level2 => Some(2),
            Volume::Level3 => Some(3),
        }
    }

    /// Byte encoding used for persisted options (`0..=3`, `0xff` for off)
    pub const fn code(self) -> u8 {
        match self.bits() {
            Some(bits) => bits,
            None => Self::OFF_CODE,
        }
    }

    /// Decode a persisted volume byte
    pub const fn from_code(code: u8) -> Option<Volume> {
        match code {
            0 => Some(Volume::Level0),
            1 => Some(Volume::Level1),
            2 => Some(Volume::Level2),
            3 => Some(Volume::Level3),
            Self::OFF_CODE => Some(Volume::Off),
            _ => None,
        }
    }

    /// One step louder, saturating at [`Volume::Level3`]
    pub const fn increase(self) -> Volume {
        match self {
            Volume::Off => Volume::Level0,
            Volume::Level0 => Volume::Level1,
            Volume::Level1 => Volume::Level2,
            Volume::Level2 | Volume::Level3 => Volume::Level3,
        }
    }

    /// One step quieter, saturating at [`Volume::Off`]
    pub const fn decrease(self) -> Volume {
        match self {
            Volume::Level3 => Volume::Level2,
            Volume::Level2 => Volume::Level1,
            Volume::Level1 => Volume::Level0,
            Volume::Level0 | Volume::Off => Volume::Off,
        }
    }

    /// Whether this level drives the speaker through the H-bridge
    pub const fn uses_hbridge(self) -> bool {
        matches!(self, Volume::Level3)
    }
}

/// Interrupt-driven three-channel tone generator
///
/// Every method takes `&self`: the driver is shared (typically as an `Arc`)
/// between the foreground tick and the channel timer interrupts.
///
/// Compare-match handlers must not preempt each other. The register toggle
/// is atomic but the duty write that follows it is a separate store, so
/// two handlers racing on different cores may leave a stale duty behind
/// until the next toggle.
#[derive(Debug)]
pub struct ToneDriver<H: ToneHardware> {
    hardware: H,
    level: OutputLevel,
    duty: DutyTable,
    volume: AtomicU8,
    output_enabled: AtomicBool,
}

impl<H: ToneHardware> ToneDriver<H> {
    /// Create a driver with output disabled at the default volume
    pub fn new(hardware: H, duty: DutyTable) -> Self {
        let volume = Volume::default();
        ToneDriver {
            hardware,
            level: OutputLevel::new(volume.bits().unwrap_or(0)),
            duty,
            volume: AtomicU8::new(volume.code()),
            output_enabled: AtomicBool::new(false),
        }
    }

    /// Underlying peripheral
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Power the output stage on or off
    ///
    /// Disabling also stops all channel timers and forces every channel's
    /// output low, so nothing can be left stuck high.
    pub fn enable_output(&self, enabled: bool) {
        self.output_enabled.store(enabled, Ordering::Release);
        if enabled {
            self.hardware.set_pwm_enabled(true);
            if self.volume().uses_hbridge() {
                self.hardware.set_hbridge_enabled(true);
            }
        } else {
            for channel in Channel::ALL {
                self.hardware.disable_channel_timer(channel);
            }
            self.hardware.set_pwm_enabled(false);
            self.hardware.set_hbridge_enabled(false);
            self.level.clear_activity();
        }
    }

    /// Whether the output stage is powered
    pub fn is_output_enabled(&self) -> bool {
        self.output_enabled.load(Ordering::Acquire)
    }

    /// Start a note on a channel, or silence it with [`Note::NONE`]
    pub fn play_note(&self, channel: Channel, note: Note) {
        match note.timer_period() {
            Some(period) => self.hardware.load_channel_timer(channel, period),
            None => {
                self.hardware.disable_channel_timer(channel);
                let index = self.level.clear_channel(channel);
                self.hardware.set_pwm_duty(self.duty.duty(index));
            }
        }
    }

    /// Change the global volume
    ///
    /// Only the volume bits of the output register change; channels keep
    /// their current phase.
    pub fn set_volume(&self, volume: Volume) {
        self.volume.store(volume.code(), Ordering::Release);
        if let Some(bits) = volume.bits() {
            self.level.set_volume_bits(bits);
        }
        self.hardware
            .set_hbridge_enabled(self.is_output_enabled() && volume.uses_hbridge());
    }

    /// Current volume setting
    pub fn volume(&self) -> Volume {
        Volume::from_code(self.volume.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Snapshot of the shared output register
    pub fn output_level(&self) -> LevelIndex {
        self.level.load()
    }

    /// Channel timer compare-match handler
    ///
    /// Runs in interrupt context: one atomic toggle and one table lookup.
    #[inline]
    pub fn on_compare_match(&self, channel: Channel) {
        let index = self.level.toggle_channel(channel);
        self.hardware.set_pwm_duty(self.duty.duty(index));
    }
}
