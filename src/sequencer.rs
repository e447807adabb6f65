//! Music Sequencer
//!
//! Tracks the current music asset and what should play after it finishes.
//! Music never starts on the tick it is requested; it waits at least one
//! tick, or the configured music delay for [`MusicFlags::DELAYED`] starts.
//!
//! ```text
//!            start              delay elapsed
//! Stopped ----------> Delayed ----------------> Playing
//!    ^                                             |
//!    +--------- finished, no loop target ----------+
//! ```
//!
//! A finished track with a loop target reloads on the same tick and stays
//! `Playing`.

use bitflags::bitflags;
use log::{debug, warn};

use crate::bank::{SoundBank, SoundId};
use crate::channel::ChannelMask;
use crate::config::{AudioConfig, LEVEL_TEMPO_COUNT};
use crate::player::TrackPlayer;
use crate::system::Features;
use crate::tempo::Tempo;
use crate::tone::{ToneDriver, ToneHardware};

bitflags! {
    /// Options for [`MusicSequencer::start`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MusicFlags: u8 {
        /// Play the music again each time it finishes
        const LOOP = 0x01;
        /// Wait the configured music start delay
        const DELAYED = 0x02;
    }
}

/// Game state consulted for the music tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gameplay {
    /// Whether a game is being played (as opposed to menus)
    pub in_play: bool,
    /// Current level, starting at 0
    pub level: u8,
}

impl Gameplay {
    /// Outside of gameplay (menus, pause screen)
    pub const fn menu() -> Self {
        Gameplay {
            in_play: false,
            level: 0,
        }
    }

    /// Playing at the given level
    pub const fn playing(level: u8) -> Self {
        Gameplay {
            in_play: true,
            level,
        }
    }
}

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// No music
    Stopped,
    /// Music selected, waiting for its start delay
    Delayed,
    /// Music tracks loaded
    Playing,
}

/// Music playback state for the music channels
#[derive(Debug, Clone)]
pub struct MusicSequencer {
    current: Option<SoundId>,
    loop_target: Option<SoundId>,
    start_delay: u8,
    music_delay: u8,
    channels: ChannelMask,
    level_tempo: [u8; LEVEL_TEMPO_COUNT],
    default_tempo: Tempo,
}

impl MusicSequencer {
    /// Create a stopped sequencer
    pub fn new(config: &AudioConfig) -> Self {
        MusicSequencer {
            current: None,
            loop_target: None,
            start_delay: 0,
            // a delayed start still has to wait at least one tick
            music_delay: config.music_start_delay.max(1),
            channels: config.music_channel_mask(),
            level_tempo: config.level_tempo,
            default_tempo: config.default_tempo(),
        }
    }

    /// Select new music
    ///
    /// Does nothing if music is disabled or `id` is already the current
    /// music. Otherwise the music channels are unloaded and `id` starts after
    /// its delay.
    pub fn start<H: ToneHardware>(
        &mut self,
        id: SoundId,
        flags: MusicFlags,
        features: Features,
        player: &mut TrackPlayer,
        driver: &ToneDriver<H>,
    ) {
        if !features.contains(Features::MUSIC) || self.current == Some(id) {
            return;
        }
        player.unload(self.channels, driver);
        self.current = Some(id);
        self.start_delay = if flags.contains(MusicFlags::DELAYED) {
            self.music_delay
        } else {
            1
        };
        self.loop_target = flags.contains(MusicFlags::LOOP).then_some(id);
        debug!(
            "music {id} selected, starting in {} ticks{}",
            self.start_delay,
            if self.loop_target.is_some() { " (looping)" } else { "" }
        );
    }

    /// Change what plays once the current music finishes
    pub fn loop_next(&mut self, id: Option<SoundId>, features: Features) {
        if features.contains(Features::MUSIC) {
            self.loop_target = id;
        }
    }

    /// Silence music immediately and forget current and loop music
    pub fn stop<H: ToneHardware>(&mut self, player: &mut TrackPlayer, driver: &ToneDriver<H>) {
        player.unload(self.channels, driver);
        self.current = None;
        self.loop_target = None;
        self.start_delay = 0;
    }

    /// Advance by `dt` game ticks
    ///
    /// `yield_to_effect` is set when a sound effect started earlier in the
    /// same tick; music then waits one more tick instead of loading.
    pub fn update<H, B>(
        &mut self,
        dt: u8,
        yield_to_effect: bool,
        player: &mut TrackPlayer,
        driver: &ToneDriver<H>,
        bank: &B,
    ) where
        H: ToneHardware,
        B: SoundBank + ?Sized,
    {
        if self.start_delay > 0 {
            if self.start_delay > dt {
                self.start_delay -= dt;
                return;
            }
            if yield_to_effect {
                self.start_delay = 1;
                return;
            }
            self.start_delay = 0;
        } else if !player.is_playing(self.channels) {
            // finished, or never started
            let Some(next) = self.loop_target else {
                self.current = None;
                return;
            };
            if yield_to_effect {
                return;
            }
            if self.current != Some(next) {
                debug!("music switching to {next}");
            }
            self.current = Some(next);
        } else {
            return;
        }

        let Some(id) = self.current else {
            return;
        };
        match bank.resolve(id) {
            Ok(sound) => {
                player.load(&sound, self.channels, driver);
                player.start(self.channels, driver);
            }
            Err(err) => {
                warn!("cannot play music: {err}");
                self.current = None;
                self.loop_target = None;
            }
        }
    }

    /// Music tempo for the current game state
    ///
    /// During gameplay the tempo rises with the level, up to the last entry
    /// of the level table.
    pub fn update_tempo(&self, gameplay: &Gameplay) -> Tempo {
        if gameplay.in_play {
            let level = (gameplay.level as usize).min(LEVEL_TEMPO_COUNT - 1);
            Tempo::from_raw(self.level_tempo[level])
        } else {
            self.default_tempo
        }
    }

    /// Current sequencer state
    pub fn state(&self) -> SequencerState {
        match (self.current, self.start_delay) {
            (None, _) => SequencerState::Stopped,
            (Some(_), 0) => SequencerState::Playing,
            (Some(_), _) => SequencerState::Delayed,
        }
    }

    /// Music currently selected
    pub fn current(&self) -> Option<SoundId> {
        self.current
    }

    /// Music to play after the current one finishes
    pub fn loop_target(&self) -> Option<SoundId> {
        self.loop_target
    }

    /// Ticks left before the current music loads
    pub fn start_delay(&self) -> u8 {
        self.start_delay
    }

    /// Channels used by music
    pub fn channels(&self) -> ChannelMask {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::StaticSoundBank;
    use crate::sim::SimulatedHardware;
    use crate::tone::DutyTable;

    static SONG: [u8; 8] = [0x00, 0x07, 0x00, 0x00, 0x10, 0x02, 0xff, 0xff];

    struct Rig {
        sequencer: MusicSequencer,
        player: TrackPlayer,
        tone: ToneDriver<SimulatedHardware>,
        bank: StaticSoundBank,
    }

    impl Rig {
        fn new() -> Self {
            let config = AudioConfig::default();
            let mut bank = StaticSoundBank::new();
            bank.insert(SoundId(1), &SONG).unwrap();
            Rig {
                sequencer: MusicSequencer::new(&config),
                player: TrackPlayer::new(),
                tone: ToneDriver::new(SimulatedHardware::new(), DutyTable::default()),
                bank,
            }
        }

        fn start(&mut self, id: u16, flags: MusicFlags) {
            self.sequencer
                .start(SoundId(id), flags, Features::all(), &mut self.player, &self.tone);
        }

        fn update(&mut self, yield_to_effect: bool) {
            self.sequencer
                .update(1, yield_to_effect, &mut self.player, &self.tone, &self.bank);
        }
    }

    #[test]
    fn test_start_always_waits_a_tick() {
        let mut rig = Rig::new();
        rig.start(1, MusicFlags::empty());
        assert_eq!(rig.sequencer.state(), SequencerState::Delayed);
        assert_eq!(rig.sequencer.start_delay(), 1);
        rig.update(false);
        assert_eq!(rig.sequencer.state(), SequencerState::Playing);
        assert!(rig.player.is_active(ChannelMask::CH0));
    }

    #[test]
    fn test_delayed_start() {
        let mut rig = Rig::new();
        rig.start(1, MusicFlags::DELAYED);
        assert_eq!(rig.sequencer.start_delay(), 32);
        for _ in 0..31 {
            rig.update(false);
        }
        assert_eq!(rig.sequencer.state(), SequencerState::Delayed);
        rig.update(false);
        assert_eq!(rig.sequencer.state(), SequencerState::Playing);
    }

    #[test]
    fn test_music_disabled() {
        let mut rig = Rig::new();
        rig.sequencer
            .start(SoundId(1), MusicFlags::LOOP, Features::SOUND_EFFECTS, &mut rig.player, &rig.tone);
        assert_eq!(rig.sequencer.state(), SequencerState::Stopped);
        rig.sequencer.loop_next(Some(SoundId(1)), Features::empty());
        assert_eq!(rig.sequencer.loop_target(), None);
    }

    #[test]
    fn test_yields_to_effect() {
        let mut rig = Rig::new();
        rig.start(1, MusicFlags::empty());
        rig.update(true);
        assert_eq!(rig.sequencer.state(), SequencerState::Delayed);
        assert!(!rig.player.is_playing(ChannelMask::CH0));
        rig.update(false);
        assert_eq!(rig.sequencer.state(), SequencerState::Playing);
    }

    #[test]
    fn test_unknown_music_stops() {
        let mut rig = Rig::new();
        rig.start(5, MusicFlags::LOOP);
        rig.update(false);
        assert_eq!(rig.sequencer.state(), SequencerState::Stopped);
        assert_eq!(rig.sequencer.loop_target(), None);
    }

    #[test]
    fn test_level_tempo_clamped() {
        let rig = Rig::new();
        let last = rig.sequencer.update_tempo(&Gameplay::playing(20));
        assert_eq!(rig.sequencer.update_tempo(&Gameplay::playing(200)), last);
        assert_eq!(rig.sequencer.update_tempo(&Gameplay::menu()), Tempo::from_bpm(60.0));
    }
}
