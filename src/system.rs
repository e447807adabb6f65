//! Tick Integration
//!
//! [`AudioSystem`] owns the foreground side of the audio subsystem and is
//! advanced once per game tick. Within a tick the effect scheduler always
//! runs before the music sequencer, so an effect claiming the output takes
//! priority over music trying to (re)start on the same tick.

use std::sync::Arc;

use bitflags::bitflags;
use log::debug;

use crate::bank::{SoundBank, SoundId};
use crate::config::AudioConfig;
use crate::player::TrackPlayer;
use crate::scheduler::EffectScheduler;
use crate::sequencer::{Gameplay, MusicFlags, MusicSequencer};
use crate::tempo::Tempo;
use crate::tone::{ToneDriver, ToneHardware, Volume};
use crate::Result;

bitflags! {
    /// Audio features enabled in the player's options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u8 {
        /// Music
        const MUSIC = 0x01;
        /// Sound effects
        const SOUND_EFFECTS = 0x02;
    }
}

/// Audio subsystem: tone driver, track player, effect scheduler and music
/// sequencer behind one tick entry point
///
/// The tone driver is shared through an `Arc` so the channel timer
/// interrupts (or the [`crate::sim::SquareRenderer`]) can reach it while the
/// system is advanced from the foreground.
pub struct AudioSystem<H: ToneHardware, B: SoundBank> {
    driver: Arc<ToneDriver<H>>,
    bank: B,
    player: TrackPlayer,
    scheduler: EffectScheduler,
    sequencer: MusicSequencer,
    config: AudioConfig,
    features: Features,
    asleep: bool,
}

impl<H: ToneHardware, B: SoundBank> AudioSystem<H, B> {
    /// Create an audio system with all features disabled
    ///
    /// # Errors
    ///
    /// Returns [`crate::AudioError::ConfigError`] if `config` is invalid.
    pub fn new(hardware: H, bank: B, config: AudioConfig) -> Result<Self> {
        config.validate()?;
        let driver = Arc::new(ToneDriver::new(hardware, config.duty_table()?));
        let mut player = TrackPlayer::new();
        player.set_tempo(config.default_tempo());
        // the effect channel stays started; effects only need loading
        player.start(config.effect_channel().mask(), &driver);

        Ok(AudioSystem {
            driver,
            bank,
            player,
            scheduler: EffectScheduler::new(&config),
            sequencer: MusicSequencer::new(&config),
            config,
            features: Features::empty(),
            asleep: false,
        })
    }

    /// Shared tone driver (for the interrupt side)
    pub fn driver(&self) -> &Arc<ToneDriver<H>> {
        &self.driver
    }

    /// Update enabled features from the player's options
    pub fn set_features(&mut self, features: Features) {
        self.features = features;
    }

    /// Enabled features
    pub fn features(&self) -> Features {
        self.features
    }

    /// Queue a sound effect
    ///
    /// # Errors
    ///
    /// Returns [`crate::AudioError::EffectQueueFull`] if the queue is full.
    pub fn push_effect(&mut self, id: SoundId) -> Result<()> {
        self.scheduler.push(id, self.features, &self.player)
    }

    /// Drop all pending effects
    pub fn clear_effects(&mut self) {
        self.scheduler.clear();
    }

    /// Select music to play
    pub fn start_music(&mut self, id: SoundId, flags: MusicFlags) {
        self.sequencer
            .start(id, flags, self.features, &mut self.player, &self.driver);
    }

    /// Change the music played after the current one finishes
    pub fn loop_music_next(&mut self, id: Option<SoundId>) {
        self.sequencer.loop_next(id, self.features);
    }

    /// Stop music immediately
    pub fn stop_music(&mut self) {
        self.sequencer.stop(&mut self.player, &self.driver);
    }

    /// Change the global volume
    pub fn set_volume(&mut self, volume: Volume) {
        self.driver.set_volume(volume);
        self.player.refresh_output(&self.driver);
    }

    /// Current global volume
    pub fn volume(&self) -> Volume {
        self.driver.volume()
    }

    /// Force the output stage on or off
    ///
    /// The track player re-evaluates the output state on its next change,
    /// so this is mostly useful around sleep.
    pub fn enable_output(&self, enabled: bool) {
        self.driver.enable_output(enabled);
    }

    /// Recompute the music tempo from the game state and apply it
    pub fn update_tempo(&mut self, gameplay: &Gameplay) -> Tempo {
        let tempo = self.sequencer.update_tempo(gameplay);
        self.player.set_tempo(tempo);
        tempo
    }

    /// Advance the audio subsystem by `dt` game ticks
    pub fn tick(&mut self, dt: u8, gameplay: &Gameplay) {
        if self.asleep {
            return;
        }
        let effect_started =
            self.scheduler
                .update(dt, &mut self.player, &self.driver, &self.bank);
        self.sequencer.update(
            dt,
            effect_started,
            &mut self.player,
            &self.driver,
            &self.bank,
        );
        self.update_tempo(gameplay);

        let systicks = dt as u32 * self.config.systicks_per_game_tick as u32;
        self.player.advance(systicks, &self.driver);
    }

    /// Stop everything and power the output stage down
    ///
    /// Music and effects do not resume on wake.
    pub fn sleep(&mut self) {
        debug!("audio going to sleep");
        self.sequencer.stop(&mut self.player, &self.driver);
        self.scheduler.clear();
        self.player.reset(&self.driver);
        self.driver.enable_output(false);
        self.asleep = true;
    }

    /// Resume ticking after [`AudioSystem::sleep`]
    pub fn wake(&mut self) {
        debug!("audio waking up");
        self.asleep = false;
        self.player.start(self.config.effect_channel().mask(), &self.driver);
        self.player.refresh_output(&self.driver);
    }

    /// Whether the system is asleep
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Track player
    pub fn player(&self) -> &TrackPlayer {
        &self.player
    }

    /// Effect scheduler
    pub fn scheduler(&self) -> &EffectScheduler {
        &self.scheduler
    }

    /// Music sequencer
    pub fn sequencer(&self) -> &MusicSequencer {
        &self.sequencer
    }

    /// Sound bank
    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Active configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}
