//! Track Player
//!
//! Advances up to three tracks (one per channel) in lock step and pushes
//! their notes into the [`ToneDriver`]. Called once per system tick; every
//! `tempo + 1` ticks all active tracks move forward by one step.
//!
//! Each channel has two flags:
//!
//! | started | playing | result                                          |
//! |---------|---------|-------------------------------------------------|
//! | no      | no      | stopped, nothing loaded                         |
//! | no      | yes     | stopped mid-track, resumes on start             |
//! | yes     | no      | started but finished (or nothing loaded)       |
//! | yes     | yes     | active: produces sound                          |
//!
//! The output stage is powered only while some channel is active and the
//! volume is not [`Volume::Off`], so idle time costs no interrupts.

use bitflags::bitflags;
use log::trace;

use crate::channel::{Channel, ChannelMask, CHANNEL_COUNT};
use crate::tempo::Tempo;
use crate::tone::{Note, ToneDriver, ToneHardware, Volume};
use crate::track::{SoundData, StepOutcome, TrackDecoder};

const PLAYING_SHIFT: u8 = 3;

bitflags! {
    /// Per-channel started/playing state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TrackFlags: u8 {
        /// Channel 0 started
        const STARTED_0 = 1 << 0;
        /// Channel 1 started
        const STARTED_1 = 1 << 1;
        /// Channel 2 started
        const STARTED_2 = 1 << 2;
        /// Channel 0 has track data left
        const PLAYING_0 = 1 << 3;
        /// Channel 1 has track data left
        const PLAYING_1 = 1 << 4;
        /// Channel 2 has track data left
        const PLAYING_2 = 1 << 5;
    }
}

impl TrackFlags {
    /// Started flags for a set of channels
    pub const fn started(mask: ChannelMask) -> Self {
        TrackFlags::from_bits_truncate(mask.bits())
    }

    /// Playing flags for a set of channels
    pub const fn playing(mask: ChannelMask) -> Self {
        TrackFlags::from_bits_truncate(mask.bits() << PLAYING_SHIFT)
    }

    /// Channels that are both started and playing
    pub fn active(self) -> ChannelMask {
        let started = self.bits() & ChannelMask::all().bits();
        let playing = self.bits() >> PLAYING_SHIFT;
        ChannelMask::from_bits_truncate(started & playing)
    }
}

/// Tempo-driven player for the three tone channels
#[derive(Debug, Clone, Default)]
pub struct TrackPlayer {
    decoders: [Option<TrackDecoder>; CHANNEL_COUNT],
    flags: TrackFlags,
    tempo: Tempo,
    countdown: u8,
}

impl TrackPlayer {
    /// Create an idle player at the default tempo
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the tracks of `sound` that fall on channels in `mask`
    ///
    /// Every channel in the mask drops what it held before. Channels with a
    /// track in the asset restart from its first note, the others are left
    /// empty. Channels outside the mask are untouched.
    pub fn load<H: ToneHardware>(
        &mut self,
        sound: &SoundData,
        mask: ChannelMask,
        driver: &ToneDriver<H>,
    ) {
        self.discard(mask);
        for track in sound.tracks() {
            if !mask.contains(track.channel.mask()) {
                continue;
            }
            self.decoders[track.channel.index()] = Some(TrackDecoder::new(track));
            self.flags.insert(TrackFlags::playing(track.channel.mask()));
        }
        self.refresh_output(driver);
    }

    /// Start (or resume) the given channels
    pub fn start<H: ToneHardware>(&mut self, mask: ChannelMask, driver: &ToneDriver<H>) {
        self.flags.insert(TrackFlags::started(mask));
        let was_enabled = driver.is_output_enabled();
        self.refresh_output(driver);
        if was_enabled {
            // otherwise refresh_output already re-issued every active note
            self.reissue_notes(mask, driver);
        }
    }

    /// Stop the given channels, keeping their position for a later start
    pub fn stop<H: ToneHardware>(&mut self, mask: ChannelMask, driver: &ToneDriver<H>) {
        self.flags.remove(TrackFlags::started(mask));
        for channel in mask.channels() {
            driver.play_note(channel, Note::NONE);
        }
        self.refresh_output(driver);
    }

    /// Stop the given channels and drop their tracks
    pub fn unload<H: ToneHardware>(&mut self, mask: ChannelMask, driver: &ToneDriver<H>) {
        self.discard(mask);
        self.stop(mask, driver);
    }

    /// Stop every channel and drop all loaded tracks
    pub fn reset<H: ToneHardware>(&mut self, driver: &ToneDriver<H>) {
        self.stop(ChannelMask::all(), driver);
        self.decoders = Default::default();
        self.flags = TrackFlags::empty();
        self.countdown = 0;
    }

    /// Whether any of the given channels still has track data to play
    pub fn is_playing(&self, mask: ChannelMask) -> bool {
        self.flags.intersects(TrackFlags::playing(mask))
    }

    /// Whether any of the given channels is producing sound
    pub fn is_active(&self, mask: ChannelMask) -> bool {
        self.flags.active().intersects(mask)
    }

    /// Raw started/playing flags
    pub fn flags(&self) -> TrackFlags {
        self.flags
    }

    /// Note currently assigned to a channel
    pub fn current_note(&self, channel: Channel) -> Note {
        self.decoders[channel.index()]
            .as_ref()
            .map_or(Note::NONE, TrackDecoder::note)
    }

    /// Change the playback tempo, effective from the next step
    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    /// Current playback tempo
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Advance by one system tick
    pub fn update<H: ToneHardware>(&mut self, driver: &ToneDriver<H>) {
        if self.countdown > 0 {
            self.countdown -= 1;
            return;
        }
        self.countdown = self.tempo.raw();
        self.step_tracks(driver);
    }

    /// Advance by several system ticks
    pub fn advance<H: ToneHardware>(&mut self, systicks: u32, driver: &ToneDriver<H>) {
        for _ in 0..systicks {
            self.update(driver);
        }
    }

    /// Power the output stage iff something is audible
    ///
    /// Called after every change of the channel flags or of the volume.
    pub fn refresh_output<H: ToneHardware>(&self, driver: &ToneDriver<H>) {
        let active = self.flags.active();
        let wanted = driver.volume() != Volume::Off && !active.is_empty();
        if wanted == driver.is_output_enabled() {
            return;
        }
        driver.enable_output(wanted);
        if wanted {
            // disabling the output stopped every channel timer
            self.reissue_notes(active, driver);
        }
    }

    fn discard(&mut self, mask: ChannelMask) {
        self.flags.remove(TrackFlags::playing(mask));
        for channel in mask.channels() {
            self.decoders[channel.index()] = None;
        }
    }

    fn reissue_notes<H: ToneHardware>(&self, mask: ChannelMask, driver: &ToneDriver<H>) {
        for channel in self.flags.active().intersection(mask).channels() {
            driver.play_note(channel, self.current_note(channel));
        }
    }

    fn step_tracks<H: ToneHardware>(&mut self, driver: &ToneDriver<H>) {
        let mut finished = false;
        for channel in self.flags.active().channels() {
            let Some(decoder) = self.decoders[channel.index()].as_mut() else {
                continue;
            };
            match decoder.step() {
                StepOutcome::Play(note) => {
                    trace!("channel {} plays note {:#04x}", channel.index(), note.index());
                    driver.play_note(channel, note);
                }
                StepOutcome::Hold => {}
                StepOutcome::End => {
                    trace!("channel {} track finished", channel.index());
                    self.flags.remove(TrackFlags::playing(channel.mask()));
                    driver.play_note(channel, Note::NONE);
                    finished = true;
                }
            }
        }
        if finished {
            self.refresh_output(driver);
        }
    }
}
