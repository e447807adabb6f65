//! Sound-Effect Scheduler
//!
//! Effects requested by the game are queued in a small fixed-capacity ring
//! and started one at a time on the effect channel. A new effect never starts
//! on the tick it is requested: it waits a minimal delay when the channel was
//! silent, or a longer settle delay when it follows another effect, so that
//! back-to-back effects do not click.

use log::{debug, warn};

use crate::bank::{SoundBank, SoundId};
use crate::channel::Channel;
use crate::config::AudioConfig;
use crate::player::TrackPlayer;
use crate::system::Features;
use crate::tone::{ToneDriver, ToneHardware};
use crate::{AudioError, Result};

/// Default number of effects that can be pending at once
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Fixed-capacity FIFO of pending sound effects
#[derive(Debug, Clone)]
pub struct EffectScheduler<const N: usize = DEFAULT_QUEUE_CAPACITY> {
    queue: [SoundId; N],
    /// Index of the oldest pending effect
    head: usize,
    /// Index of the next free slot
    tail: usize,
    len: usize,
    /// Game ticks until the head effect starts (0 = no start scheduled)
    delay: u8,
    /// Whether the next start follows an effect that was playing
    was_playing: bool,
    minimal_delay: u8,
    settle_delay: u8,
    channel: Channel,
}

impl<const N: usize> EffectScheduler<N> {
    /// Create an empty scheduler
    pub fn new(config: &AudioConfig) -> Self {
        EffectScheduler {
            queue: [SoundId(0); N],
            head: 0,
            tail: 0,
            len: 0,
            delay: 0,
            was_playing: false,
            minimal_delay: config.effect_minimal_delay,
            settle_delay: config.effect_settle_delay,
            channel: config.effect_channel(),
        }
    }

    /// Drop every pending effect and any scheduled start
    ///
    /// An effect already playing is not interrupted.
    pub fn clear(&mut self) {
        self.head = self.tail;
        self.len = 0;
        self.delay = 0;
        self.was_playing = false;
    }

    /// Queue an effect
    ///
    /// Does nothing when sound effects are disabled.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::EffectQueueFull`] if `N` effects are already
    /// pending; the new effect is dropped and the queue is left unchanged.
    pub fn push(&mut self, id: SoundId, features: Features, player: &TrackPlayer) -> Result<()> {
        if !features.contains(Features::SOUND_EFFECTS) {
            return Ok(());
        }
        if self.len == N {
            warn!("effect queue full, dropping effect {id}");
            return Err(AudioError::EffectQueueFull { capacity: N });
        }

        self.queue[self.tail] = id;
        self.tail = (self.tail + 1) % N;
        self.len += 1;
        if player.is_active(self.channel.mask()) {
            self.was_playing = true;
        }
        Ok(())
    }

    /// Advance by `dt` game ticks
    ///
    /// Returns `true` if an effect started on this tick.
    pub fn update<H, B>(
        &mut self,
        dt: u8,
        player: &mut TrackPlayer,
        driver: &ToneDriver<H>,
        bank: &B,
    ) -> bool
    where
        H: ToneHardware,
        B: SoundBank + ?Sized,
    {
        if self.delay > 0 {
            if self.delay > dt {
                self.delay -= dt;
                return false;
            }
            self.delay = 0;
            return match self.pop() {
                Some(id) => self.start_effect(id, player, driver, bank),
                None => false,
            };
        }

        if player.is_active(self.channel.mask()) {
            return false;
        }
        if self.len == 0 {
            self.was_playing = false;
            return false;
        }
        self.delay = if self.was_playing {
            self.settle_delay
        } else {
            self.minimal_delay
        };
        false
    }

    fn pop(&mut self) -> Option<SoundId> {
        if self.len == 0 {
            return None;
        }
        let id = self.queue[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(id)
    }

    fn start_effect<H, B>(
        &mut self,
        id: SoundId,
        player: &mut TrackPlayer,
        driver: &ToneDriver<H>,
        bank: &B,
    ) -> bool
    where
        H: ToneHardware,
        B: SoundBank + ?Sized,
    {
        match bank.resolve(id) {
            Ok(sound) => {
                debug!("starting effect {id} ({} pending)", self.len);
                let mask = self.channel.mask();
                player.load(&sound, mask, driver);
                player.start(mask, driver);
                self.was_playing = true;
                true
            }
            Err(err) => {
                warn!("skipping effect: {err}");
                false
            }
        }
    }

    /// Pending effects, oldest first
    pub fn pending(&self) -> impl Iterator<Item = SoundId> + '_ {
        (0..self.len).map(move |i| self.queue[(self.head + i) % N])
    }

    /// Number of pending effects
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no effect is pending
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of pending effects
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Game ticks until the next effect starts (0 if none scheduled)
    pub fn delay(&self) -> u8 {
        self.delay
    }

    /// Whether the next start will use the settle delay
    pub fn was_playing(&self) -> bool {
        self.was_playing
    }

    /// Channel effects play on
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::StaticSoundBank;
    use crate::sim::SimulatedHardware;
    use crate::tone::DutyTable;

    static BLIP: [u8; 8] = [0x02, 0x07, 0x00, 0x00, 0x30, 0x00, 0xff, 0xff];

    fn setup() -> (
        EffectScheduler,
        TrackPlayer,
        ToneDriver<SimulatedHardware>,
        StaticSoundBank,
    ) {
        let config = AudioConfig::default();
        let mut bank = StaticSoundBank::new();
        bank.insert(SoundId(1), &BLIP).unwrap();
        bank.insert(SoundId(2), &BLIP).unwrap();
        (
            EffectScheduler::new(&config),
            TrackPlayer::new(),
            ToneDriver::new(SimulatedHardware::new(), DutyTable::default()),
            bank,
        )
    }

    #[test]
    fn test_push_disabled_is_noop() {
        let (mut scheduler, player, _, _) = setup();
        for _ in 0..10 {
            scheduler.push(SoundId(1), Features::MUSIC, &player).unwrap();
        }
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_overflow_rejects_newest() {
        let (mut scheduler, player, _, _) = setup();
        for id in 0..4 {
            scheduler.push(SoundId(id), Features::all(), &player).unwrap();
        }
        let err = scheduler.push(SoundId(9), Features::all(), &player).unwrap_err();
        assert!(matches!(err, AudioError::EffectQueueFull { capacity: 4 }));
        let pending: Vec<_> = scheduler.pending().collect();
        assert_eq!(pending, vec![SoundId(0), SoundId(1), SoundId(2), SoundId(3)]);
    }

    #[test]
    fn test_minimal_delay_from_silence() {
        let (mut scheduler, mut player, tone, bank) = setup();
        scheduler.push(SoundId(1), Features::all(), &player).unwrap();

        assert!(!scheduler.update(1, &mut player, &tone, &bank));
        assert_eq!(scheduler.delay(), 1);
        assert!(scheduler.update(1, &mut player, &tone, &bank));
        assert!(scheduler.is_empty());
        assert!(player.is_playing(Channel::Ch2.mask()));
    }

    #[test]
    fn test_unknown_effect_is_skipped() {
        let (mut scheduler, mut player, tone, bank) = setup();
        scheduler.push(SoundId(7), Features::all(), &player).unwrap();
        scheduler.update(1, &mut player, &tone, &bank);
        assert!(!scheduler.update(1, &mut player, &tone, &bank));
        assert!(scheduler.is_empty());
        assert!(!player.is_playing(Channel::Ch2.mask()));
    }

    #[test]
    fn test_clear_resets_state() {
        let (mut scheduler, mut player, tone, bank) = setup();
        scheduler.push(SoundId(1), Features::all(), &player).unwrap();
        scheduler.push(SoundId(2), Features::all(), &player).unwrap();
        scheduler.update(1, &mut player, &tone, &bank);
        scheduler.clear();
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.delay(), 0);
        assert!(!scheduler.was_playing());

        // ring indices stay usable after a clear
        scheduler.push(SoundId(2), Features::all(), &player).unwrap();
        assert_eq!(scheduler.pending().collect::<Vec<_>>(), vec![SoundId(2)]);
    }

    #[test]
    fn test_large_dt_starts_immediately() {
        let (mut scheduler, mut player, tone, bank) = setup();
        scheduler.push(SoundId(1), Features::all(), &player).unwrap();
        scheduler.update(10, &mut player, &tone, &bank);
        assert!(scheduler.update(10, &mut player, &tone, &bank));
    }
}
