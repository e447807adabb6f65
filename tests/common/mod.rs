#![allow(dead_code)]

use std::cell::RefCell;

use buzzer_synth::bank::{SoundBank, SoundId, StaticSoundBank};
use buzzer_synth::sim::SimulatedHardware;
use buzzer_synth::{AudioConfig, AudioSystem, Features, Gameplay, SoundData};

pub const MUSIC_A: SoundId = SoundId(1);
pub const MUSIC_B: SoundId = SoundId(2);
pub const EFFECT_1: SoundId = SoundId(10);
pub const EFFECT_2: SoundId = SoundId(11);
pub const EFFECT_3: SoundId = SoundId(12);

// channel 0, one note of 8 steps
static MUSIC_A_DATA: [u8; 8] = [0x00, 0x07, 0x00, 0x00, 0x10, 0x07, 0xff, 0xff];
// channels 0 and 1, one note of 4 steps each
static MUSIC_B_DATA: [u8; 15] = [
    0x00, 0x07, 0x00, 0x00, 0x14, 0x03, 0xff, //
    0x01, 0x07, 0x00, 0x00, 0x0c, 0x03, 0xff, 0xff,
];
// channel 2, one note of 4 steps
static EFFECT_1_DATA: [u8; 8] = [0x02, 0x07, 0x00, 0x00, 0x30, 0x03, 0xff, 0xff];
static EFFECT_2_DATA: [u8; 8] = [0x02, 0x07, 0x00, 0x00, 0x32, 0x03, 0xff, 0xff];
static EFFECT_3_DATA: [u8; 8] = [0x02, 0x07, 0x00, 0x00, 0x34, 0x01, 0xff, 0xff];

/// Bank that logs every asset lookup, i.e. every track load
pub struct RecordingBank {
    inner: StaticSoundBank,
    resolved: RefCell<Vec<SoundId>>,
}

impl RecordingBank {
    pub fn resolved(&self) -> Vec<SoundId> {
        self.resolved.borrow().clone()
    }

    pub fn count(&self, id: SoundId) -> usize {
        self.resolved.borrow().iter().filter(|&&r| r == id).count()
    }
}

impl SoundBank for RecordingBank {
    fn sound(&self, id: SoundId) -> Option<SoundData> {
        self.resolved.borrow_mut().push(id);
        self.inner.sound(id)
    }
}

pub type TestSystem = AudioSystem<SimulatedHardware, RecordingBank>;

pub fn system() -> TestSystem {
    let mut inner = StaticSoundBank::new();
    inner.insert(MUSIC_A, &MUSIC_A_DATA).unwrap();
    inner.insert(MUSIC_B, &MUSIC_B_DATA).unwrap();
    inner.insert(EFFECT_1, &EFFECT_1_DATA).unwrap();
    inner.insert(EFFECT_2, &EFFECT_2_DATA).unwrap();
    inner.insert(EFFECT_3, &EFFECT_3_DATA).unwrap();
    let bank = RecordingBank {
        inner,
        resolved: RefCell::new(Vec::new()),
    };

    let mut audio = AudioSystem::new(SimulatedHardware::new(), bank, AudioConfig::default()).unwrap();
    audio.set_features(Features::all());
    audio
}

pub fn tick(audio: &mut TestSystem) {
    audio.tick(1, &Gameplay::menu());
}

/// Tick until `done` holds, returning the number of ticks taken
pub fn tick_until(audio: &mut TestSystem, limit: u32, done: impl Fn(&TestSystem) -> bool) -> u32 {
    for ticks in 1..=limit {
        tick(audio);
        if done(audio) {
            return ticks;
        }
    }
    panic!("condition not reached within {limit} ticks");
}
