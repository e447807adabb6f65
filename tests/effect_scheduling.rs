mod common;

use buzzer_synth::{AudioError, ChannelMask, Features};
use common::*;

#[test]
fn effects_start_in_push_order() {
    let mut audio = system();
    audio.push_effect(EFFECT_1).unwrap();
    audio.push_effect(EFFECT_2).unwrap();
    audio.push_effect(EFFECT_3).unwrap();

    tick_until(&mut audio, 500, |a| a.bank().resolved().len() == 3);
    assert_eq!(audio.bank().resolved(), vec![EFFECT_1, EFFECT_2, EFFECT_3]);
    assert!(audio.scheduler().is_empty());
}

#[test]
fn effect_into_silence_uses_minimal_delay() {
    let mut audio = system();
    audio.push_effect(EFFECT_1).unwrap();
    assert!(!audio.scheduler().was_playing());

    tick(&mut audio);
    assert_eq!(audio.scheduler().delay(), audio.config().effect_minimal_delay);
    tick(&mut audio);
    assert_eq!(audio.bank().resolved(), vec![EFFECT_1]);
    assert!(audio.player().is_active(ChannelMask::CH2));
}

#[test]
fn effect_after_effect_waits_settle_delay() {
    let mut audio = system();
    audio.push_effect(EFFECT_1).unwrap();
    tick(&mut audio);
    tick(&mut audio);
    assert!(audio.player().is_active(ChannelMask::CH2));

    // pushed while the channel is busy
    audio.push_effect(EFFECT_2).unwrap();
    assert!(audio.scheduler().was_playing());

    tick_until(&mut audio, 200, |a| !a.player().is_active(ChannelMask::CH2));
    assert_eq!(audio.bank().resolved(), vec![EFFECT_1]);

    tick(&mut audio);
    let settle = audio.config().effect_settle_delay;
    assert_eq!(audio.scheduler().delay(), settle);
    assert!(settle > audio.config().effect_minimal_delay);

    for _ in 1..settle {
        tick(&mut audio);
        assert_eq!(audio.bank().resolved(), vec![EFFECT_1]);
    }
    tick(&mut audio);
    assert_eq!(audio.bank().resolved(), vec![EFFECT_1, EFFECT_2]);
}

#[test]
fn back_to_back_effects_use_minimal_then_settle_delay() {
    let mut audio = system();
    audio.push_effect(EFFECT_1).unwrap();
    audio.push_effect(EFFECT_2).unwrap();
    let minimal = audio.config().effect_minimal_delay;
    let settle = audio.config().effect_settle_delay;

    tick(&mut audio);
    assert_eq!(audio.scheduler().delay(), minimal);
    for _ in 0..minimal {
        tick(&mut audio);
    }
    assert_eq!(audio.bank().resolved(), vec![EFFECT_1]);
    assert_eq!(audio.scheduler().len(), 1);

    tick_until(&mut audio, 200, |a| !a.player().is_active(ChannelMask::CH2));
    tick(&mut audio);
    assert_eq!(audio.scheduler().delay(), settle);
    for _ in 1..settle {
        tick(&mut audio);
    }
    assert_eq!(audio.bank().resolved(), vec![EFFECT_1]);
    tick(&mut audio);
    assert_eq!(audio.bank().resolved(), vec![EFFECT_1, EFFECT_2]);
    assert!(audio.scheduler().is_empty());
}

#[test]
fn queue_drains_back_to_silence() {
    let mut audio = system();
    audio.push_effect(EFFECT_3).unwrap();
    tick_until(&mut audio, 100, |a| a.bank().resolved().len() == 1);
    tick_until(&mut audio, 100, |a| !a.player().is_active(ChannelMask::CH2));
    tick(&mut audio);
    assert!(!audio.scheduler().was_playing());
    assert!(!audio.driver().is_output_enabled());

    // next effect is treated as coming from silence again
    audio.push_effect(EFFECT_1).unwrap();
    tick(&mut audio);
    assert_eq!(audio.scheduler().delay(), audio.config().effect_minimal_delay);
}

#[test]
fn disabled_effects_are_ignored() {
    let mut audio = system();
    audio.set_features(Features::MUSIC);
    for _ in 0..20 {
        audio.push_effect(EFFECT_1).unwrap();
    }
    assert!(audio.scheduler().is_empty());

    for _ in 0..50 {
        tick(&mut audio);
    }
    assert!(audio.bank().resolved().is_empty());
    assert_eq!(audio.scheduler().delay(), 0);
}

#[test]
fn full_queue_rejects_new_effects() {
    let mut audio = system();
    let capacity = audio.scheduler().capacity();
    for _ in 0..capacity {
        audio.push_effect(EFFECT_1).unwrap();
    }
    let err = audio.push_effect(EFFECT_2).unwrap_err();
    assert!(matches!(err, AudioError::EffectQueueFull { capacity: c } if c == capacity));
    assert!(audio.scheduler().pending().all(|id| id == EFFECT_1));
    assert_eq!(audio.scheduler().len(), capacity);
}

#[test]
fn clear_discards_pending_effects() {
    let mut audio = system();
    audio.push_effect(EFFECT_1).unwrap();
    audio.push_effect(EFFECT_2).unwrap();
    tick(&mut audio);
    audio.clear_effects();

    for _ in 0..50 {
        tick(&mut audio);
    }
    assert!(audio.bank().resolved().is_empty());
}
