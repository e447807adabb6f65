//! buzzer-demo: drives the audio subsystem through a short scripted session
//! (looping music interrupted by sound effects) on the simulated output
//! stage, and optionally writes the result to a WAV file.
//!
//! Usage: `buzzer-demo [OUTPUT.wav] [SECONDS]`

use std::env;

use anyhow::{bail, Context};

use buzzer_synth::bank::{SoundId, StaticSoundBank};
use buzzer_synth::sim::{SimulatedHardware, SquareRenderer};
use buzzer_synth::tempo::SYSTICK_FREQUENCY;
use buzzer_synth::{AudioConfig, AudioSystem, Features, Gameplay, MusicFlags, Volume};

const SAMPLE_RATE: u32 = 44_100;
const DEFAULT_SECONDS: u32 = 8;

const THEME: SoundId = SoundId(1);
const COIN: SoundId = SoundId(10);
const THUD: SoundId = SoundId(11);

// arpeggio C4 E4 G4 C5 over a C3 / G2 bass line
static THEME_DATA: [u8; 21] = [
    0x00, 0x0b, 0x00, 0x00, 0x18, 0x03, 0x1c, 0x82, 0x1f, 0x24, 0xff, //
    0x01, 0x09, 0x00, 0x00, 0x0c, 0x0f, 0x07, 0x0f, 0xff, //
    0xff,
];
static COIN_DATA: [u8; 10] = [0x02, 0x09, 0x00, 0x00, 0x30, 0x01, 0x37, 0x03, 0xff, 0xff];
static THUD_DATA: [u8; 10] = [0x02, 0x09, 0x00, 0x00, 0x05, 0x02, 0x00, 0x04, 0xff, 0xff];

struct Args {
    output: Option<String>,
    seconds: u32,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = env::args().skip(1);
    let output = args.next();
    let seconds = match args.next() {
        Some(value) => value
            .parse()
            .with_context(|| format!("invalid duration '{value}'"))?,
        None => DEFAULT_SECONDS,
    };
    if seconds == 0 {
        bail!("duration must be at least one second");
    }
    Ok(Args { output, seconds })
}

fn demo_bank() -> anyhow::Result<StaticSoundBank> {
    let mut bank = StaticSoundBank::new();
    bank.insert(THEME, &THEME_DATA).context("theme")?;
    bank.insert(COIN, &COIN_DATA).context("coin effect")?;
    bank.insert(THUD, &THUD_DATA).context("thud effect")?;
    Ok(bank)
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config = AudioConfig::default();
    let systicks_per_game_tick = config.systicks_per_game_tick as u32;
    let pwm_top = config.pwm_top;

    let mut audio = AudioSystem::new(SimulatedHardware::new(), demo_bank()?, config)?;
    audio.set_features(Features::all());
    audio.set_volume(Volume::Level2);
    audio.start_music(THEME, MusicFlags::LOOP | MusicFlags::DELAYED);

    let game_ticks = args.seconds * SYSTICK_FREQUENCY / systicks_per_game_tick;
    let mut renderer = SquareRenderer::new(SAMPLE_RATE, pwm_top);
    let mut samples = Vec::with_capacity((args.seconds * SAMPLE_RATE) as usize);
    // samples owed to the output, in 1/SYSTICK_FREQUENCY units
    let mut sample_debt = 0u32;

    println!(
        "Rendering {} game ticks ({}s at {} Hz)...",
        game_ticks, args.seconds, SAMPLE_RATE
    );
    for tick in 0..game_ticks {
        match tick {
            40 => audio.push_effect(COIN)?,
            41 => audio.push_effect(THUD)?,
            160 => audio.push_effect(COIN)?,
            _ => {}
        }
        if tick == game_ticks / 2 {
            println!("  tick {tick}: music will stop after the current loop");
            audio.loop_music_next(None);
        }

        audio.tick(1, &Gameplay::playing((tick / 64) as u8));

        sample_debt += SAMPLE_RATE * systicks_per_game_tick;
        let count = sample_debt / SYSTICK_FREQUENCY;
        sample_debt %= SYSTICK_FREQUENCY;
        let start = samples.len();
        samples.resize(start + count as usize, 0.0);
        renderer.render(audio.driver(), &mut samples[start..]);
    }

    let peak = samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    println!("Rendered {} samples, peak {:.3}", samples.len(), peak);
    println!(
        "Final state: music {:?}, {} effects pending, tempo {:.1} BPM",
        audio.sequencer().state(),
        audio.scheduler().len(),
        audio.player().tempo().bpm()
    );

    match args.output {
        Some(path) => write_output(&path, &samples)?,
        None => println!("No output file given, nothing written."),
    }
    Ok(())
}

#[cfg(feature = "export-wav")]
fn write_output(path: &str, samples: &[f32]) -> anyhow::Result<()> {
    println!("Writing WAV file to {path}...");
    buzzer_synth::sim::wav::write_wav(path, samples, SAMPLE_RATE)
        .with_context(|| format!("failed to write {path}"))?;
    println!("Export complete!");
    Ok(())
}

#[cfg(not(feature = "export-wav"))]
fn write_output(path: &str, _samples: &[f32]) -> anyhow::Result<()> {
    eprintln!(
        "Cannot write {path}: WAV export requires the \"export-wav\" feature. Rebuild with `--features export-wav`."
    );
    Ok(())
}
