//! PCM rendering of the simulated PWM output
//!
//! For every output sample the renderer advances each running channel timer
//! by `TIMER_CLOCK_HZ / sample_rate` counts and fires the driver's
//! compare-match handler each time a timer wraps, exactly as the hardware
//! interrupts would. The sample value is the PWM duty at that instant as a
//! fraction of the PWM top.
//!
//! That signal is unipolar (0 when every channel is low) and its mean moves
//! with the number of high channels, so a first-order high-pass centres it
//! around zero the way the speaker's coupling does:
//! `y[n] = a * (y[n-1] + x[n] - x[n-1])`.

use std::f32::consts::PI;

use super::SimulatedHardware;
use crate::channel::{Channel, CHANNEL_COUNT};
use crate::tone::notes::TIMER_CLOCK_HZ;
use crate::tone::ToneDriver;

/// High-pass corner frequency in Hz
const DC_CUTOFF_HZ: f32 = 20.0;

/// Renders a simulated tone driver to mono `f32` samples
#[derive(Debug, Clone)]
pub struct SquareRenderer {
    sample_rate: u32,
    pwm_top: u32,
    /// Timer progress scaled by the sample rate
    phase: [u64; CHANNEL_COUNT],
    /// High-pass coefficient for this sample rate
    alpha: f32,
    prev_in: f32,
    prev_out: f32,
}

impl SquareRenderer {
    /// Create a renderer for the given output rate and PWM top value
    pub fn new(sample_rate: u32, pwm_top: u8) -> Self {
        let sample_rate = sample_rate.max(1);
        let rc = 1.0 / (2.0 * PI * DC_CUTOFF_HZ);
        let dt = 1.0 / sample_rate as f32;
        SquareRenderer {
            sample_rate,
            pwm_top: (pwm_top as u32).max(1),
            phase: [0; CHANNEL_COUNT],
            alpha: rc / (rc + dt),
            prev_in: 0.0,
            prev_out: 0.0,
        }
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Produce the next sample in `[-1.0, 1.0]`
    pub fn next_sample(&mut self, driver: &ToneDriver<SimulatedHardware>) -> f32 {
        let timers = driver.hardware().snapshot().timers;
        for channel in Channel::ALL {
            let phase = &mut self.phase[channel.index()];
            let Some(period) = timers[channel.index()] else {
                *phase = 0;
                continue;
            };
            *phase += TIMER_CLOCK_HZ as u64;
            let wrap = (period as u64 + 1) * self.sample_rate as u64;
            while *phase >= wrap {
                *phase -= wrap;
                driver.on_compare_match(channel);
            }
        }

        let state = driver.hardware().snapshot();
        let level = if state.pwm_enabled {
            state.duty.min(self.pwm_top as u8) as f32 / self.pwm_top as f32
        } else {
            0.0
        };
        let out = self.alpha * (self.prev_out + level - self.prev_in);
        self.prev_in = level;
        self.prev_out = out;
        out.clamp(-1.0, 1.0)
    }

    /// Fill `out` with consecutive samples
    pub fn render(&mut self, driver: &ToneDriver<SimulatedHardware>, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(driver);
        }
    }

    /// Render `count` samples into a new buffer
    pub fn render_vec(&mut self, driver: &ToneDriver<SimulatedHardware>, count: usize) -> Vec<f32> {
        let mut samples = vec![0.0; count];
        self.render(driver, &mut samples);
        samples
    }

    /// Clear timer phases and filter history
    pub fn reset(&mut self) {
        self.phase = [0; CHANNEL_COUNT];
        self.prev_in = 0.0;
        self.prev_out = 0.0;
    }
}
