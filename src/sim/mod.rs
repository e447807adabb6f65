//! Simulated Output Stage
//!
//! Host implementation of [`ToneHardware`]: register writes are recorded in
//! a [`SimState`] instead of reaching real timers, and the [`SquareRenderer`]
//! plays the role of the channel timer interrupts to turn the driver's PWM
//! output into PCM samples.

mod renderer;
#[cfg(feature = "export-wav")]
pub mod wav;

pub use renderer::SquareRenderer;

use parking_lot::Mutex;

use crate::channel::{Channel, CHANNEL_COUNT};
use crate::tone::ToneHardware;

/// Recorded peripheral state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimState {
    /// Compare value of each running channel timer
    pub timers: [Option<u16>; CHANNEL_COUNT],
    /// Last PWM compare value written
    pub duty: u8,
    /// PWM oscillator running
    pub pwm_enabled: bool,
    /// H-bridge output stage in use
    pub hbridge_enabled: bool,
    /// Total number of PWM duty writes
    pub duty_writes: u64,
}

/// In-memory stand-in for the tone peripherals
#[derive(Debug, Default)]
pub struct SimulatedHardware {
    state: Mutex<SimState>,
}

impl SimulatedHardware {
    /// Create hardware with every timer stopped
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current register state
    pub fn snapshot(&self) -> SimState {
        *self.state.lock()
    }
}

impl ToneHardware for SimulatedHardware {
    fn load_channel_timer(&self, channel: Channel, period: u16) {
        self.state.lock().timers[channel.index()] = Some(period);
    }

    fn disable_channel_timer(&self, channel: Channel) {
        self.state.lock().timers[channel.index()] = None;
    }

    fn set_pwm_duty(&self, duty: u8) {
        let mut state = self.state.lock();
        state.duty = duty;
        state.duty_writes += 1;
    }

    fn set_pwm_enabled(&self, enabled: bool) {
        self.state.lock().pwm_enabled = enabled;
    }

    fn set_hbridge_enabled(&self, enabled: bool) {
        self.state.lock().hbridge_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_register_writes() {
        let hw = SimulatedHardware::new();
        hw.load_channel_timer(Channel::Ch2, 1000);
        hw.set_pwm_enabled(true);
        hw.set_pwm_duty(16);
        hw.set_pwm_duty(8);

        let state = hw.snapshot();
        assert_eq!(state.timers, [None, None, Some(1000)]);
        assert!(state.pwm_enabled);
        assert_eq!(state.duty, 8);
        assert_eq!(state.duty_writes, 2);

        hw.disable_channel_timer(Channel::Ch2);
        assert_eq!(hw.snapshot().timers, [None; CHANNEL_COUNT]);
    }
}
