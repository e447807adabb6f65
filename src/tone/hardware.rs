//! Tone hardware abstraction
//!
//! The driver never touches peripheral registers directly; it goes through
//! this trait so the same code runs against the microcontroller timers or the
//! host simulation in [`crate::sim`].

use crate::channel::Channel;

/// Peripheral interface used by [`super::ToneDriver`]
///
/// Implementations are called from both foreground and interrupt context and
/// must therefore be usable through a shared reference. Each method is a
/// single register write on real hardware.
///
/// # Example
///
/// ```
/// use buzzer_synth::sim::SimulatedHardware;
/// use buzzer_synth::{Channel, ToneHardware};
///
/// let hw = SimulatedHardware::new();
/// hw.load_channel_timer(Channel::Ch0, 5681); // A4
/// assert_eq!(hw.snapshot().timers[0], Some(5681));
/// ```
pub trait ToneHardware: Send + Sync {
    /// Load a channel timer's compare value and start it
    fn load_channel_timer(&self, channel: Channel, period: u16);

    /// Stop a channel timer (no more compare-match interrupts)
    fn disable_channel_timer(&self, channel: Channel);

    /// Write the shared PWM compare value
    fn set_pwm_duty(&self, duty: u8);

    /// Start or stop the shared PWM oscillator
    fn set_pwm_enabled(&self, enabled: bool);

    /// Route the output through the H-bridge (loudest volume only)
    fn set_hbridge_enabled(&self, enabled: bool);
}
