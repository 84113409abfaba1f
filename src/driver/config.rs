//! Expander configuration types.

use crate::error::ConfigResult;
use crate::hal::clock::ClockConfig;
use crate::hal::pins::SignalPins;
use crate::internal::constants::{
    DEFAULT_MAX_PULSE_WIDTH_US, DEFAULT_PULSE_PERIOD_US, DEFAULT_SAMPLE_PERIOD_US,
};

/// How the fill task builds buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulserMode {
    /// Every sample mirrors the port state
    #[default]
    Passthrough,
    /// Steady samples interleaved with callback-generated pulses
    Stepping,
}

/// Expander lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Not initialized
    #[default]
    Uninitialized,
    /// Initialized, transmitter stopped, pins bit-banged
    Stopped,
    /// DMA streaming to the expander
    Running,
}

/// Expander configuration
///
/// # Example
///
/// ```ignore
/// let config = ExpanderConfig::new()
///     .with_pins(SignalPins::new(17, 22, 21))
///     .with_pulse_period_us(200)
///     .with_init_val(0x0000_0001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExpanderConfig {
    /// WS, BCK and DATA pins
    pub pins: SignalPins,
    /// Pulse-phase callback period in microseconds
    pub pulse_period_us: u32,
    /// Port state before the first write
    pub init_val: u32,
    /// Duration of one sample on the wire in microseconds
    pub sample_period_us: u32,
    /// Widest pulse a callback may emit, in microseconds
    pub max_pulse_width_us: u32,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpanderConfig {
    /// Create a configuration with default values.
    pub const fn new() -> Self {
        Self {
            pins: SignalPins::new(17, 22, 21),
            pulse_period_us: DEFAULT_PULSE_PERIOD_US,
            init_val: 0,
            sample_period_us: DEFAULT_SAMPLE_PERIOD_US,
            max_pulse_width_us: DEFAULT_MAX_PULSE_WIDTH_US,
        }
    }

    /// Set the signal pins
    #[must_use]
    pub const fn with_pins(mut self, pins: SignalPins) -> Self {
        self.pins = pins;
        self
    }

    /// Set the pulse period
    #[must_use]
    pub const fn with_pulse_period_us(mut self, period_us: u32) -> Self {
        self.pulse_period_us = period_us;
        self
    }

    /// Set the initial port state
    #[must_use]
    pub const fn with_init_val(mut self, value: u32) -> Self {
        self.init_val = value;
        self
    }

    /// Set the sample period
    #[must_use]
    pub const fn with_sample_period_us(mut self, period_us: u32) -> Self {
        self.sample_period_us = period_us;
        self
    }

    /// Set the maximum pulse width
    #[must_use]
    pub const fn with_max_pulse_width_us(mut self, width_us: u32) -> Self {
        self.max_pulse_width_us = width_us;
        self
    }

    /// Samples reserved at the tail of each buffer so one pulse never
    /// straddles two buffers.
    pub const fn safety_margin(&self) -> usize {
        if self.sample_period_us == 0 {
            return 0;
        }
        self.max_pulse_width_us.div_ceil(self.sample_period_us) as usize
    }

    /// Check the pins and derive the clock.
    pub(crate) fn validate(&self) -> ConfigResult<ClockConfig> {
        self.pins.validate()?;
        ClockConfig::from_sample_period_us(self.sample_period_us)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn defaults() {
        let config = ExpanderConfig::default();
        assert_eq!(config.pulse_period_us, 1000);
        assert_eq!(config.init_val, 0);
        assert_eq!(config.sample_period_us, 4);
        assert_eq!(config.max_pulse_width_us, 20);
        assert_eq!(config.pins, SignalPins::default());
    }

    #[test]
    fn builder_sets_fields() {
        let config = ExpanderConfig::new()
            .with_pins(SignalPins::new(4, 5, 6))
            .with_pulse_period_us(250)
            .with_init_val(0xFF)
            .with_sample_period_us(8)
            .with_max_pulse_width_us(40);
        assert_eq!(config.pins, SignalPins::new(4, 5, 6));
        assert_eq!(config.pulse_period_us, 250);
        assert_eq!(config.init_val, 0xFF);
        assert_eq!(config.sample_period_us, 8);
        assert_eq!(config.max_pulse_width_us, 40);
    }

    #[test]
    fn default_safety_margin_is_five_samples() {
        assert_eq!(ExpanderConfig::new().safety_margin(), 5);
    }

    #[test]
    fn safety_margin_rounds_up() {
        let config = ExpanderConfig::new()
            .with_sample_period_us(8)
            .with_max_pulse_width_us(20);
        assert_eq!(config.safety_margin(), 3);
    }

    #[test]
    fn validate_checks_pins_then_clock() {
        let bad_pins = ExpanderConfig::new().with_pins(SignalPins::new(1, 1, 2));
        assert_eq!(bad_pins.validate(), Err(ConfigError::InvalidPin));

        let bad_clock = ExpanderConfig::new().with_sample_period_us(1);
        assert_eq!(bad_clock.validate(), Err(ConfigError::InvalidClock));

        assert_eq!(ExpanderConfig::new().validate().unwrap().div_num, 5);
    }

    #[test]
    fn default_state_is_uninitialized() {
        assert_eq!(State::default(), State::Uninitialized);
        assert_eq!(PulserMode::default(), PulserMode::Passthrough);
    }
}
