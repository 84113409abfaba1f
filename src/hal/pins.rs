//! Signal pins and GPIO matrix routing.
//!
//! The expander drives three outputs: WS (latch), BCK (shift clock) and
//! DATA. While running they are attached to I2S0 through the GPIO matrix.
//! While stopped they are plain GPIO outputs and [`shift_out`] bit-bangs the
//! port state so the expander outputs never go stale.

use embedded_hal::digital::PinState;

use crate::error::{ConfigError, ConfigResult};
use crate::internal::constants::FRAME_BITS;

/// Highest output-capable GPIO number on ESP32 (34..=39 are input only)
pub const MAX_OUTPUT_GPIO: u8 = 33;

/// GPIO numbers of the three serial signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalPins {
    /// Word select / latch
    pub ws: u8,
    /// Bit clock / shift clock
    pub bck: u8,
    /// Serial data
    pub data: u8,
}

impl SignalPins {
    /// Create a pin set.
    pub const fn new(ws: u8, bck: u8, data: u8) -> Self {
        Self { ws, bck, data }
    }

    /// Check that the pins are distinct output-capable GPIOs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPin`] otherwise.
    pub fn validate(&self) -> ConfigResult<()> {
        let all = [self.ws, self.bck, self.data];
        if all.iter().any(|p| *p > MAX_OUTPUT_GPIO) {
            return Err(ConfigError::InvalidPin);
        }
        if self.ws == self.bck || self.ws == self.data || self.bck == self.data {
            return Err(ConfigError::InvalidPin);
        }
        Ok(())
    }
}

impl Default for SignalPins {
    /// WS 17, BCK 22, DATA 21
    fn default() -> Self {
        Self::new(17, 22, 21)
    }
}

/// GPIO matrix access for the signal pins.
pub trait PinRouter {
    /// Route the pins to the I2S0 output signals (WS, BCK, DATA).
    fn attach(&mut self, pins: SignalPins);

    /// Return the pins to plain GPIO output mode.
    fn detach(&mut self, pins: SignalPins);

    /// Drive a detached pin.
    fn set_level(&mut self, pin: u8, level: PinState);
}

/// Bit-bang one frame, MSB first, latched on the rising edge of WS.
pub fn shift_out<R>(router: &mut R, pins: SignalPins, frame: u32)
where
    R: PinRouter + ?Sized,
{
    router.set_level(pins.ws, PinState::Low);
    for bit in (0..FRAME_BITS).rev() {
        router.set_level(pins.data, PinState::from((frame >> bit) & 1 != 0));
        router.set_level(pins.bck, PinState::High);
        router.set_level(pins.bck, PinState::Low);
    }
    router.set_level(pins.ws, PinState::High);
}
