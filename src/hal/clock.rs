//! Clock Configuration HAL
//!
//! Derives the I2S0 transmit clock dividers from the wanted sample period.
//!
//! The transmitter runs from PLL_D2_CLK (160 MHz):
//!
//! ```text
//! fi2s = 160 MHz / (N + b/a)
//! fbck = fi2s / M            (M = 2)
//! one sample = 64 BCK cycles (two 32-bit slots)
//! ```
//!
//! so `N + b/a = 1.25 * sample_period_us`. 4 µs gives `N = 5`, 8 µs gives
//! `N = 10`, 2 µs gives `N = 2, b/a = 1/2`.

use crate::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    BCK_DIV_NUM, BCK_PER_SAMPLE, CLKM_DIV_MAX, CLKM_DIV_MIN, FRAME_BITS, I2S_SOURCE_CLK_HZ,
};

/// Divider settings for the I2S transmit clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    /// Integral divider N (`clkm_div_num`)
    pub div_num: u8,
    /// Fractional numerator b (`clkm_div_b`), 0 when integral
    pub div_b: u8,
    /// Fractional denominator a (`clkm_div_a`), 0 when integral
    pub div_a: u8,
    /// Transmit bit clock divider M (`tx_bck_div_num`)
    pub bck_div: u8,
    /// Bits per channel slot (`tx_bits_mod`)
    pub bits: u8,
}

impl ClockConfig {
    /// Compute the dividers for one sample every `sample_period_us`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidClock`] when N falls outside `2..=255`.
    pub fn from_sample_period_us(sample_period_us: u32) -> ConfigResult<Self> {
        // N + b/a in quarters
        let quarters = sample_period_us
            .checked_mul(5)
            .ok_or(ConfigError::InvalidClock)?;
        let div_num = quarters / 4;
        if !(CLKM_DIV_MIN..=CLKM_DIV_MAX).contains(&div_num) {
            return Err(ConfigError::InvalidClock);
        }

        let rem = quarters % 4;
        let (div_b, div_a) = if rem == 0 {
            (0, 0)
        } else {
            let g = gcd(rem, 4);
            (rem / g, 4 / g)
        };

        Ok(Self {
            div_num: div_num as u8,
            div_b: div_b as u8,
            div_a: div_a as u8,
            bck_div: BCK_DIV_NUM,
            bits: FRAME_BITS as u8,
        })
    }

    /// Effective divider `N + b/a` as a (numerator, denominator) pair.
    fn divider(&self) -> (u64, u64) {
        let n = u64::from(self.div_num);
        if self.div_a == 0 {
            (n, 1)
        } else {
            let a = u64::from(self.div_a);
            (n * a + u64::from(self.div_b), a)
        }
    }

    /// Bit clock frequency in Hz (rounded down).
    pub fn bck_hz(&self) -> u32 {
        let (num, den) = self.divider();
        (u64::from(I2S_SOURCE_CLK_HZ) * den / (num * u64::from(self.bck_div))) as u32
    }

    /// Duration of one sample on the wire in nanoseconds.
    pub fn sample_period_ns(&self) -> u32 {
        let (num, den) = self.divider();
        let ticks = u64::from(BCK_PER_SAMPLE) * u64::from(self.bck_div) * num;
        (ticks * 1_000_000_000 / (u64::from(I2S_SOURCE_CLK_HZ) * den)) as u32
    }
}

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_microseconds_is_integral_five() {
        let clk = ClockConfig::from_sample_period_us(4).unwrap();
        assert_eq!(clk.div_num, 5);
        assert_eq!((clk.div_b, clk.div_a), (0, 0));
        assert_eq!(clk.bck_div, 2);
        assert_eq!(clk.bits, 32);
        assert_eq!(clk.sample_period_ns(), 4000);
        assert_eq!(clk.bck_hz(), 16_000_000);
    }

    #[test]
    fn eight_microseconds_is_integral_ten() {
        let clk = ClockConfig::from_sample_period_us(8).unwrap();
        assert_eq!(clk.div_num, 10);
        assert_eq!(clk.sample_period_ns(), 8000);
    }

    #[test]
    fn two_microseconds_uses_half_fraction() {
        let clk = ClockConfig::from_sample_period_us(2).unwrap();
        assert_eq!(clk.div_num, 2);
        assert_eq!((clk.div_b, clk.div_a), (1, 2));
        assert_eq!(clk.sample_period_ns(), 2000);
    }

    #[test]
    fn three_microseconds_uses_quarter_fraction() {
        let clk = ClockConfig::from_sample_period_us(3).unwrap();
        assert_eq!(clk.div_num, 3);
        assert_eq!((clk.div_b, clk.div_a), (3, 4));
        assert_eq!(clk.sample_period_ns(), 3000);
    }

    #[test]
    fn divider_range_is_enforced() {
        assert_eq!(
            ClockConfig::from_sample_period_us(0),
            Err(ConfigError::InvalidClock)
        );
        assert_eq!(
            ClockConfig::from_sample_period_us(1),
            Err(ConfigError::InvalidClock)
        );
        assert_eq!(ClockConfig::from_sample_period_us(204).unwrap().div_num, 255);
        assert_eq!(
            ClockConfig::from_sample_period_us(205),
            Err(ConfigError::InvalidClock)
        );
        assert_eq!(
            ClockConfig::from_sample_period_us(u32::MAX),
            Err(ConfigError::InvalidClock)
        );
    }

    #[test]
    fn gcd_reduces() {
        assert_eq!(gcd(2, 4), 2);
        assert_eq!(gcd(3, 4), 1);
        assert_eq!(gcd(4, 4), 4);
    }
}
