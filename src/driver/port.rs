//! Virtual port: the 32 expanded output bits.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::internal::constants::FRAME_BITS;

/// Lock-free word holding the level of every expanded pin.
///
/// Bit `n` is expanded pin `n`. Safe to touch from any context.
pub struct PortState {
    bits: AtomicU32,
}

impl PortState {
    /// Create a port with every pin low.
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(0),
        }
    }

    /// Set or clear one pin. Pins outside `0..32` are ignored.
    #[inline]
    pub fn write(&self, pin: u8, value: bool) {
        if u32::from(pin) >= FRAME_BITS {
            return;
        }
        let mask = 1u32 << pin;
        if value {
            self.bits.fetch_or(mask, Ordering::AcqRel);
        } else {
            self.bits.fetch_and(!mask, Ordering::AcqRel);
        }
    }

    /// Level of one pin. Pins outside `0..32` read low.
    #[inline]
    pub fn read(&self, pin: u8) -> bool {
        if u32::from(pin) >= FRAME_BITS {
            return false;
        }
        self.load() & (1u32 << pin) != 0
    }

    /// Whole port word.
    #[inline]
    pub fn load(&self) -> u32 {
        self.bits.load(Ordering::Acquire)
    }

    /// Replace the whole port word.
    #[inline]
    pub fn store(&self, value: u32) {
        self.bits.store(value, Ordering::Release);
    }
}

impl Default for PortState {
    fn default() -> Self {
        Self::new()
    }
}
