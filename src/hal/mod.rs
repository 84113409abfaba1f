//! Hardware Abstraction Layer
//!
//! The seams between the expander and the ESP32 peripherals.
//!
//! # Modules
//!
//! - [`clock`]: I2S transmit clock dividers from the sample period
//! - [`pins`]: signal pins, GPIO matrix routing and bit-bang shift-out
//! - [`serial`]: I2S0 transmit + out-link DMA engine trait
//!
//! Register programming stays outside this crate. Implement
//! [`SerialDmaEngine`] and [`PinRouter`] over your HAL's peripheral access.

pub mod clock;
pub mod pins;
pub mod serial;

// Re-export commonly used types
pub use clock::ClockConfig;
pub use pins::{PinRouter, SignalPins, shift_out};
pub use serial::SerialDmaEngine;
