//! Core driver components for the I2S expander.
//!
//! - [`config`] - Configuration types and builder
//! - [`port`] - The 32-bit virtual port
//! - [`pulser`] - Buffer filling and the pulse-phase callback
//! - [`interrupt`] - Completion interrupt outcome
//! - [`expander`] - The expander itself
//!
//! # Example
//!
//! ```ignore
//! use ph_esp32_i2s_expander::driver::{ExpanderConfig, SignalPins};
//!
//! let config = ExpanderConfig::new()
//!     .with_pins(SignalPins::new(17, 22, 21))
//!     .with_pulse_period_us(100);
//! ```

// Submodules
pub mod config;
pub mod expander;
pub mod interrupt;
pub mod port;
pub mod pulser;

// Re-exports for convenience
pub use crate::hal::pins::SignalPins;
pub use config::{ExpanderConfig, PulserMode, State};
pub use expander::{FillReport, I2sExpander, I2sExpanderDefault};
pub use interrupt::InterruptOutcome;
pub use port::PortState;
pub use pulser::{PulseCallback, PulsePhase, PulseWriter};
