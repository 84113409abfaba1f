//! ESP32 I2S GPIO Expander
//!
//! A `no_std`, `no_alloc` driver that turns the ESP32 I2S0 transmitter into a
//! 32-bit virtual output port and a sample-accurate pulse generator.
//!
//! The I2S peripheral clocks one 32-bit word per sample out to a chain of
//! serial-in/parallel-out shift registers (74HC595 or similar). Each bit of
//! the word drives one expander output. A ring of DMA buffers keeps the
//! stream going; a fill task refills each buffer as the hardware finishes
//! with it, either with the steady port value or with pulses produced by a
//! user callback at a fixed period.
//!
//! # Architecture
//!
//! 1. **Driver** ([`driver`]): the expander, its configuration, the virtual
//!    port and the pulse-phase fill loop
//! 2. **HAL** ([`hal`]): clock divider math, pin routing and the I2S/DMA
//!    engine trait the board crate implements
//! 3. **Sync** ([`sync`]): critical-section cells shared by the interrupt,
//!    the fill task and foreground callers
//!
//! ## Data Flow
//!
//! ```text
//!   foreground ──write()──▶ PortState ──┐
//!                                       ▼
//!   I2S0 out_eof ──on_interrupt()──▶ CompletionQueue ──service()──▶ fill_buffer
//!        ▲                                                            │
//!        └────────────── DMA descriptor ring ◀── sample buffers ◀─────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use ph_esp32_i2s_expander::{ExpanderConfig, PulseWriter, SignalPins};
//!
//! ph_esp32_i2s_expander::i2s_expander_static!(EXPANDER, BoardI2s, BoardMatrix);
//!
//! EXPANDER
//!     .init(
//!         ExpanderConfig::new()
//!             .with_pins(SignalPins::new(17, 22, 21))
//!             .with_pulse_period_us(100),
//!         board_i2s,
//!         board_matrix,
//!         None,
//!     )
//!     .unwrap();
//!
//! EXPANDER.write(5, true);
//! EXPANDER.set_stepping();
//! ```
//!
//! # Memory Requirements
//!
//! With the default geometry (5 buffers of 500 samples):
//! - Sample buffers: 10000 bytes
//! - Descriptors: 60 bytes
//! - Output latency: 12 ms at 4 µs per sample
//!
//! Both must live in DMA-capable internal SRAM. The
//! [`i2s_expander_static!`] macro places the expander in `.dram1`.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

#[cfg(not(feature = "esp32"))]
compile_error!("Feature 'esp32' must be enabled. It is on by default.");

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod error;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{ExpanderConfig, PulserMode, State};
pub use driver::expander::{FillReport, I2sExpander, I2sExpanderDefault};
pub use driver::interrupt::InterruptOutcome;
pub use driver::pulser::{PulseCallback, PulsePhase, PulseWriter};
pub use error::{ConfigError, ConfigResult, Error, Result, StateError, StateResult};
pub use hal::{ClockConfig, PinRouter, SerialDmaEngine, SignalPins};

/// Shared driver constants.
pub mod constants {
    pub use crate::internal::constants::{
        // Buffer geometry
        DEFAULT_BUFFER_COUNT,
        DEFAULT_BUFFER_LEN,
        // Timing
        DEFAULT_MAX_PULSE_WIDTH_US,
        DEFAULT_OUTPUT_LATENCY_US,
        DEFAULT_PULSE_PERIOD_US,
        DEFAULT_SAMPLE_PERIOD_US,
        DEFAULT_SAMPLES_PER_BUFFER,
        DMA_MAX_BUFFER_LEN,
        // Frame format
        FRAME_BITS,
        // Clocks
        I2S_SOURCE_CLK_HZ,
        SAMPLE_SIZE,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static, ISR-safe expander instance.
///
/// The static is placed in DMA-capable memory on ESP32 so its descriptor ring
/// and sample buffers pass the reachability check in
/// [`I2sExpander::init`].
///
/// # Examples
///
/// ```ignore
/// ph_esp32_i2s_expander::i2s_expander_static!(EXPANDER, BoardI2s, BoardMatrix);
/// ph_esp32_i2s_expander::i2s_expander_static!(BIG, BoardI2s, BoardMatrix, 8, 1000);
///
/// EXPANDER.init(ExpanderConfig::new(), i2s, matrix, None).unwrap();
/// ```
#[macro_export]
macro_rules! i2s_expander_static {
    ($name:ident, $engine:ty, $router:ty) => {
        $crate::i2s_expander_static!($name, $engine, $router, 5, 500);
    };
    ($name:ident, $engine:ty, $router:ty, $bufs:expr, $samples:expr) => {
        #[cfg_attr(target_arch = "xtensa", unsafe(link_section = ".dram1"))]
        static $name: $crate::I2sExpander<$engine, $router, $bufs, $samples> =
            $crate::I2sExpander::new();
    };
}
