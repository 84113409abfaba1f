//! Centralized Constants
//!
//! Single source of truth for the magic numbers used by the expander.
//!
//! # Organization
//!
//! - **Frame/Buffer sizes**: sample width and DMA buffer geometry
//! - **Timing**: sample period, pulse width, default pulse period
//! - **Clocks**: I2S source clock and divider limits
//! - **Memory map**: DMA-capable internal SRAM on ESP32

// =============================================================================
// Frame and Buffer Sizes
// =============================================================================

/// Bits per serial frame (one sample)
pub const FRAME_BITS: u32 = 32;

/// Bytes per sample in a DMA buffer
pub const SAMPLE_SIZE: usize = 4;

/// Largest buffer a single `lldesc_t` can describe (12-bit size field, word aligned)
pub const DMA_MAX_BUFFER_LEN: usize = 4092;

/// Default number of DMA buffers in the ring
pub const DEFAULT_BUFFER_COUNT: usize = 5;

/// Default DMA buffer length in bytes (about 2 ms of output at 4 µs per sample)
pub const DEFAULT_BUFFER_LEN: usize = 2000;

/// Default number of samples per DMA buffer
pub const DEFAULT_SAMPLES_PER_BUFFER: usize = DEFAULT_BUFFER_LEN / SAMPLE_SIZE;

// =============================================================================
// Timing Constants
// =============================================================================

/// Default duration of one sample on the wire in microseconds
pub const DEFAULT_SAMPLE_PERIOD_US: u32 = 4;

/// Default widest pulse a pulse-phase callback may emit, in microseconds
pub const DEFAULT_MAX_PULSE_WIDTH_US: u32 = 20;

/// Default pulse-phase callback period in microseconds
pub const DEFAULT_PULSE_PERIOD_US: u32 = 1000;

/// Worst-case write-to-wire delay of the default geometry (12 ms)
pub const DEFAULT_OUTPUT_LATENCY_US: u32 =
    (DEFAULT_SAMPLES_PER_BUFFER * (DEFAULT_BUFFER_COUNT + 1)) as u32 * DEFAULT_SAMPLE_PERIOD_US;

// =============================================================================
// Clock Constants
// =============================================================================

/// I2S source clock (PLL_D2_CLK) in Hz
pub const I2S_SOURCE_CLK_HZ: u32 = 160_000_000;

/// Transmit bit clock divider (fbck = fi2s / M)
pub const BCK_DIV_NUM: u8 = 2;

/// BCK cycles per sample (two 32-bit channel slots)
pub const BCK_PER_SAMPLE: u32 = 2 * FRAME_BITS;

/// Minimum integral clock divider
pub const CLKM_DIV_MIN: u32 = 2;

/// Maximum integral clock divider
pub const CLKM_DIV_MAX: u32 = 255;

// =============================================================================
// Memory Map
// =============================================================================

/// Start of DMA-capable internal data SRAM on ESP32
pub const DMA_DRAM_START: usize = 0x3FFA_E000;

/// End (exclusive) of DMA-capable internal data SRAM on ESP32
pub const DMA_DRAM_END: usize = 0x4000_0000;

// =============================================================================
// Sentinels
// =============================================================================

/// Marker for "no buffer held by the fill task"
pub const NO_BUFFER: usize = usize::MAX;

// =============================================================================
// Unit Tests
// =============================================================================
