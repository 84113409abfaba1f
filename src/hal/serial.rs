//! Serial DMA engine abstraction.
//!
//! The expander never touches I2S registers itself. A board support crate
//! implements [`SerialDmaEngine`] over I2S0 (`conf`, `fifo_conf`,
//! `out_link`, `lc_conf`, `int_*`) and hands it to
//! [`I2sExpander::init`](crate::I2sExpander::init).

use super::clock::ClockConfig;

/// Transmit side of a serial peripheral fed by a descriptor ring.
///
/// All methods are called with the expander's hardware lock held.
pub trait SerialDmaEngine {
    /// Program clock dividers, 32-bit MSB-first slots and the right-channel
    /// start mode used by shift-register expanders.
    fn configure(&mut self, clock: &ClockConfig);

    /// Reset the transmit FIFO and the DMA in/out state machines.
    fn reset_fifo(&mut self);

    /// Point the out-link at `head_addr`, connect DMA to the FIFO and start
    /// the transmitter.
    fn arm_ring(&mut self, head_addr: u32);

    /// Stop the out-link, disconnect DMA from the FIFO and stop the
    /// transmitter.
    fn disarm(&mut self);

    /// Enable the per-buffer completion (`out_eof`) interrupt.
    fn enable_completion_interrupt(&mut self);

    /// Whether an `out_eof` is pending.
    fn completion_pending(&self) -> bool;

    /// Address of the descriptor whose buffer finished (`out_eof_des_addr`).
    fn completed_descriptor(&self) -> u32;

    /// Clear every pending interrupt status bit.
    fn acknowledge(&mut self);

    /// Whether `len` bytes at `addr` can be read by the DMA engine.
    fn is_dma_capable(&self, addr: usize, len: usize) -> bool {
        esp32::is_dma_capable(addr, len)
    }
}

/// ESP32 memory map helpers
pub mod esp32 {
    use crate::internal::constants::{DMA_DRAM_END, DMA_DRAM_START};

    /// Whether `[addr, addr + len)` lies in DMA-capable internal SRAM.
    pub fn is_dma_capable(addr: usize, len: usize) -> bool {
        match addr.checked_add(len) {
            Some(end) => addr >= DMA_DRAM_START && end <= DMA_DRAM_END,
            None => false,
        }
    }
}
