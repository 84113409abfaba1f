//! DMA ring pairing the descriptor chain with its sample buffers.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use super::descriptor::Descriptor;
use super::ring::DescriptorRing;
use crate::internal::constants::{NO_BUFFER, SAMPLE_SIZE};

/// One DMA buffer of `SAMPLES` 32-bit samples.
///
/// Written by exactly one party at a time: the fill task for the buffer it
/// holds, otherwise the interrupt handler or a reset with the hardware lock.
#[repr(C, align(4))]
pub struct SampleBuffer<const SAMPLES: usize> {
    words: UnsafeCell<[u32; SAMPLES]>,
}

// SAFETY: ownership of each buffer is arbitrated by the held marker in
// `DmaRing` and by the completion queue lock; the DMA engine only reads.
unsafe impl<const SAMPLES: usize> Sync for SampleBuffer<SAMPLES> {}

impl<const SAMPLES: usize> SampleBuffer<SAMPLES> {
    /// Create a zeroed buffer. Const-compatible.
    pub const fn new() -> Self {
        Self {
            words: UnsafeCell::new([0; SAMPLES]),
        }
    }

    #[inline(always)]
    fn as_ptr(&self) -> *const u32 {
        self.words.get() as *const u32
    }
}

impl<const SAMPLES: usize> Default for SampleBuffer<SAMPLES> {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed ring of `BUFS` descriptors, each bound to one sample buffer.
///
/// # Type Parameters
/// * `BUFS` - Number of buffers/descriptors in the ring
/// * `SAMPLES` - Samples per buffer (`SAMPLES * 4` bytes, at most 4092)
pub struct DmaRing<const BUFS: usize, const SAMPLES: usize> {
    /// Out-link descriptor chain
    ring: DescriptorRing<BUFS>,
    /// Sample buffers, one per descriptor
    buffers: [SampleBuffer<SAMPLES>; BUFS],
    /// Index of the buffer the fill task is writing, or `NO_BUFFER`
    held: AtomicUsize,
    /// Completions that found the queue full
    underflows: AtomicU32,
}

impl<const BUFS: usize, const SAMPLES: usize> DmaRing<BUFS, SAMPLES> {
    /// Byte length of one full buffer
    pub const BUFFER_LEN: usize = SAMPLES * SAMPLE_SIZE;

    /// Create an unlinked ring with zeroed buffers. Const-compatible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: DescriptorRing::new(),
            buffers: [const { SampleBuffer::new() }; BUFS],
            held: AtomicUsize::new(NO_BUFFER),
            underflows: AtomicU32::new(0),
        }
    }

    /// Total memory usage in bytes.
    #[must_use]
    pub const fn memory_usage() -> usize {
        BUFS * Descriptor::SIZE + BUFS * Self::BUFFER_LEN
    }

    /// Chain every descriptor to its buffer and close the ring.
    ///
    /// The ring must not move afterwards: descriptors hold absolute
    /// addresses of their successors and buffers.
    pub fn link(&self) {
        self.ring
            .link(Self::BUFFER_LEN, |i| self.buffers[i].as_ptr());
        self.held.store(NO_BUFFER, Ordering::Release);
    }

    /// Fill buffer `index` with `value` and mark it full length.
    pub fn prime(&self, index: usize, value: u32) {
        // SAFETY: callers prime only buffers the fill task does not hold.
        let words = unsafe { self.buffer_mut(index) };
        words.fill(value);
        self.set_length(index, SAMPLES);
    }

    /// Prime every buffer except the one currently held by the fill task.
    pub fn prime_all(&self, value: u32) {
        let held = self.held.load(Ordering::Acquire);
        for i in 0..BUFS {
            if i != held {
                self.prime(i, value);
            }
        }
    }

    /// Mutable view of buffer `index`.
    ///
    /// # Safety
    ///
    /// The caller must be the only writer of this buffer for the lifetime of
    /// the returned reference: either it holds the buffer via [`hold`] or no
    /// fill is in progress on it.
    ///
    /// [`hold`]: Self::hold
    #[allow(clippy::mut_from_ref)]
    #[inline(always)]
    pub unsafe fn buffer_mut(&self, index: usize) -> &mut [u32; SAMPLES] {
        // SAFETY: exclusivity is the caller's obligation.
        unsafe { &mut *self.buffers[index % BUFS].words.get() }
    }

    /// Copy sample `sample` of buffer `index`.
    #[cfg(test)]
    #[inline(always)]
    pub fn sample(&self, index: usize, sample: usize) -> u32 {
        // SAFETY: a single aligned word read; a concurrent writer can only
        // replace it with another complete sample.
        unsafe { core::ptr::read_volatile(self.buffers[index % BUFS].as_ptr().add(sample % SAMPLES)) }
    }

    /// Set the number of valid samples the engine streams from buffer `index`.
    #[inline(always)]
    pub fn set_length(&self, index: usize, samples: usize) {
        let samples = samples.min(SAMPLES);
        self.ring.get(index).set_length(samples * SAMPLE_SIZE);
    }

    /// Number of valid samples buffer `index` currently carries.
    #[cfg(test)]
    #[inline(always)]
    pub fn length(&self, index: usize) -> usize {
        self.ring.get(index).length() / SAMPLE_SIZE
    }

    /// Mark buffer `index` as being filled.
    #[inline(always)]
    pub fn hold(&self, index: usize) {
        self.held.store(index, Ordering::Release);
    }

    /// Clear the held marker.
    #[inline(always)]
    pub fn release(&self) {
        self.held.store(NO_BUFFER, Ordering::Release);
    }

    /// Buffer currently held by the fill task, if any.
    #[inline(always)]
    pub fn held(&self) -> Option<usize> {
        let held = self.held.load(Ordering::Acquire);
        (held != NO_BUFFER).then_some(held)
    }

    /// Count one underflow.
    #[inline(always)]
    pub fn record_underflow(&self) {
        self.underflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Completions that found every buffer still waiting to be filled.
    #[inline(always)]
    pub fn underflow_count(&self) -> u32 {
        self.underflows.load(Ordering::Relaxed)
    }

    /// Address of the first descriptor (for the out-link register).
    #[inline(always)]
    pub fn head_addr(&self) -> u32 {
        self.ring.base_addr_u32()
    }

    /// Address of descriptor `index` as the engine reports it.
    #[cfg(test)]
    #[inline(always)]
    pub fn descriptor_addr(&self, index: usize) -> u32 {
        self.ring.addr_of(index)
    }

    /// Map a reported descriptor address to its buffer index.
    #[inline(always)]
    pub fn index_of(&self, addr: u32) -> Option<usize> {
        self.ring.index_of(addr)
    }

    /// Descriptor bound to buffer `index`.
    #[cfg(test)]
    #[inline(always)]
    pub fn descriptor(&self, index: usize) -> &Descriptor {
        self.ring.get(index)
    }

    /// Start address and byte length of the sample buffer block.
    pub fn buffer_region(&self) -> (usize, usize) {
        (self.buffers.as_ptr() as usize, BUFS * Self::BUFFER_LEN)
    }

    /// Start address and byte length of the descriptor block.
    pub fn descriptor_region(&self) -> (usize, usize) {
        (self.ring.base_addr() as usize, BUFS * Descriptor::SIZE)
    }
}

impl<const BUFS: usize, const SAMPLES: usize> Default for DmaRing<BUFS, SAMPLES> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
