//! Circular descriptor ring.
//!
//! The ring is fixed-size and closed: the last descriptor links back to the
//! first. Completed descriptors are identified by the address the engine
//! reports, so the ring also maps addresses back to indices.

use super::descriptor::Descriptor;

/// Circular descriptor ring.
pub struct DescriptorRing<const N: usize> {
    /// Array of descriptors
    pub(super) descriptors: [Descriptor; N],
}

impl<const N: usize> DescriptorRing<N> {
    /// Create a ring of zeroed descriptors. Const-compatible.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            descriptors: [const { Descriptor::new() }; N],
        }
    }

    /// Index of the descriptor following `index`, wrapping around
    #[inline(always)]
    #[must_use]
    pub const fn next_index(index: usize) -> usize {
        (index + 1) % N
    }

    /// Get a reference to a descriptor at a specific index
    #[inline(always)]
    pub fn get(&self, index: usize) -> &Descriptor {
        &self.descriptors[index % N]
    }

    /// Get the base address of the descriptor array
    #[inline(always)]
    pub fn base_addr(&self) -> *const Descriptor {
        self.descriptors.as_ptr()
    }

    /// Get the base address as u32 (for the out-link register)
    #[inline(always)]
    pub fn base_addr_u32(&self) -> u32 {
        self.descriptors.as_ptr() as usize as u32
    }

    /// Address of descriptor `index` as the engine reports it
    #[cfg(test)]
    #[inline(always)]
    pub fn addr_of(&self, index: usize) -> u32 {
        self.get(index) as *const Descriptor as usize as u32
    }

    /// Map a reported descriptor address back to its ring index.
    ///
    /// Returns `None` for addresses outside the ring or not on a
    /// descriptor boundary.
    pub fn index_of(&self, addr: u32) -> Option<usize> {
        let offset = addr.wrapping_sub(self.base_addr_u32()) as usize;
        if offset % Descriptor::SIZE != 0 {
            return None;
        }
        let index = offset / Descriptor::SIZE;
        (index < N).then_some(index)
    }

    /// Chain every descriptor to its buffer and its successor.
    ///
    /// `buffer_of(i)` yields the buffer pointer for descriptor `i`; each
    /// buffer is `size` bytes long.
    pub fn link<F>(&self, size: usize, buffer_of: F)
    where
        F: Fn(usize) -> *const u32,
    {
        for i in 0..N {
            let next = &self.descriptors[Self::next_index(i)] as *const Descriptor;
            self.descriptors[i].setup_chained(buffer_of(i), size, next);
        }
    }
}

impl<const N: usize> Default for DescriptorRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
