//! Linked-list DMA descriptor (`lldesc_t`) used by the I2S out-link.
//!
//! Each descriptor points to one sample buffer and to the next descriptor.
//! The engine follows the `next` chain forever, so the ring never runs dry.

pub mod bits;

use bits::dw0;

/// Volatile cell wrapper for descriptor fields
///
/// Ensures all accesses are volatile to prevent compiler optimization
/// from reordering or caching descriptor field accesses.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// Safety: VolatileCell is safe to share between threads because all access
// is through volatile operations which are atomic for u32 on ESP32.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Create a new volatile cell with the given initial value
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        // SAFETY: the pointer comes from our own UnsafeCell and is always valid.
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        // SAFETY: the pointer comes from our own UnsafeCell and is always valid.
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Update the value using a function (read-modify-write)
    #[inline(always)]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let old = self.get();
        self.set(f(old));
    }
}

/// I2S out-link descriptor (12 bytes, ESP32 `lldesc_t` layout).
#[repr(C, align(4))]
pub struct Descriptor {
    /// Size, length, offset and the SOSF/EOF/OWNER flags
    dw0: VolatileCell<u32>,
    /// Buffer address
    buf: VolatileCell<u32>,
    /// Next descriptor address
    next: VolatileCell<u32>,
}

impl Descriptor {
    /// Size of the descriptor in bytes
    pub const SIZE: usize = 12;

    /// Create a new zeroed descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dw0: VolatileCell::new(0),
            buf: VolatileCell::new(0),
            next: VolatileCell::new(0),
        }
    }

    /// Bind the descriptor to a buffer and the next link in the chain.
    ///
    /// The descriptor is handed to DMA with `eof` set so every completed
    /// buffer raises an interrupt.
    pub fn setup_chained(&self, buffer: *const u32, size: usize, next_desc: *const Descriptor) {
        self.buf.set(buffer as usize as u32);
        self.next.set(next_desc as usize as u32);
        self.dw0.set(
            dw0::OWNER
                | dw0::EOF
                | (((size as u32) << dw0::SIZE_SHIFT) & dw0::SIZE_MASK)
                | (((size as u32) << dw0::LENGTH_SHIFT) & dw0::LENGTH_MASK),
        );
    }

    /// Set the number of valid bytes the engine streams from this buffer.
    #[inline(always)]
    pub fn set_length(&self, len: usize) {
        self.dw0.update(|v| {
            (v & !dw0::LENGTH_MASK) | (((len as u32) << dw0::LENGTH_SHIFT) & dw0::LENGTH_MASK)
        });
    }

    /// Number of valid bytes currently described.
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub fn length(&self) -> usize {
        ((self.dw0.get() & dw0::LENGTH_MASK) >> dw0::LENGTH_SHIFT) as usize
    }

    /// Buffer capacity in bytes.
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub fn size(&self) -> usize {
        ((self.dw0.get() & dw0::SIZE_MASK) >> dw0::SIZE_SHIFT) as usize
    }

    /// Check if descriptor is owned by DMA.
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub fn is_owned(&self) -> bool {
        (self.dw0.get() & dw0::OWNER) != 0
    }

    /// Check if the engine raises `out_eof` after this buffer.
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub fn is_eof(&self) -> bool {
        (self.dw0.get() & dw0::EOF) != 0
    }

    /// Get buffer address.
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub fn buffer_addr(&self) -> u32 {
        self.buf.get()
    }

    /// Get next descriptor address.
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub fn next_desc_addr(&self) -> u32 {
        self.next.get()
    }

    /// Get raw word 0 for debugging.
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub fn raw_dw0(&self) -> u32 {
        self.dw0.get()
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}
