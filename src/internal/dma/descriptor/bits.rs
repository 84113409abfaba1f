//! `lldesc_t` bit field constants.
//!
//! Based on ESP32 TRM chapter 12 (I2S) and `rom/lldesc.h`.

// =============================================================================
// Word 0 - Size, length and flags
// =============================================================================

/// Descriptor word 0 bit field constants
pub mod dw0 {
    /// Buffer size shift (12 bits)
    pub const SIZE_SHIFT: u32 = 0;
    /// Buffer size mask
    pub const SIZE_MASK: u32 = 0xFFF;
    /// Valid data length shift (12 bits)
    pub const LENGTH_SHIFT: u32 = 12;
    /// Valid data length mask
    pub const LENGTH_MASK: u32 = 0xFFF << 12;
    /// End of frame - raises `out_eof` when the engine finishes this buffer
    pub const EOF: u32 = 1 << 30;
    /// OWN - when set, descriptor owned by DMA; when clear, owned by CPU
    pub const OWNER: u32 = 1 << 31;
}

#[cfg(test)]
mod tests {
    use super::dw0;

    #[test]
    fn fields_do_not_overlap() {
        let fields = [
            dw0::SIZE_MASK,
            dw0::LENGTH_MASK,
            dw0::EOF,
            dw0::OWNER,
        ];
        for (i, a) in fields.iter().enumerate() {
            for b in fields.iter().skip(i + 1) {
                assert_eq!(a & b, 0);
            }
        }
    }

    #[test]
    fn flags_sit_above_length() {
        assert!(dw0::LENGTH_MASK < dw0::EOF);
        assert_eq!(dw0::LENGTH_MASK >> dw0::LENGTH_SHIFT, dw0::SIZE_MASK);
    }
}
