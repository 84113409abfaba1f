//! Completion interrupt outcome.
//!
//! [`InterruptOutcome`] reports what one call to
//! [`I2sExpander::on_interrupt`](crate::I2sExpander::on_interrupt) did.

// =============================================================================
// Interrupt Outcome
// =============================================================================

/// What the completion interrupt handler did.
///
/// # Example
///
/// ```ignore
/// let outcome = EXPANDER.on_interrupt();
/// if outcome.overrun() {
///     // fill task is falling behind
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptOutcome {
    /// Buffer index queued for refill
    pub completed: Option<usize>,
    /// Oldest queued index dropped to make room (refreshed to steady state
    /// unless the fill task held it)
    pub recycled: Option<usize>,
    /// `out_eof` was pending but named no descriptor of the ring
    pub spurious: bool,
}

impl InterruptOutcome {
    /// Nothing was queued.
    pub const fn idle() -> Self {
        Self {
            completed: None,
            recycled: None,
            spurious: false,
        }
    }

    /// A completion found the queue full.
    #[inline]
    pub fn overrun(&self) -> bool {
        self.recycled.is_some()
    }

    /// A buffer was queued.
    #[inline]
    pub fn is_completion(&self) -> bool {
        self.completed.is_some()
    }
}
