//! Synchronization support
//!
//! - [`CriticalSectionCell`] - ISR-safe interior mutability, one exclusion
//!   domain per cell
//! - [`AtomicWaker`] - waker storage for the async fill task (`async`
//!   feature)
//! - [`asynch`] - the completion future awaited by
//!   [`I2sExpander::run`](crate::I2sExpander::run) (`async` feature)
//!
//! The expander keeps separate cells for the hardware registers, the pulser
//! state and the completion queue. Separate cells only split the `RefCell`
//! borrows: every cell enters the same global critical section, so a long
//! borrow of one (a steady fill run) also holds off the interrupt and the
//! other core. Critical sections nest, so borrowing one cell inside another
//! is fine. The pulse-phase callback runs with none of them borrowed, so it
//! may call back into any setter.

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod asynch;
mod primitives;

#[cfg(feature = "async")]
pub use primitives::AtomicWaker;
pub use primitives::CriticalSectionCell;
