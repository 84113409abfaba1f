//! DMA Ring
//!
//! Statically allocated out-link ring for the I2S peripheral. All memory is
//! sized by const generics.
//!
//! # Architecture
//!
//! - [`DmaRing`]: descriptors plus sample buffers, the held marker and the
//!   underflow counter
//! - [`CompletionQueue`]: completed buffer indices waiting for the fill task
//! - Internal descriptor and ring types
//!
//! The engine streams buffers in ring order forever. Each completed buffer
//! raises one interrupt, is queued, refilled by the fill task and picked up
//! again one lap later.

mod descriptor;
mod engine;
mod queue;
mod ring;

pub use engine::DmaRing;
pub use queue::CompletionQueue;
