//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the expander on the
//! host without hardware access. The mocks are cheap cloneable handles over
//! shared state so a test keeps a handle after moving the mock into the
//! expander.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::boxed::Box;
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use embedded_hal::digital::PinState;

use crate::driver::pulser::{PulseCallback, PulseWriter};
use crate::hal::clock::ClockConfig;
use crate::hal::pins::{PinRouter, SignalPins};
use crate::hal::serial::SerialDmaEngine;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Leak a closure into a `'static` pulse-phase callback.
pub fn leak_callback<F>(f: F) -> PulseCallback
where
    F: FnMut(&mut PulseWriter<'_>) + Send + 'static,
{
    Box::leak(Box::new(f))
}

// =============================================================================
// Mock Serial DMA Engine
// =============================================================================

/// One recorded call into the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Configure(ClockConfig),
    ResetFifo,
    Arm(u32),
    Disarm,
    EnableInterrupt,
    Acknowledge,
}

#[derive(Debug)]
struct EngineState {
    calls: Vec<EngineCall>,
    pending: bool,
    completed: u32,
    dma_capable: bool,
}

/// Mock I2S0 engine recording every call
///
/// # Example
///
/// ```ignore
/// let engine = MockSerialEngine::new();
/// let probe = engine.clone();
/// expander.init(config, engine, router, None)?;
/// probe.complete(descriptor_addr);
/// expander.on_interrupt();
/// ```
#[derive(Debug, Clone)]
pub struct MockSerialEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MockSerialEngine {
    /// Engine whose memory checks always pass
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                calls: Vec::new(),
                pending: false,
                completed: 0,
                dma_capable: true,
            })),
        }
    }

    /// Engine that reports every region as not DMA-capable
    pub fn rejecting_dma() -> Self {
        let engine = Self::new();
        lock(&engine.state).dma_capable = false;
        engine
    }

    /// Raise `out_eof` for the descriptor at `addr`
    pub fn complete(&self, addr: u32) {
        let mut state = lock(&self.state);
        state.pending = true;
        state.completed = addr;
    }

    /// Raise an interrupt that is not `out_eof`
    pub fn raise_other(&self) {
        lock(&self.state).pending = false;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    pub fn count(&self, call: EngineCall) -> usize {
        lock(&self.state).calls.iter().filter(|c| **c == call).count()
    }

    pub fn last_arm(&self) -> Option<u32> {
        lock(&self.state).calls.iter().rev().find_map(|c| match c {
            EngineCall::Arm(addr) => Some(*addr),
            _ => None,
        })
    }

    fn record(&self, call: EngineCall) {
        lock(&self.state).calls.push(call);
    }
}

impl Default for MockSerialEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialDmaEngine for MockSerialEngine {
    fn configure(&mut self, clock: &ClockConfig) {
        self.record(EngineCall::Configure(*clock));
    }

    fn reset_fifo(&mut self) {
        self.record(EngineCall::ResetFifo);
    }

    fn arm_ring(&mut self, head_addr: u32) {
        self.record(EngineCall::Arm(head_addr));
    }

    fn disarm(&mut self) {
        self.record(EngineCall::Disarm);
    }

    fn enable_completion_interrupt(&mut self) {
        self.record(EngineCall::EnableInterrupt);
    }

    fn completion_pending(&self) -> bool {
        lock(&self.state).pending
    }

    fn completed_descriptor(&self) -> u32 {
        lock(&self.state).completed
    }

    fn acknowledge(&mut self) {
        lock(&self.state).pending = false;
        self.record(EngineCall::Acknowledge);
    }

    fn is_dma_capable(&self, _addr: usize, _len: usize) -> bool {
        lock(&self.state).dma_capable
    }
}

// =============================================================================
// Mock Pin Router
// =============================================================================

/// One recorded GPIO matrix operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterEvent {
    Attach(SignalPins),
    Detach(SignalPins),
    Level(u8, PinState),
}

/// Mock GPIO matrix recording attach/detach and pin levels
#[derive(Debug, Clone, Default)]
pub struct MockPinRouter {
    events: Arc<Mutex<Vec<RouterEvent>>>,
}

impl MockPinRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RouterEvent> {
        lock(&self.events).clone()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }

    /// Position of the first event equal to `event`
    pub fn position(&self, event: RouterEvent) -> Option<usize> {
        lock(&self.events).iter().position(|e| *e == event)
    }

    /// Recover the frames bit-banged on `pins`.
    ///
    /// A frame opens when WS goes low, samples DATA on every BCK rising edge
    /// and closes when WS goes high.
    pub fn decode_frames(&self, pins: SignalPins) -> Vec<u32> {
        let mut frames = Vec::new();
        let mut data = false;
        let mut current: Option<u32> = None;
        for event in lock(&self.events).iter() {
            let RouterEvent::Level(pin, level) = *event else {
                continue;
            };
            let high = level == PinState::High;
            if pin == pins.ws {
                if high {
                    if let Some(frame) = current.take() {
                        frames.push(frame);
                    }
                } else {
                    current = Some(0);
                }
            } else if pin == pins.data {
                data = high;
            } else if pin == pins.bck && high {
                if let Some(frame) = current.as_mut() {
                    *frame = (*frame << 1) | u32::from(data);
                }
            }
        }
        frames
    }
}

impl PinRouter for MockPinRouter {
    fn attach(&mut self, pins: SignalPins) {
        lock(&self.events).push(RouterEvent::Attach(pins));
    }

    fn detach(&mut self, pins: SignalPins) {
        lock(&self.events).push(RouterEvent::Detach(pins));
    }

    fn set_level(&mut self, pin: u8, level: PinState) {
        lock(&self.events).push(RouterEvent::Level(pin, level));
    }
}
