//! I2S expander: DMA ring lifecycle, completion interrupt and fill task.

use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "log")]
use log::{debug, info, warn};

use super::config::{ExpanderConfig, PulserMode, State};
use super::interrupt::InterruptOutcome;
use super::port::PortState;
use super::pulser::{PulseCallback, PulserState, fill_buffer};
use crate::error::{ConfigError, Error, Result, StateError};
use crate::hal::pins::{PinRouter, SignalPins, shift_out};
use crate::hal::serial::SerialDmaEngine;
use crate::internal::constants::{DMA_MAX_BUFFER_LEN, SAMPLE_SIZE};
use crate::internal::dma::{CompletionQueue, DmaRing};
use crate::sync::CriticalSectionCell;
#[cfg(feature = "async")]
use crate::sync::{AtomicWaker, asynch::CompletionFuture};

use embedded_hal::digital::PinState;

/// One refilled buffer, as reported by [`I2sExpander::service`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FillReport {
    /// Ring index of the buffer
    pub index: usize,
    /// Mode the buffer was filled in
    pub mode: PulserMode,
    /// Samples the engine will stream from it
    pub samples: usize,
    /// Pulse-phase invocations during the fill
    pub pulses: u32,
}

/// Peripheral handles guarded by the hardware lock.
struct Hardware<E, R> {
    engine: E,
    router: R,
    pins: SignalPins,
    state: State,
}

/// I2S bitstream GPIO expander.
///
/// Streams `BUFS` buffers of `SAMPLES` 32-bit frames to a 74HC595-style
/// shift register chain. Each frame carries the level of all 32 expanded
/// pins; one frame lasts one sample period.
///
/// The expander is meant to live in a `static` (see
/// [`i2s_expander_static!`](crate::i2s_expander_static)): the descriptor ring
/// holds absolute addresses, so [`init`](Self::init) takes `&'static self`.
///
/// # Type Parameters
/// * `E` - Serial DMA engine (I2S0 transmitter + out-link)
/// * `R` - GPIO matrix router for WS, BCK and DATA
/// * `BUFS` - Number of DMA buffers (at least 2)
/// * `SAMPLES` - Samples per buffer (`SAMPLES * 4 <= 4092`)
///
/// # Example
///
/// ```ignore
/// i2s_expander_static!(EXPANDER, Esp32I2s, Esp32Matrix);
///
/// EXPANDER.init(ExpanderConfig::new(), i2s, matrix, None)?;
/// EXPANDER.write(3, true);
///
/// // From the I2S0 interrupt:
/// EXPANDER.on_interrupt();
///
/// // From the fill task:
/// EXPANDER.service_all();
/// ```
pub struct I2sExpander<E, R, const BUFS: usize, const SAMPLES: usize> {
    port: PortState,
    ring: DmaRing<BUFS, SAMPLES>,
    queue: CompletionQueue<BUFS>,
    pulser: CriticalSectionCell<PulserState>,
    hw: CriticalSectionCell<Option<Hardware<E, R>>>,
    spurious: AtomicU32,
    #[cfg(feature = "log")]
    reported_underflows: AtomicU32,
    #[cfg(feature = "async")]
    waker: AtomicWaker,
}

/// Default geometry: 5 buffers of 500 samples (2 ms each at 4 µs per sample)
pub type I2sExpanderDefault<E, R> = I2sExpander<E, R, 5, 500>;

impl<E, R, const BUFS: usize, const SAMPLES: usize> I2sExpander<E, R, BUFS, SAMPLES>
where
    E: SerialDmaEngine,
    R: PinRouter,
{
    /// Create an uninitialized expander.
    ///
    /// This is a const function suitable for static initialization.
    pub const fn new() -> Self {
        Self {
            port: PortState::new(),
            ring: DmaRing::new(),
            queue: CompletionQueue::new(),
            pulser: CriticalSectionCell::new(PulserState::new()),
            hw: CriticalSectionCell::new(None),
            spurious: AtomicU32::new(0),
            #[cfg(feature = "log")]
            reported_underflows: AtomicU32::new(0),
            #[cfg(feature = "async")]
            waker: AtomicWaker::new(),
        }
    }

    /// Total DMA memory (descriptors and buffers) in bytes.
    pub const fn memory_usage() -> usize {
        DmaRing::<BUFS, SAMPLES>::memory_usage()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Initialize the ring and start streaming.
    ///
    /// Sequence:
    /// 1. Validate geometry, pins, clock and DMA reachability
    /// 2. Program clocks, park the transmitter, detach the pins
    /// 3. Link the descriptor ring and prime every buffer with `init_val`
    /// 4. Record pulse period and callback, enable the completion interrupt
    /// 5. [`start`](Self::start)
    ///
    /// `init` owns the whole starting state. The port word becomes
    /// `init_val`, the pulser starts in [`PulserMode::Passthrough`] with
    /// `pulse_period_us`, and the callback slot holds `callback` (empty for
    /// `None`). Port, mode, period or callback set before `init` are
    /// discarded.
    ///
    /// # Errors
    /// - `AlreadyInitialized` - a previous `init` succeeded
    /// - `InvalidBufferLength` - `SAMPLES * 4 > 4092`, `SAMPLES` not larger
    ///   than the safety margin, or fewer than 2 buffers
    /// - `InvalidPin` / `InvalidClock` - see [`ExpanderConfig`]
    /// - `DmaMemoryUnavailable` - the engine cannot reach the static buffers
    pub fn init(
        &'static self,
        config: ExpanderConfig,
        engine: E,
        router: R,
        callback: Option<PulseCallback>,
    ) -> Result<()> {
        let margin = config.safety_margin();

        self.hw.with(|slot| {
            if slot.is_some() {
                return Err(Error::from(ConfigError::AlreadyInitialized));
            }

            if SAMPLES == 0
                || SAMPLES * SAMPLE_SIZE > DMA_MAX_BUFFER_LEN
                || SAMPLES <= margin
                || BUFS < 2
            {
                return Err(ConfigError::InvalidBufferLength.into());
            }

            let clock = config.validate()?;

            let (buf_addr, buf_len) = self.ring.buffer_region();
            let (desc_addr, desc_len) = self.ring.descriptor_region();
            if !engine.is_dma_capable(buf_addr, buf_len)
                || !engine.is_dma_capable(desc_addr, desc_len)
            {
                return Err(ConfigError::DmaMemoryUnavailable.into());
            }

            self.port.store(config.init_val);

            let hw = slot.insert(Hardware {
                engine,
                router,
                pins: config.pins,
                state: State::Stopped,
            });

            hw.engine.configure(&clock);
            hw.engine.disarm();
            hw.engine.acknowledge();
            hw.router.detach(hw.pins);

            self.ring.link();
            self.queue.clear();
            self.ring.prime_all(config.init_val);

            self.pulser.with(|p| {
                p.configure(
                    config.pulse_period_us,
                    config.sample_period_us,
                    margin,
                    callback,
                );
            });

            hw.engine.enable_completion_interrupt();
            self.start_locked(hw);
            Ok(())
        })?;

        #[cfg(feature = "log")]
        info!(
            "I2S expander running: {} x {} samples, {} us/sample, margin {}",
            BUFS, SAMPLES, config.sample_period_us, margin
        );

        Ok(())
    }

    /// Start streaming.
    ///
    /// Bit-bangs the current port state, attaches the pins to I2S0, resets
    /// the FIFO and arms the ring at descriptor 0. Restarts the ring when
    /// already running.
    ///
    /// # Errors
    /// - `NotInitialized` - `init` has not succeeded
    pub fn start(&self) -> Result<()> {
        self.with_hw(|hw| self.start_locked(hw))?;

        #[cfg(feature = "log")]
        debug!("I2S expander started");

        Ok(())
    }

    /// Stop streaming and hold the outputs by bit-banging the port state.
    ///
    /// # Errors
    /// - `NotInitialized` - `init` has not succeeded
    pub fn stop(&self) -> Result<()> {
        self.with_hw(|hw| self.stop_locked(hw))?;

        #[cfg(feature = "log")]
        debug!("I2S expander stopped");

        Ok(())
    }

    /// Stop, drop every queued completion, re-prime the buffers with the
    /// port state and start again.
    ///
    /// The buffer the fill task is writing, if any, keeps its contents.
    ///
    /// # Errors
    /// - `NotInitialized` - `init` has not succeeded
    pub fn reset(&self) -> Result<()> {
        self.with_hw(|hw| {
            let value = self.port.load();
            self.stop_locked(hw);
            self.queue.clear();
            self.ring.prime_all(value);
            self.start_locked(hw);
        })?;

        #[cfg(feature = "log")]
        debug!("I2S expander reset");

        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.hw
            .with_ref(|slot| slot.as_ref().map_or(State::Uninitialized, |hw| hw.state))
    }

    fn with_hw<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Hardware<E, R>) -> T,
    {
        self.hw
            .with(|slot| slot.as_mut().map(f))
            .ok_or_else(|| StateError::NotInitialized.into())
    }

    fn start_locked(&self, hw: &mut Hardware<E, R>) {
        if hw.state == State::Running {
            self.stop_locked(hw);
        }
        shift_out(&mut hw.router, hw.pins, self.port.load());
        hw.router.attach(hw.pins);
        hw.engine.reset_fifo();
        hw.engine.arm_ring(self.ring.head_addr());
        hw.engine.enable_completion_interrupt();
        hw.state = State::Running;
    }

    fn stop_locked(&self, hw: &mut Hardware<E, R>) {
        hw.engine.disarm();
        // WS low before detaching so the expander does not latch a glitch
        hw.router.set_level(hw.pins.ws, PinState::Low);
        hw.router.detach(hw.pins);
        hw.router.set_level(hw.pins.bck, PinState::Low);
        shift_out(&mut hw.router, hw.pins, self.port.load());
        hw.engine.acknowledge();
        hw.state = State::Stopped;
    }

    // =========================================================================
    // Interrupt
    // =========================================================================

    /// Completion interrupt handler body.
    ///
    /// Call from the I2S0 interrupt. Queues the completed buffer for the
    /// fill task. When the queue is full the oldest entry is dropped and its
    /// buffer rewritten with the current port state, so the output repeats
    /// the steady state instead of stale pulses. Never blocks.
    pub fn on_interrupt(&self) -> InterruptOutcome {
        let outcome = self.hw.with(|slot| {
            let Some(hw) = slot.as_mut() else {
                return InterruptOutcome::idle();
            };

            let mut outcome = InterruptOutcome::idle();
            if hw.engine.completion_pending() {
                match self.ring.index_of(hw.engine.completed_descriptor()) {
                    Some(index) => {
                        if let Some(evicted) = self.queue.push_overwriting(index) {
                            if self.ring.held() != Some(evicted) {
                                self.ring.prime(evicted, self.port.load());
                            }
                            self.ring.record_underflow();
                            outcome.recycled = Some(evicted);
                        }
                        outcome.completed = Some(index);
                    }
                    None => {
                        self.spurious.fetch_add(1, Ordering::Relaxed);
                        outcome.spurious = true;
                    }
                }
            }
            hw.engine.acknowledge();
            outcome
        });

        #[cfg(feature = "async")]
        if outcome.is_completion() {
            self.waker.wake();
        }

        outcome
    }

    // =========================================================================
    // Fill Task
    // =========================================================================

    /// Refill the oldest completed buffer, if any.
    ///
    /// Non-blocking. Returns `None` when nothing is queued.
    pub fn service(&self) -> Option<FillReport> {
        let index = self.queue.pop_claim(|i| self.ring.hold(i))?;

        // SAFETY: `index` left the queue under its lock and is published as
        // held; the interrupt and `reset` never write a held buffer.
        let samples = unsafe { self.ring.buffer_mut(index) };
        let result = fill_buffer(samples, &self.port, &self.pulser);
        self.ring.set_length(index, result.samples);
        self.ring.release();

        #[cfg(feature = "log")]
        self.report_underflows();

        Some(FillReport {
            index,
            mode: result.mode,
            samples: result.samples,
            pulses: result.pulses,
        })
    }

    /// Refill every queued buffer. Returns how many were refilled.
    pub fn service_all(&self) -> usize {
        let mut filled = 0;
        while self.service().is_some() {
            filled += 1;
        }
        filled
    }

    /// Fill task: await completions and refill buffers forever.
    #[cfg(feature = "async")]
    #[cfg_attr(docsrs, doc(cfg(feature = "async")))]
    pub async fn run(&self) -> ! {
        loop {
            CompletionFuture::new(&self.queue, &self.waker).await;
            self.service_all();
        }
    }

    #[cfg(feature = "log")]
    fn report_underflows(&self) {
        let total = self.ring.underflow_count();
        let seen = self.reported_underflows.swap(total, Ordering::Relaxed);
        if total != seen {
            warn!(
                "I2S expander underflow: {} buffer(s) repeated steady state ({} total)",
                total.wrapping_sub(seen),
                total
            );
        }
    }

    // =========================================================================
    // Port
    // =========================================================================

    /// Set or clear one expanded pin. Visible from the next sample written.
    ///
    /// Overwritten by [`init`](Self::init) when called before it.
    #[inline]
    pub fn write(&self, pin: u8, value: bool) {
        self.port.write(pin, value);
    }

    /// Level of one expanded pin.
    #[inline]
    pub fn read(&self, pin: u8) -> bool {
        self.port.read(pin)
    }

    /// Whole port word.
    #[inline]
    pub fn port(&self) -> u32 {
        self.port.load()
    }

    /// Replace the whole port word.
    ///
    /// Overwritten by [`init`](Self::init) when called before it.
    #[inline]
    pub fn write_port(&self, value: u32) {
        self.port.store(value);
    }

    // =========================================================================
    // Pulser
    // =========================================================================

    /// Fill subsequent buffers with the steady port state only.
    ///
    /// Overwritten by [`init`](Self::init) when called before it.
    pub fn set_passthrough(&self) {
        self.pulser.with(|p| p.set_mode(PulserMode::Passthrough));
    }

    /// Interleave pulse-phase callbacks into subsequent buffers.
    ///
    /// Overwritten by [`init`](Self::init) when called before it.
    pub fn set_stepping(&self) {
        self.pulser.with(|p| p.set_mode(PulserMode::Stepping));
    }

    /// Current pulser mode.
    pub fn mode(&self) -> PulserMode {
        self.pulser.with_ref(PulserState::mode)
    }

    /// Set the pulse-phase period in microseconds.
    ///
    /// Overwritten by [`init`](Self::init) when called before it.
    pub fn set_pulse_period(&self, period_us: u32) {
        self.pulser.with(|p| p.set_period_us(period_us));
    }

    /// Pulse-phase period in microseconds.
    pub fn pulse_period(&self) -> u32 {
        self.pulser.with_ref(PulserState::period_us)
    }

    /// Register the pulse-phase callback, replacing any previous one.
    ///
    /// Overwritten by [`init`](Self::init) when called before it.
    pub fn set_pulse_callback(&self, callback: PulseCallback) {
        self.pulser.with(|p| p.set_callback(Some(callback)));
    }

    /// Deregister the pulse-phase callback.
    ///
    /// Overwritten by [`init`](Self::init) when called before it.
    pub fn clear_pulse_callback(&self) {
        self.pulser.with(|p| p.set_callback(None));
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Completions that found every buffer still waiting to be refilled.
    pub fn underflow_count(&self) -> u32 {
        self.ring.underflow_count()
    }

    /// Completions naming a descriptor outside the ring.
    pub fn spurious_count(&self) -> u32 {
        self.spurious.load(Ordering::Relaxed)
    }

    /// Samples reserved at the end of every stepping buffer (0 before init).
    pub fn safety_margin(&self) -> usize {
        self.pulser.with_ref(PulserState::margin)
    }

    /// Worst-case delay from a port write to the wire, in microseconds.
    pub fn output_latency_us(&self) -> u32 {
        let period = self.pulser.with_ref(PulserState::sample_period_us);
        (SAMPLES * (BUFS + 1)) as u32 * period
    }

    #[cfg(test)]
    pub(crate) fn ring(&self) -> &DmaRing<BUFS, SAMPLES> {
        &self.ring
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl<E, R, const BUFS: usize, const SAMPLES: usize> Default for I2sExpander<E, R, BUFS, SAMPLES>
where
    E: SerialDmaEngine,
    R: PinRouter,
{
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
