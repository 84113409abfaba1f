//! Pulser: the buffer-filling algorithm and its pulse-phase callback.
//!
//! In [`PulserMode::Passthrough`] a refilled buffer is one flat run of the
//! port state. In [`PulserMode::Stepping`] a countdown runs one sample period
//! per steady sample; when it expires the registered [`PulsePhase`] callback
//! writes the pulse edges itself through a [`PulseWriter`].
//!
//! A stepping fill stops `safety_margin` samples short of the buffer end and
//! the descriptor length is shortened to match, so a pulse that starts in a
//! buffer always ends in it.

use crate::driver::config::PulserMode;
use crate::driver::port::PortState;
use crate::internal::constants::DEFAULT_SAMPLE_PERIOD_US;
use crate::sync::CriticalSectionCell;

/// Pulse-phase callback.
///
/// Invoked from the fill task at most once per countdown expiry, with no
/// expander lock held. May push up to `safety_margin` samples and may change
/// the mode or the pulse period.
pub trait PulsePhase {
    /// Emit the samples of one pulse.
    fn on_pulse(&mut self, writer: &mut PulseWriter<'_>);
}

impl<F> PulsePhase for F
where
    F: FnMut(&mut PulseWriter<'_>),
{
    fn on_pulse(&mut self, writer: &mut PulseWriter<'_>) {
        self(writer);
    }
}

/// A registered pulse-phase callback.
pub type PulseCallback = &'static mut (dyn PulsePhase + Send);

/// Outcome of one buffer fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FillResult {
    /// Mode the buffer was filled in
    pub mode: PulserMode,
    /// Samples written (the descriptor length)
    pub samples: usize,
    /// Pulse-phase invocations
    pub pulses: u32,
}

/// State guarded by the pulser lock.
pub(crate) struct PulserState {
    mode: PulserMode,
    period_us: u32,
    remaining_us: u32,
    sample_period_us: u32,
    margin: usize,
    callback: Option<PulseCallback>,
    /// Bumped whenever the callback slot is replaced or cleared
    epoch: u32,
}

impl PulserState {
    pub(crate) const fn new() -> Self {
        Self {
            mode: PulserMode::Passthrough,
            period_us: 0,
            remaining_us: 0,
            sample_period_us: DEFAULT_SAMPLE_PERIOD_US,
            margin: 0,
            callback: None,
            epoch: 0,
        }
    }

    /// Reset for a fresh init.
    pub(crate) fn configure(
        &mut self,
        period_us: u32,
        sample_period_us: u32,
        margin: usize,
        callback: Option<PulseCallback>,
    ) {
        self.mode = PulserMode::Passthrough;
        self.period_us = period_us;
        self.remaining_us = 0;
        self.sample_period_us = sample_period_us;
        self.margin = margin;
        self.set_callback(callback);
    }

    pub(crate) fn mode(&self) -> PulserMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: PulserMode) {
        self.mode = mode;
    }

    pub(crate) fn period_us(&self) -> u32 {
        self.period_us
    }

    pub(crate) fn set_period_us(&mut self, period_us: u32) {
        self.period_us = period_us;
    }

    pub(crate) fn sample_period_us(&self) -> u32 {
        self.sample_period_us
    }

    pub(crate) fn margin(&self) -> usize {
        self.margin
    }

    pub(crate) fn set_callback(&mut self, callback: Option<PulseCallback>) {
        self.callback = callback;
        self.epoch = self.epoch.wrapping_add(1);
    }

    #[cfg(test)]
    pub(crate) fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    fn tick(&mut self) {
        self.remaining_us = self.remaining_us.saturating_sub(self.sample_period_us);
    }

    fn pulse_due(&self) -> bool {
        self.mode == PulserMode::Stepping && self.remaining_us < self.sample_period_us
    }
}

/// Write access to the buffer being filled, handed to a [`PulsePhase`].
///
/// Pushes are limited to the safety margin per invocation.
pub struct PulseWriter<'a> {
    samples: &'a mut [u32],
    start: usize,
    cursor: usize,
    budget: usize,
    port: &'a PortState,
    pulser: &'a CriticalSectionCell<PulserState>,
}

impl<'a> PulseWriter<'a> {
    pub(crate) fn new(
        samples: &'a mut [u32],
        cursor: usize,
        budget: usize,
        port: &'a PortState,
        pulser: &'a CriticalSectionCell<PulserState>,
    ) -> Self {
        Self {
            samples,
            start: cursor,
            cursor,
            budget,
            port,
            pulser,
        }
    }

    /// Push `n` copies of the current port state.
    ///
    /// `n == 0` still pushes one sample. Returns the number pushed, or 0
    /// without writing when the request does not fit in the remaining margin.
    pub fn push_samples(&mut self, n: usize) -> usize {
        let value = self.port.load();
        self.push_value(value, n)
    }

    /// Push `n` copies of a literal frame, with the same rules as
    /// [`push_samples`](Self::push_samples).
    pub fn push_value(&mut self, value: u32, n: usize) -> usize {
        let count = n.max(1);
        if count > self.remaining() {
            return 0;
        }
        self.samples[self.cursor..self.cursor + count].fill(value);
        self.cursor += count;
        count
    }

    /// Samples pushed so far in this invocation.
    pub fn pushed(&self) -> usize {
        self.cursor - self.start
    }

    /// Samples that may still be pushed in this invocation.
    pub fn remaining(&self) -> usize {
        let budget = self.budget.saturating_sub(self.pushed());
        budget.min(self.samples.len() - self.cursor)
    }

    /// Current port word.
    pub fn port(&self) -> u32 {
        self.port.load()
    }

    /// Set or clear one expanded pin.
    pub fn write(&self, pin: u8, value: bool) {
        self.port.write(pin, value);
    }

    /// Level of one expanded pin.
    pub fn read(&self, pin: u8) -> bool {
        self.port.read(pin)
    }

    /// Switch to passthrough; the rest of this buffer is steady samples.
    pub fn set_passthrough(&self) {
        self.pulser.with(|p| p.set_mode(PulserMode::Passthrough));
    }

    /// Switch to stepping.
    pub fn set_stepping(&self) {
        self.pulser.with(|p| p.set_mode(PulserMode::Stepping));
    }

    /// Change the pulse period, effective from the end of this invocation.
    pub fn set_pulse_period(&self, period_us: u32) {
        self.pulser.with(|p| p.set_period_us(period_us));
    }

    /// Deregister the running callback once it returns.
    pub fn clear_pulse_callback(&self) {
        self.pulser.with(|p| p.set_callback(None));
    }
}

/// Fill `samples` according to the pulser mode.
///
/// The pulser lock is held while steady samples are written and released
/// around every callback invocation.
pub(crate) fn fill_buffer(
    samples: &mut [u32],
    port: &PortState,
    pulser: &CriticalSectionCell<PulserState>,
) -> FillResult {
    let capacity = samples.len();
    let (mode, margin) = pulser.with_ref(|p| (p.mode, p.margin));

    if mode == PulserMode::Passthrough {
        samples.fill(port.load());
        return FillResult {
            mode,
            samples: capacity,
            pulses: 0,
        };
    }

    let limit = capacity.saturating_sub(margin);
    let mut cursor = 0;
    let mut pulses = 0;
    let mut force_steady = false;

    loop {
        let due = pulser.with(|p| {
            while cursor < limit {
                if !force_steady && p.pulse_due() {
                    if let Some(callback) = p.callback.take() {
                        return Some((callback, p.epoch));
                    }
                }
                force_steady = false;
                samples[cursor] = port.load();
                cursor += 1;
                p.tick();
            }
            None
        });

        let Some((callback, epoch)) = due else {
            break;
        };

        let mut writer = PulseWriter::new(samples, cursor, margin, port, pulser);
        callback.on_pulse(&mut writer);
        let pushed = writer.pushed();
        cursor += pushed;
        pulses += 1;

        pulser.with(|p| {
            if p.epoch == epoch && p.callback.is_none() {
                p.callback = Some(callback);
            }
            // Samples pushed by the callback count toward the period.
            let spent = (pushed as u32).saturating_mul(p.sample_period_us);
            p.remaining_us = p.period_us.saturating_sub(spent);
        });

        // An empty pulse still has to advance the fill.
        force_steady = pushed == 0;
    }

    FillResult {
        mode,
        samples: cursor,
        pulses,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
