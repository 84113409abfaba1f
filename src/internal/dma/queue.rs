//! Queue of completed buffers waiting to be refilled.
//!
//! The completion interrupt pushes, the fill task pops. When the fill task
//! falls behind the queue drops its oldest entry so the most recently
//! completed buffers stay queued.

use heapless::Deque;

use crate::sync::CriticalSectionCell;

/// Bounded FIFO of buffer indices, protected by its own critical section cell.
pub struct CompletionQueue<const N: usize> {
    inner: CriticalSectionCell<Deque<usize, N>>,
}

impl<const N: usize> CompletionQueue<N> {
    /// Create an empty queue. Const-compatible.
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(Deque::new()),
        }
    }

    /// Append `index`, evicting and returning the oldest entry when full.
    pub fn push_overwriting(&self, index: usize) -> Option<usize> {
        self.inner.with(|queue| {
            let evicted = if queue.is_full() { queue.pop_front() } else { None };
            // Cannot fail: a slot was freed above if the queue was full.
            let _ = queue.push_back(index);
            evicted
        })
    }

    /// Pop the oldest entry and run `claim` on it before the lock is released.
    pub fn pop_claim<F>(&self, claim: F) -> Option<usize>
    where
        F: FnOnce(usize),
    {
        self.inner.with(|queue| {
            let index = queue.pop_front()?;
            claim(index);
            Some(index)
        })
    }

    /// Discard every queued entry.
    pub fn clear(&self) {
        self.inner.with(Deque::clear);
    }

    /// Number of queued entries.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.with_ref(Deque::len)
    }

    /// Whether nothing is queued.
    #[cfg(any(test, feature = "async"))]
    pub fn is_empty(&self) -> bool {
        self.inner.with_ref(Deque::is_empty)
    }

    /// Whether another push would evict.
    #[cfg(test)]
    pub fn is_full(&self) -> bool {
        self.inner.with_ref(Deque::is_full)
    }
}

impl<const N: usize> Default for CompletionQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
