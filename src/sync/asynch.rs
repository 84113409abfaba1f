//! Async support for the fill task.
//!
//! Provides the future the fill task awaits between completions.

use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use super::primitives::AtomicWaker;
use crate::internal::dma::CompletionQueue;

/// Resolves once the completion queue holds at least one buffer.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct CompletionFuture<'a, const N: usize> {
    queue: &'a CompletionQueue<N>,
    waker: &'a AtomicWaker,
}

impl<'a, const N: usize> CompletionFuture<'a, N> {
    /// Create a new completion future.
    pub fn new(queue: &'a CompletionQueue<N>, waker: &'a AtomicWaker) -> Self {
        Self { queue, waker }
    }
}

impl<const N: usize> Future for CompletionFuture<'_, N> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.queue.is_empty() {
            return Poll::Ready(());
        }
        self.waker.register(cx.waker());
        // A completion may have landed between the check and the register.
        if self.queue.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;

    use super::*;
    use core::task::Waker;
    use std::boxed::Box;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    struct WakeCounter {
        count: AtomicUsize,
    }

    impl Wake for WakeCounter {
        fn wake(self: Arc<Self>) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn pending_until_completion_then_woken() {
        let queue: CompletionQueue<4> = CompletionQueue::new();
        let atomic_waker = AtomicWaker::new();
        let counter = Arc::new(WakeCounter {
            count: AtomicUsize::new(0),
        });
        let waker = Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let mut fut = Box::pin(CompletionFuture::new(&queue, &atomic_waker));
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Pending);
        assert!(atomic_waker.is_registered());

        queue.push_overwriting(1);
        atomic_waker.wake();
        assert_eq!(counter.count.load(Ordering::SeqCst), 1);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn ready_immediately_when_queued() {
        let queue: CompletionQueue<4> = CompletionQueue::new();
        queue.push_overwriting(0);
        let atomic_waker = AtomicWaker::new();
        let counter = Arc::new(WakeCounter {
            count: AtomicUsize::new(0),
        });
        let waker = Waker::from(counter);
        let mut cx = Context::from_waker(&waker);

        let mut fut = Box::pin(CompletionFuture::new(&queue, &atomic_waker));
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(()));
        assert!(!atomic_waker.is_registered());
    }
}
