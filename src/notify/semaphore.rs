//! Counting semaphore used as the wake primitive of poll waiters.
//!
//! One semaphore is usually shared by every waiter a client registers during a
//! single `poll()` call. Devices post it from any context; the client blocks on
//! it outside the device.

use core::sync::atomic::{AtomicIsize, Ordering};

/// Counting semaphore with a non-blocking post path.
#[derive(Debug, Default)]
pub struct PollSemaphore {
    count: AtomicIsize,
}

impl PollSemaphore {
    /// Creates a semaphore holding `initial` posts.
    pub const fn new(initial: isize) -> Self {
        Self {
            count: AtomicIsize::new(initial),
        }
    }

    /// Current count. Positive values are unconsumed posts.
    #[inline]
    pub fn value(&self) -> isize {
        self.count.load(Ordering::Acquire)
    }

    /// Adds one post unconditionally.
    #[inline]
    pub fn post(&self) {
        self.count.fetch_add(1, Ordering::Release);
    }

    /// Adds one post unless a previous post is still unconsumed.
    ///
    /// Returns `true` if a post was added. Once the pending post is consumed by
    /// [`try_wait`](Self::try_wait) or [`wait`](Self::wait) the semaphore is
    /// armed again.
    pub fn wake(&self) -> bool {
        let mut current = self.count.load(Ordering::Acquire);
        loop {
            if current > 0 {
                return false;
            }
            match self.count.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Consumes one post if available.
    pub fn try_wait(&self) -> bool {
        let mut current = self.count.load(Ordering::Acquire);
        loop {
            if current <= 0 {
                return false;
            }
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Blocks until a post is available and consumes it.
    pub fn wait(&self) {
        while !self.try_wait() {
            backoff();
        }
    }

    /// Like [`wait`](Self::wait), giving up after roughly `max_spins` spin
    /// iterations.
    ///
    /// Returns `true` if a post was consumed.
    pub fn wait_timeout(&self, max_spins: usize) -> bool {
        let mut spins = 0;
        loop {
            if self.try_wait() {
                return true;
            }
            if spins >= max_spins {
                return false;
            }
            backoff();
            spins += 100;
        }
    }
}

#[inline]
fn backoff() {
    cfg_if::cfg_if! {
        if #[cfg(feature = "std")] {
            std::thread::yield_now();
        } else {
            for _ in 0..100 {
                core::hint::spin_loop();
            }
        }
    }
}
