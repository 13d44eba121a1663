//! Per-device operation counters.

use core::sync::atomic::{AtomicU64, Ordering};

/// Statistics for device operations.
#[derive(Debug, Default)]
pub struct CDevStats {
    /// Successful opens.
    pub open_count: AtomicU64,
    /// Closes that dropped a session.
    pub close_count: AtomicU64,
    /// Calls to `poll_notify`.
    pub notify_count: AtomicU64,
    /// Semaphore posts issued to poll waiters.
    pub wakeup_count: AtomicU64,
    /// Failed operations.
    pub error_count: AtomicU64,
}

impl CDevStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_open(&self) {
        self.open_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_close(&self) {
        self.close_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one `poll_notify` that posted `wakeups` waiters.
    #[inline]
    pub fn record_notify(&self, wakeups: usize) {
        self.notify_count.fetch_add(1, Ordering::Relaxed);
        self.record_wakeups(wakeups);
    }

    #[inline]
    pub fn record_wakeups(&self, wakeups: usize) {
        self.wakeup_count.fetch_add(wakeups as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn opens(&self) -> u64 {
        self.open_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn closes(&self) -> u64 {
        self.close_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn notifications(&self) -> u64 {
        self.notify_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn wakeups(&self) -> u64 {
        self.wakeup_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }
}
