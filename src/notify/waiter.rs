//! Poll waiter entries.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

use spin::Mutex;

use crate::file::FileId;

use super::{PollEvents, PollSemaphore};

/// A client's standing request to be woken when events occur on a device.
///
/// The waiter is owned by the client. A device only keeps a reference while
/// the waiter is registered, and identifies it by pointer.
pub struct PollWaiter {
    /// Interest mask.
    events: PollEvents,
    /// Events that occurred since the client last took them.
    revents: AtomicU32,
    /// Wake primitive, possibly shared with other waiters of the same client.
    sem: Arc<PollSemaphore>,
    /// File session that registered this waiter, set by the device on setup.
    file: Mutex<Option<FileId>>,
}

impl PollWaiter {
    /// Creates a waiter interested in `events`, woken through `sem`.
    pub fn new(events: PollEvents, sem: Arc<PollSemaphore>) -> Self {
        Self {
            events,
            revents: AtomicU32::new(0),
            sem,
            file: Mutex::new(None),
        }
    }

    /// The interest mask.
    #[inline]
    pub fn events(&self) -> PollEvents {
        self.events
    }

    /// Events reported so far.
    #[inline]
    pub fn revents(&self) -> PollEvents {
        PollEvents::from_bits_truncate(self.revents.load(Ordering::Acquire))
    }

    /// Returns the reported events and clears them.
    pub fn take_revents(&self) -> PollEvents {
        PollEvents::from_bits_truncate(self.revents.swap(0, Ordering::AcqRel))
    }

    #[inline]
    pub fn semaphore(&self) -> &Arc<PollSemaphore> {
        &self.sem
    }

    /// The file session recorded on the last setup, if any.
    pub fn file(&self) -> Option<FileId> {
        *self.file.lock()
    }

    pub(crate) fn set_file(&self, file: FileId) {
        *self.file.lock() = Some(file);
    }

    /// ORs the interesting part of `events` into the reported set.
    ///
    /// Returns the reported set after the update.
    fn report(&self, events: PollEvents) -> PollEvents {
        let ready = events & self.events;
        let prev = self.revents.fetch_or(ready.bits(), Ordering::AcqRel);
        PollEvents::from_bits_truncate(prev) | ready
    }

    /// Records the device state sampled at setup time and posts the
    /// semaphore if anything of interest is already pending.
    pub(crate) fn report_initial(&self, state: PollEvents) -> bool {
        if self.report(state).is_empty() {
            return false;
        }
        self.sem.post();
        true
    }

    /// Delivers a device notification.
    ///
    /// Returns `true` if the semaphore was posted. A waiter whose previous
    /// wake-up is still unconsumed is not posted again.
    pub(crate) fn notify(&self, events: PollEvents) -> bool {
        if (events & self.events).is_empty() {
            return false;
        }
        let revents = self.report(events);
        trace!(
            "poll waiter {:p}: events={:?} interest={:?} revents={:?}",
            self, events, self.events, revents
        );
        !revents.is_empty() && self.sem.wake()
    }
}

impl core::fmt::Debug for PollWaiter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PollWaiter")
            .field("events", &self.events)
            .field("revents", &self.revents())
            .field("file", &self.file())
            .finish()
    }
}
