//! Open/close session tracking.
//!
//! A device is either closed (no open sessions) or open. The first-open hook
//! runs on the closed → open transition and may veto it; the last-close hook
//! runs on the open → closed transition and cannot.
//!
//! ```text
//! ┌────────┐  open(), open_first() == Ok  ┌──────┐
//! │ Closed │ ───────────────────────────> │ Open │ ── open()/close() while count > 1
//! └────────┘ <─────────────────────────── └──────┘
//!              close(), then close_last()
//! ```
//!
//! [`Session`] lives inside the device's structural lock, so every transition
//! and hook call happens with that lock held. Outside the crate the counter is
//! only reachable through a [`SessionGuard`], which cannot change it.

use core::ops::Deref;

use spin::MutexGuard;

use crate::error::{CDevError, CDevResult};

/// Session states of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No open sessions.
    Closed,
    /// At least one open session.
    Open,
}

/// Open-session counter guarded by the device lock.
#[derive(Debug, Default)]
pub struct Session {
    open_count: usize,
}

impl Session {
    pub(crate) const fn new() -> Self {
        Self { open_count: 0 }
    }

    /// Number of open sessions.
    #[inline]
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        if self.open_count == 0 {
            SessionState::Closed
        } else {
            SessionState::Open
        }
    }

    /// Adds a session, calling `open_first` on the first one.
    ///
    /// If `open_first` fails the count is restored and its error returned.
    pub(crate) fn open<F>(&mut self, open_first: F) -> CDevResult
    where
        F: FnOnce() -> CDevResult,
    {
        self.open_count = self
            .open_count
            .checked_add(1)
            .ok_or(CDevError::Resource)?;

        if self.open_count == 1 {
            if let Err(err) = open_first() {
                self.open_count -= 1;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Drops a session, calling `close_last` when the count reaches zero.
    ///
    /// The count is decremented even if `close_last` fails; its result is
    /// returned as is.
    ///
    /// # Errors
    ///
    /// [`CDevError::NotOpen`] if there is no open session.
    pub(crate) fn close<F>(&mut self, close_last: F) -> CDevResult
    where
        F: FnOnce() -> CDevResult,
    {
        if self.open_count == 0 {
            return Err(CDevError::NotOpen);
        }

        self.open_count -= 1;
        if self.open_count == 0 {
            close_last()
        } else {
            Ok(())
        }
    }
}

/// Holds a device's structural lock with read-only access to its [`Session`].
///
/// Returned by [`CDev::lock`](crate::CDev::lock). Open and close transitions
/// are blocked while the guard is alive.
pub struct SessionGuard<'a>(MutexGuard<'a, Session>);

impl<'a> SessionGuard<'a> {
    pub(crate) fn new(guard: MutexGuard<'a, Session>) -> Self {
        Self(guard)
    }
}

impl Deref for SessionGuard<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}
