//! Growable slot table of registered poll waiters.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::error::{CDevError, CDevResult};

use super::{PollEvents, PollWaiter};

/// Slot table holding the poll waiters of one device.
///
/// Capacity doubles on demand, starting at one slot, up to a ceiling; it never
/// shrinks. Removal clears a slot in place, so slot indices are only stable
/// while an entry stays registered.
pub struct PollSet {
    slots: Vec<Option<Arc<PollWaiter>>>,
    ceiling: usize,
}

impl PollSet {
    /// Creates an empty table that grows up to `ceiling` slots.
    pub const fn new(ceiling: usize) -> Self {
        Self {
            slots: Vec::new(),
            ceiling,
        }
    }

    /// Number of slots currently allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Number of registered waiters.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Iterates over the registered waiters.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PollWaiter>> {
        self.slots.iter().flatten()
    }

    /// Stores `waiter` in the first free slot, growing the table once if none
    /// is free.
    ///
    /// Returns the slot index.
    ///
    /// # Errors
    ///
    /// [`CDevError::Resource`] if the table is at its ceiling or the larger
    /// table cannot be allocated.
    pub fn store(&mut self, waiter: Arc<PollWaiter>) -> CDevResult<usize> {
        if let Some(index) = self.slots.iter().position(Option::is_none) {
            self.slots[index] = Some(waiter);
            return Ok(index);
        }

        let index = self.grow()?;
        self.slots[index] = Some(waiter);
        Ok(index)
    }

    /// Doubles the table and returns the first new slot.
    fn grow(&mut self) -> CDevResult<usize> {
        let old = self.slots.len();
        if old >= self.ceiling {
            return Err(CDevError::Resource);
        }

        let new = old.saturating_mul(2).max(1).min(self.ceiling);
        self.slots
            .try_reserve_exact(new - old)
            .map_err(|_| CDevError::Resource)?;
        self.slots.resize(new, None);

        debug!("poll set grown from {} to {} slots", old, new);
        Ok(old)
    }

    /// Clears the slot holding `waiter`.
    ///
    /// # Errors
    ///
    /// [`CDevError::InvalidState`] if `waiter` is not registered.
    pub fn remove(&mut self, waiter: &Arc<PollWaiter>) -> CDevResult {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|w| Arc::ptr_eq(w, waiter)))
            .ok_or(CDevError::InvalidState)?;
        *slot = None;
        Ok(())
    }

    /// Delivers `events` to every registered waiter.
    ///
    /// Returns the number of waiters whose semaphore was posted.
    pub fn notify(&self, events: PollEvents) -> usize {
        self.iter().filter(|waiter| waiter.notify(events)).count()
    }

    /// Drops every entry and releases the slot storage.
    pub fn clear(&mut self) {
        self.slots = Vec::new();
    }
}

impl core::fmt::Debug for PollSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PollSet")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("ceiling", &self.ceiling)
            .finish()
    }
}
