//! Driver table: the name → device binding of the OS layer.
//!
//! This module provides:
//! - [`DriverTable`]: the registration boundary a device talks to
//! - [`DriverRegistry`]: an in-memory driver table with name lookup and open
//!
//! Entries hold a weak handle to the device, so registering a device never
//! keeps it alive; dropping the device unregisters it.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use spin::RwLock;

use crate::error::{CDevError, CDevResult};
use crate::file::{File, FileId, OpenFlags};
use crate::ops::FileOperations;

/// Registration boundary between a device and the OS driver table.
pub trait DriverTable: Send + Sync {
    /// Binds `name` to `node` with the given permission bits.
    ///
    /// # Errors
    ///
    /// [`CDevError::Registration`] if the name is taken or refused.
    fn register_driver(
        &self,
        name: &str,
        node: Weak<dyn FileOperations>,
        mode: u32,
    ) -> CDevResult;

    /// Removes the binding of `name`.
    ///
    /// # Errors
    ///
    /// [`CDevError::NotRegistered`] if `name` is not bound.
    fn unregister_driver(&self, name: &str) -> CDevResult;
}

struct DriverEntry {
    node: Weak<dyn FileOperations>,
    mode: u32,
}

/// In-memory driver table.
///
/// # Concurrency
///
/// Lookups take a read lock; registration and removal take the write lock.
/// Device operations are dispatched after the lock is released.
pub struct DriverRegistry {
    /// Maps device paths to their registrations.
    drivers: RwLock<BTreeMap<String, DriverEntry>>,

    /// Counter for generating unique file session IDs.
    next_file: AtomicU64,
}

impl DriverRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            drivers: RwLock::new(BTreeMap::new()),
            next_file: AtomicU64::new(1),
        }
    }

    fn next_file_id(&self) -> FileId {
        FileId(self.next_file.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the live device registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn FileOperations>> {
        self.drivers.read().get(name)?.node.upgrade()
    }

    /// Permission bits `name` was registered with.
    pub fn mode(&self, name: &str) -> Option<u32> {
        self.drivers.read().get(name).map(|entry| entry.mode)
    }

    /// Opens a new session on the device registered under `name`.
    ///
    /// # Errors
    ///
    /// [`CDevError::NotRegistered`] if no live device has that name, or
    /// whatever the device's `open` returns.
    pub fn open(&self, name: &str, flags: OpenFlags) -> CDevResult<(Arc<dyn FileOperations>, File)> {
        let node = self.lookup(name).ok_or(CDevError::NotRegistered)?;
        let file = File::new(self.next_file_id(), flags);
        node.open(&file)?;
        Ok((node, file))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.read().contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.drivers.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.drivers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.read().is_empty()
    }
}

impl DriverTable for DriverRegistry {
    fn register_driver(
        &self,
        name: &str,
        node: Weak<dyn FileOperations>,
        mode: u32,
    ) -> CDevResult {
        if name.is_empty() {
            return Err(CDevError::Registration);
        }

        let mut drivers = self.drivers.write();
        if drivers.contains_key(name) {
            return Err(CDevError::Registration);
        }
        drivers.insert(name.to_string(), DriverEntry { node, mode });
        Ok(())
    }

    fn unregister_driver(&self, name: &str) -> CDevResult {
        self.drivers
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or(CDevError::NotRegistered)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}
