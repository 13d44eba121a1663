//! The character device base: registration, open/close tracking and poll
//! notification shared by every concrete driver.

use alloc::string::{String, ToString};
use alloc::sync::{Arc, Weak};
use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};

use arrayvec::ArrayString;
use spin::mutex::SpinMutex;
use spin::Mutex;

use crate::config::CDevConfig;
use crate::error::{CDevError, CDevResult};
use crate::file::{File, SeekFrom};
use crate::lifecycle::{Session, SessionGuard, SessionState};
use crate::notify::{PollEvents, PollSet, PollWaiter};
use crate::ops::{CDevOps, FileOperations};
use crate::registry::DriverTable;
use crate::stats::CDevStats;

/// Longest device name `register_class_devname` can synthesize.
pub const CLASS_DEVNAME_MAX: usize = 32;

/// A pollable, reference-counted character device node.
///
/// `CDev` wraps a driver's [`CDevOps`] with:
/// - **Registration**: binds the device name in a [`DriverTable`]
/// - **Session tracking**: open count with first-open / last-close hooks
/// - **Poll notification**: a table of client [`PollWaiter`]s woken by
///   [`poll_notify`](Self::poll_notify)
///
/// # Concurrency
///
/// Two locks with distinct scope:
///
/// 1. The **structural lock** (`spin::Mutex<Session>`) serializes `open`,
///    `close` and poll setup/teardown. It holds the open count; drivers may
///    take it through [`lock`](Self::lock) to guard their own state.
/// 2. The **notification lock** (`SpinMutex<PollSet>`) guards the waiter table
///    itself. `poll_notify` takes only this lock, so it can run from interrupt
///    or callback context while a client sits in `open`. Slot insertion,
///    growth and removal also happen under it, so a notification never sees a
///    half-updated table.
///
/// The notification lock spins but does not mask interrupts. If
/// `poll_notify` is called from an interrupt handler, every other holder of
/// the lock on that core must run with that interrupt disabled (e.g. under an
/// IRQ-saving guard), or the handler spins forever on a uniprocessor.
///
/// The structural lock is always taken first.
///
/// # Lifecycle
///
/// ```rust,ignore
/// let dev = Arc::new(CDev::new("/dev/sensor0", MySensor::new(), registry.clone()));
/// dev.init()?;
///
/// // driver thread, on new data
/// dev.poll_notify(PollEvents::POLLIN);
///
/// // dropping the last reference unregisters the node
/// drop(dev);
/// ```
pub struct CDev<D: CDevOps> {
    name: String,
    registered: AtomicBool,
    lock: Mutex<Session>,
    pollset: SpinMutex<PollSet>,
    ops: D,
    table: Arc<dyn DriverTable>,
    config: CDevConfig,
    stats: CDevStats,
}

impl<D: CDevOps> CDev<D> {
    /// Creates an unregistered device with the default configuration.
    pub fn new(name: &str, ops: D, table: Arc<dyn DriverTable>) -> Self {
        Self::with_config(name, ops, table, CDevConfig::default())
    }

    /// Creates an unregistered device.
    pub fn with_config(name: &str, ops: D, table: Arc<dyn DriverTable>, config: CDevConfig) -> Self {
        debug!("CDev::new {}", name);
        Self {
            name: name.to_string(),
            registered: AtomicBool::new(false),
            lock: Mutex::new(Session::new()),
            pollset: SpinMutex::new(PollSet::new(config.max_poll_waiters)),
            ops,
            table,
            config,
            stats: CDevStats::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the primary name is currently registered.
    #[inline]
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// The driver's operations.
    #[inline]
    pub fn ops(&self) -> &D {
        &self.ops
    }

    #[inline]
    pub fn config(&self) -> &CDevConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &CDevStats {
        &self.stats
    }

    /// Takes the structural lock.
    ///
    /// The guard reads the session but cannot change it; opens and closes
    /// wait until it is dropped. Must not be held across calls into this
    /// device's own operations.
    ///
    /// ```rust,compile_fail
    /// use std::sync::Arc;
    /// use axcdev::{BaseOps, CDev, DriverRegistry};
    ///
    /// let dev = CDev::new("/dev/null0", BaseOps, Arc::new(DriverRegistry::new()));
    /// let mut guard = dev.lock();
    /// let _ = guard.close(|| Ok(()));
    /// ```
    pub fn lock(&self) -> SessionGuard<'_> {
        SessionGuard::new(self.lock.lock())
    }

    pub fn open_count(&self) -> usize {
        self.lock.lock().open_count()
    }

    pub fn session_state(&self) -> SessionState {
        self.lock.lock().state()
    }

    /// Number of registered poll waiters.
    pub fn poll_waiters(&self) -> usize {
        self.pollset.lock().len()
    }

    /// Number of allocated poll waiter slots.
    pub fn poll_capacity(&self) -> usize {
        self.pollset.lock().capacity()
    }

    /// Removes the primary name from the driver table.
    ///
    /// Succeeds without doing anything if the device is not registered.
    pub fn unregister(&self) -> CDevResult {
        if !self.registered.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        info!("{}: unregistering", self.name);
        self.table.unregister_driver(&self.name)
    }

    /// Removes the registration made by [`register_class_devname`](Self::register_class_devname).
    pub fn unregister_class_devname(&self, class_devname: &str, instance: u32) -> CDevResult {
        debug!("CDev::unregister_class_devname {}{}", class_devname, instance);
        let name = class_devname_for(class_devname, instance)?;
        self.table.unregister_driver(&name)
    }

    /// Signals a change of device state to the registered poll waiters.
    ///
    /// Every waiter interested in any of `events` has them added to its
    /// reported set and is woken, unless an earlier wake-up has not been
    /// consumed yet. Safe to call from any context that may spin; see the
    /// interrupt caveat on [`CDev`].
    pub fn poll_notify(&self, events: PollEvents) {
        trace!("{}: poll_notify {:?}", self.name, events);
        let woken = self.pollset.lock().notify(events);
        self.stats.record_notify(woken);
    }

    fn track<T>(&self, result: CDevResult<T>) -> CDevResult<T> {
        if result.is_err() {
            self.stats.record_error();
        }
        result
    }
}

impl<D: CDevOps + 'static> CDev<D> {
    fn node(self: &Arc<Self>) -> Weak<dyn FileOperations> {
        let node: Weak<Self> = Arc::downgrade(self);
        node
    }

    /// Registers the device under its name.
    ///
    /// # Errors
    ///
    /// [`CDevError::Registration`] if the name is empty, taken, or refused by
    /// the driver table.
    pub fn init(self: &Arc<Self>) -> CDevResult {
        debug!("CDev::init {}", self.name);
        if self.name.is_empty() {
            return Err(CDevError::Registration);
        }

        self.table
            .register_driver(&self.name, self.node(), self.config.mode)
            .map_err(|_| CDevError::Registration)?;
        self.registered.store(true, Ordering::Release);
        info!("{}: registered", self.name);
        Ok(())
    }

    /// Registers the device as the first free instance `{class_devname}{N}`
    /// of a device class, trying `N` in `0..class_instances`.
    ///
    /// Returns the instance number. The registration is not removed on drop;
    /// pair it with [`unregister_class_devname`](Self::unregister_class_devname).
    ///
    /// # Errors
    ///
    /// - [`CDevError::NoSpace`] if every instance name is taken.
    /// - [`CDevError::InvalidArgument`] if `class_devname` is empty or too long.
    pub fn register_class_devname(self: &Arc<Self>, class_devname: &str) -> CDevResult<u32> {
        debug!("CDev::register_class_devname {}", class_devname);
        if class_devname.is_empty() {
            return Err(CDevError::InvalidArgument);
        }

        for instance in 0..self.config.class_instances {
            let name = class_devname_for(class_devname, instance)?;
            if self
                .table
                .register_driver(&name, self.node(), self.config.mode)
                .is_ok()
            {
                info!("{}: registered as {}", self.name, name);
                return Ok(instance);
            }
        }
        Err(CDevError::NoSpace)
    }
}

fn class_devname_for(class_devname: &str, instance: u32) -> CDevResult<ArrayString<CLASS_DEVNAME_MAX>> {
    let mut name = ArrayString::new();
    write!(name, "{}{}", class_devname, instance).map_err(|_| CDevError::InvalidArgument)?;
    Ok(name)
}

impl<D: CDevOps> FileOperations for CDev<D> {
    fn open(&self, file: &File) -> CDevResult {
        debug!("{}: open {:?}", self.name, file.id());
        let result = self.lock.lock().open(|| self.ops.open_first(file));
        if result.is_ok() {
            self.stats.record_open();
        }
        self.track(result)
    }

    fn close(&self, file: &File) -> CDevResult {
        debug!("{}: close {:?}", self.name, file.id());
        let mut session = self.lock.lock();
        let was_open = session.state() == SessionState::Open;
        let result = session.close(|| self.ops.close_last(file));
        drop(session);

        if was_open {
            self.stats.record_close();
        }
        self.track(result)
    }

    fn read(&self, file: &File, buf: &mut [u8]) -> CDevResult<usize> {
        debug!("{}: read {} bytes", self.name, buf.len());
        self.track(self.ops.read(file, buf))
    }

    fn write(&self, file: &File, buf: &[u8]) -> CDevResult<usize> {
        debug!("{}: write {} bytes", self.name, buf.len());
        self.track(self.ops.write(file, buf))
    }

    fn seek(&self, file: &File, pos: SeekFrom) -> CDevResult<u64> {
        debug!("{}: seek {:?}", self.name, pos);
        self.track(self.ops.seek(file, pos))
    }

    fn ioctl(&self, file: &File, cmd: u32, arg: usize) -> CDevResult<usize> {
        debug!("{}: ioctl {:#x}", self.name, cmd);
        self.track(self.ops.ioctl(file, cmd, arg))
    }

    fn poll(&self, file: &File, waiter: &Arc<PollWaiter>, setup: bool) -> CDevResult {
        debug!("{}: poll {}", self.name, if setup { "setup" } else { "teardown" });
        let _session = self.lock.lock();

        if !setup {
            return self.pollset.lock().remove(waiter).inspect_err(|err| {
                error!("{}: poll teardown: {}", self.name, err);
                self.stats.record_error();
            });
        }

        waiter.set_file(file.id());
        if let Err(err) = self.pollset.lock().store(Arc::clone(waiter)) {
            error!("{}: poll setup: {}", self.name, err);
            self.stats.record_error();
            return Err(err);
        }

        // Stored first: anything raised from here on reaches the waiter
        // through poll_notify.
        if waiter.report_initial(self.ops.poll_state(file)) {
            self.stats.record_wakeups(1);
        }
        Ok(())
    }
}

impl<D: CDevOps> Drop for CDev<D> {
    fn drop(&mut self) {
        debug!("CDev::drop {}", self.name);
        if self.registered.swap(false, Ordering::AcqRel) {
            if let Err(err) = self.table.unregister_driver(&self.name) {
                warn!("{}: unregister on drop failed: {}", self.name, err);
            }
        }
        self.pollset.get_mut().clear();
    }
}

impl<D: CDevOps> core::fmt::Debug for CDev<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CDev")
            .field("name", &self.name)
            .field("registered", &self.is_registered())
            .field("open_count", &self.open_count())
            .field("pollset", &*self.pollset.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{FileId, OpenFlags};
    use crate::notify::PollSemaphore;
    use crate::ops::BaseOps;
    use crate::registry::DriverRegistry;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicU32, AtomicUsize};

    #[derive(Default)]
    struct Hooks {
        opened: AtomicUsize,
        closed: AtomicUsize,
        refuse_open: AtomicBool,
        ready: AtomicU32,
    }

    impl CDevOps for Hooks {
        fn open_first(&self, _file: &File) -> CDevResult {
            if self.refuse_open.load(Ordering::Relaxed) {
                return Err(CDevError::Resource);
            }
            self.opened.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn close_last(&self, _file: &File) -> CDevResult {
            self.closed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn poll_state(&self, _file: &File) -> PollEvents {
            PollEvents::from_bits_truncate(self.ready.load(Ordering::Relaxed))
        }
    }

    fn setup() -> (Arc<DriverRegistry>, Arc<CDev<Hooks>>) {
        let registry = Arc::new(DriverRegistry::new());
        let dev = Arc::new(CDev::new("/dev/test0", Hooks::default(), registry.clone()));
        (registry, dev)
    }

    fn file(id: u64) -> File {
        File::new(FileId(id), OpenFlags::RDWR)
    }

    fn waiter(events: PollEvents) -> Arc<PollWaiter> {
        Arc::new(PollWaiter::new(events, Arc::new(PollSemaphore::new(0))))
    }

    #[test]
    fn test_init_registers_name() {
        let (registry, dev) = setup();
        assert!(!dev.is_registered());

        dev.init().unwrap();
        assert!(dev.is_registered());
        assert!(registry.lookup("/dev/test0").is_some());
        assert_eq!(registry.mode("/dev/test0"), Some(0o666));
    }

    #[test]
    fn test_init_rejects_taken_name() {
        let (registry, dev) = setup();
        dev.init().unwrap();

        let other = Arc::new(CDev::new("/dev/test0", BaseOps, registry.clone()));
        assert_eq!(other.init(), Err(CDevError::Registration));
        assert!(!other.is_registered());
    }

    #[test]
    fn test_init_rejects_empty_name() {
        let registry = Arc::new(DriverRegistry::new());
        let dev = Arc::new(CDev::new("", BaseOps, registry));
        assert_eq!(dev.init(), Err(CDevError::Registration));
    }

    #[test]
    fn test_drop_unregisters() {
        let (registry, dev) = setup();
        dev.init().unwrap();
        drop(dev);
        assert!(!registry.contains("/dev/test0"));
    }

    #[test]
    fn test_explicit_unregister() {
        let (registry, dev) = setup();
        dev.init().unwrap();

        dev.unregister().unwrap();
        assert!(!dev.is_registered());
        assert!(!registry.contains("/dev/test0"));
        // Second call is a no-op
        assert!(dev.unregister().is_ok());
    }

    #[test]
    fn test_class_devname_instances() {
        let registry = Arc::new(DriverRegistry::new());
        let devs: Vec<_> = (0..5)
            .map(|_| Arc::new(CDev::new("/dev/accel", BaseOps, registry.clone())))
            .collect();

        for (i, dev) in devs.iter().take(4).enumerate() {
            assert_eq!(dev.register_class_devname("/dev/accel").unwrap(), i as u32);
        }
        assert_eq!(devs[4].register_class_devname("/dev/accel"), Err(CDevError::NoSpace));
        assert_eq!(
            registry.names(),
            ["/dev/accel0", "/dev/accel1", "/dev/accel2", "/dev/accel3"]
        );

        devs[1].unregister_class_devname("/dev/accel", 1).unwrap();
        assert_eq!(devs[4].register_class_devname("/dev/accel").unwrap(), 1);
        assert_eq!(
            devs[0].unregister_class_devname("/dev/accel", 9),
            Err(CDevError::NotRegistered)
        );
    }

    #[test]
    fn test_class_devname_invalid() {
        let (_, dev) = setup();
        assert_eq!(dev.register_class_devname(""), Err(CDevError::InvalidArgument));

        let long = "/dev/a_class_name_that_is_too_long";
        assert_eq!(dev.register_class_devname(long), Err(CDevError::InvalidArgument));
    }

    #[test]
    fn test_open_close_hooks() {
        let (_, dev) = setup();
        let f = file(1);

        dev.open(&f).unwrap();
        dev.open(&f).unwrap();
        assert_eq!(dev.open_count(), 2);
        assert_eq!(dev.ops().opened.load(Ordering::Relaxed), 1);

        dev.close(&f).unwrap();
        assert_eq!(dev.ops().closed.load(Ordering::Relaxed), 0);
        dev.close(&f).unwrap();
        assert_eq!(dev.ops().closed.load(Ordering::Relaxed), 1);
        assert_eq!(dev.open_count(), 0);

        assert_eq!(dev.close(&f), Err(CDevError::NotOpen));
        assert_eq!(dev.stats().opens(), 2);
        assert_eq!(dev.stats().closes(), 2);
        assert_eq!(dev.stats().errors(), 1);
    }

    #[test]
    fn test_lock_guard_leaves_session_to_close() {
        let (_, dev) = setup();
        let f = file(1);
        dev.open(&f).unwrap();

        {
            let session = dev.lock();
            assert_eq!(session.open_count(), 1);
            assert_eq!(session.state(), SessionState::Open);
        }

        assert!(dev.close(&f).is_ok());
        assert_eq!(dev.ops().closed.load(Ordering::Relaxed), 1);
        assert_eq!(dev.open_count(), 0);
    }

    #[test]
    fn test_open_first_refusal_rolls_back() {
        let (_, dev) = setup();
        dev.ops().refuse_open.store(true, Ordering::Relaxed);

        assert_eq!(dev.open(&file(1)), Err(CDevError::Resource));
        assert_eq!(dev.open_count(), 0);
        assert_eq!(dev.session_state(), SessionState::Closed);
    }

    #[test]
    fn test_data_path_defaults() {
        let registry = Arc::new(DriverRegistry::new());
        let dev = CDev::new("/dev/null0", BaseOps, registry);
        let f = file(1);
        let mut buf = [0u8; 8];

        assert_eq!(dev.read(&f, &mut buf), Err(CDevError::NotSupported));
        assert_eq!(dev.write(&f, &buf), Err(CDevError::NotSupported));
        assert_eq!(dev.seek(&f, SeekFrom::Current(4)), Err(CDevError::NotSupported));
        assert_eq!(dev.ioctl(&f, 0x10, 0), Err(CDevError::NotSupported));
    }

    #[test]
    fn test_poll_setup_records_file() {
        let (_, dev) = setup();
        let w = waiter(PollEvents::POLLIN);

        dev.poll(&file(42), &w, true).unwrap();
        assert_eq!(w.file(), Some(FileId(42)));
        assert_eq!(dev.poll_waiters(), 1);
        assert_eq!(dev.poll_capacity(), 1);
    }

    #[test]
    fn test_poll_setup_signals_ready_device() {
        let (_, dev) = setup();
        dev.ops().ready.store(PollEvents::POLLIN.bits(), Ordering::Relaxed);

        let w = waiter(PollEvents::POLLIN | PollEvents::POLLOUT);
        dev.poll(&file(1), &w, true).unwrap();
        assert_eq!(w.revents(), PollEvents::POLLIN);
        assert_eq!(w.semaphore().value(), 1);

        // Not ready for what this one wants
        let idle = waiter(PollEvents::POLLOUT);
        dev.poll(&file(1), &idle, true).unwrap();
        assert!(idle.revents().is_empty());
        assert_eq!(idle.semaphore().value(), 0);
    }

    #[test]
    fn test_poll_teardown_errors() {
        let (_, dev) = setup();
        let w = waiter(PollEvents::POLLIN);

        assert_eq!(dev.poll(&file(1), &w, false), Err(CDevError::InvalidState));

        dev.poll(&file(1), &w, true).unwrap();
        dev.poll(&file(1), &w, false).unwrap();
        assert_eq!(dev.poll(&file(1), &w, false), Err(CDevError::InvalidState));
        assert_eq!(dev.poll_waiters(), 0);
    }

    #[test]
    fn test_poll_notify_wakes_matching_waiters() {
        let (_, dev) = setup();
        let reader = waiter(PollEvents::POLLIN);
        let writer = waiter(PollEvents::POLLOUT);
        dev.poll(&file(1), &reader, true).unwrap();
        dev.poll(&file(2), &writer, true).unwrap();

        dev.poll_notify(PollEvents::POLLIN);
        assert_eq!(reader.revents(), PollEvents::POLLIN);
        assert_eq!(reader.semaphore().value(), 1);
        assert!(writer.revents().is_empty());
        assert_eq!(writer.semaphore().value(), 0);

        assert_eq!(dev.stats().notifications(), 1);
        assert_eq!(dev.stats().wakeups(), 1);
    }

    #[test]
    fn test_poll_notify_after_teardown_is_silent() {
        let (_, dev) = setup();
        let w = waiter(PollEvents::POLLIN);
        dev.poll(&file(1), &w, true).unwrap();
        dev.poll(&file(1), &w, false).unwrap();

        dev.poll_notify(PollEvents::POLLIN);
        assert!(w.revents().is_empty());
        assert_eq!(w.semaphore().value(), 0);
    }

    #[test]
    fn test_poll_ceiling_from_config() {
        let registry = Arc::new(DriverRegistry::new());
        let config = CDevConfig::new().with_max_poll_waiters(2);
        let dev = CDev::with_config("/dev/small", BaseOps, registry, config);
        let f = file(1);

        let a = waiter(PollEvents::POLLIN);
        let b = waiter(PollEvents::POLLIN);
        dev.poll(&f, &a, true).unwrap();
        dev.poll(&f, &b, true).unwrap();
        assert_eq!(dev.poll(&f, &waiter(PollEvents::POLLIN), true), Err(CDevError::Resource));
        assert_eq!(dev.poll_waiters(), 2);
    }
}
