//! Device operation traits.
//!
//! [`CDevOps`] is what a concrete driver implements: the lifecycle hooks and
//! data-path operations of its device, with defaults for everything it does
//! not care about. [`FileOperations`] is the object-safe operation table the
//! OS layer dispatches client calls through; [`CDev`](crate::CDev) implements
//! it on top of a `CDevOps`.

use alloc::sync::Arc;

use crate::error::{CDevError, CDevResult};
use crate::file::{File, SeekFrom};
use crate::notify::{PollEvents, PollWaiter};

/// Hooks and data-path operations of a concrete character device.
///
/// Lifecycle hooks are called with the device lock held.
pub trait CDevOps: Send + Sync {
    /// Called when the device goes from no open sessions to one.
    ///
    /// Returning an error fails the `open` and leaves the device closed.
    fn open_first(&self, _file: &File) -> CDevResult {
        Ok(())
    }

    /// Called when the last open session is closed.
    ///
    /// An error is reported to the caller of `close`, but the session is
    /// closed regardless.
    fn close_last(&self, _file: &File) -> CDevResult {
        Ok(())
    }

    /// Events currently ready on the device for `file`.
    fn poll_state(&self, _file: &File) -> PollEvents {
        PollEvents::empty()
    }

    fn read(&self, _file: &File, _buf: &mut [u8]) -> CDevResult<usize> {
        Err(CDevError::NotSupported)
    }

    fn write(&self, _file: &File, _buf: &[u8]) -> CDevResult<usize> {
        Err(CDevError::NotSupported)
    }

    fn seek(&self, _file: &File, _pos: SeekFrom) -> CDevResult<u64> {
        Err(CDevError::NotSupported)
    }

    fn ioctl(&self, _file: &File, _cmd: u32, _arg: usize) -> CDevResult<usize> {
        Err(CDevError::NotSupported)
    }
}

/// A device with no behavior beyond the defaults of [`CDevOps`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseOps;

impl CDevOps for BaseOps {}

/// Operation table registered with the driver table.
pub trait FileOperations: Send + Sync {
    fn open(&self, file: &File) -> CDevResult;

    fn close(&self, file: &File) -> CDevResult;

    fn read(&self, file: &File, buf: &mut [u8]) -> CDevResult<usize>;

    fn write(&self, file: &File, buf: &[u8]) -> CDevResult<usize>;

    fn seek(&self, file: &File, pos: SeekFrom) -> CDevResult<u64>;

    fn ioctl(&self, file: &File, cmd: u32, arg: usize) -> CDevResult<usize>;

    /// Registers (`setup == true`) or removes a poll waiter.
    fn poll(&self, file: &File, waiter: &Arc<PollWaiter>, setup: bool) -> CDevResult;
}
