#![no_std]

//! # Character Device Nodes
//!
//! This crate provides the base machinery every character device driver in an
//! ArceOS-style kernel builds on. It is designed for `no_std` environments and
//! uses the `alloc` crate for dynamic memory allocation.
//!
//! ## Architecture
//!
//! ### Device Core
//! - [`CDev`]: A named device node wrapping a driver's [`CDevOps`]
//! - [`Session`]: Open-session counter with first-open / last-close hooks
//! - [`CDevConfig`]: Registration mode, class-instance count, poll ceiling
//! - [`CDevStats`]: Per-device operation counters
//!
//! ### Registration
//! - [`DriverTable`]: The registration boundary of the OS driver table
//! - [`DriverRegistry`]: In-memory driver table with lookup and open
//! - [`FileOperations`]: The operation table dispatched for client calls
//!
//! ### Poll Notification
//! - [`PollWaiter`]: A client's registration for device events
//! - [`PollSemaphore`]: The counting semaphore a client blocks on
//! - [`PollEvents`]: Poll event bit set
//!
//! ## Examples
//!
//! ### A Pollable Driver
//!
//! ```rust,ignore
//! use axcdev::{CDev, CDevOps, CDevResult, DriverRegistry, File, PollEvents};
//!
//! struct Baro {
//!     samples: spin::Mutex<VecDeque<u32>>,
//! }
//!
//! impl CDevOps for Baro {
//!     fn open_first(&self, _file: &File) -> CDevResult {
//!         // power up the sensor
//!         Ok(())
//!     }
//!
//!     fn poll_state(&self, _file: &File) -> PollEvents {
//!         if self.samples.lock().is_empty() {
//!             PollEvents::empty()
//!         } else {
//!             PollEvents::POLLIN
//!         }
//!     }
//!
//!     fn read(&self, _file: &File, buf: &mut [u8]) -> CDevResult<usize> {
//!         // copy out one sample ...
//!     }
//! }
//!
//! let registry = Arc::new(DriverRegistry::new());
//! let baro = Arc::new(CDev::new("/dev/baro0", Baro::new(), registry.clone()));
//! baro.init()?;
//!
//! // from the sampling interrupt
//! baro.ops().samples.lock().push_back(sample);
//! baro.poll_notify(PollEvents::POLLIN);
//! ```
//!
//! ### Waiting for Events
//!
//! ```rust,ignore
//! let (node, file) = registry.open("/dev/baro0", OpenFlags::RDONLY)?;
//! let sem = Arc::new(PollSemaphore::new(0));
//! let waiter = Arc::new(PollWaiter::new(PollEvents::POLLIN, sem.clone()));
//!
//! node.poll(&file, &waiter, true)?;
//! sem.wait();
//! node.poll(&file, &waiter, false)?;
//!
//! if waiter.take_revents().contains(PollEvents::POLLIN) {
//!     node.read(&file, &mut buf)?;
//! }
//! node.close(&file)?;
//! ```

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;
#[macro_use]
extern crate log;

mod config;
mod device;
mod error;
mod file;
mod lifecycle;
mod notify;
mod ops;
mod registry;
mod stats;

pub use config::{CDevConfig, CLASS_INSTANCES, DEFAULT_MODE, MAX_POLL_WAITERS};
pub use device::{CDev, CLASS_DEVNAME_MAX};
pub use error::{CDevError, CDevResult};
pub use file::{File, FileId, OpenFlags, SeekFrom};
pub use lifecycle::{Session, SessionGuard, SessionState};
pub use notify::{PollEvents, PollSemaphore, PollSet, PollWaiter};
pub use ops::{BaseOps, CDevOps, FileOperations};
pub use registry::{DriverRegistry, DriverTable};
pub use stats::CDevStats;
