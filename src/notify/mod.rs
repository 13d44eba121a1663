//! Poll/select notification machinery.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ setup/teardown ┌───────────────────────────┐
//! │ client poll  │ ─────────────> │ CDev::poll                │
//! │ (PollWaiter) │                │  structural lock          │
//! └──────┬───────┘                │   └─ PollSet (SpinMutex)  │
//!        │ wait()                 └─────────────┬─────────────┘
//!        ▼                                      │
//! ┌──────────────┐        post / wake           │ poll_notify(events)
//! │PollSemaphore │ <────────────────────────────┘ (any context)
//! └──────────────┘
//! ```
//!
//! - [`PollEvents`]: event bit set used as interest mask and reported events
//! - [`PollSemaphore`]: counting semaphore the client blocks on
//! - [`PollWaiter`]: a client registration, owned by the client
//! - [`PollSet`]: the device's slot table of registered waiters
//!
//! A waiter is stored before the device samples its current state, so any
//! event is either seen at setup or delivered by a later notification.

mod poll;
mod pollset;
mod semaphore;
mod waiter;

pub use poll::PollEvents;
pub use pollset::PollSet;
pub use semaphore::PollSemaphore;
pub use waiter::PollWaiter;
